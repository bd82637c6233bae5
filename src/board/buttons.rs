//! GPIO button input with async debouncing.
//!
//! The LED-button button is active-low with an internal pull-up. Each
//! debounced press is queued as an [`Event::ButtonPressed`], but only
//! while a central is connected (see [`BUTTON_ENABLED`]).

use core::sync::atomic::Ordering;

use defmt::{debug, info};
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_time::{Duration, Timer};
use ledbutton::config::BUTTON_DEBOUNCE_MS;
use ledbutton::Event;

use super::BUTTON_ENABLED;
use crate::ble::push_event;

/// Run a single button polling loop.
///
/// Waits for the pin to go low (pressed), debounces, queues the event,
/// then waits for release before repeating.
pub async fn button_task(pin: AnyPin, pin_no: u8) -> ! {
    let mut btn = Input::new(pin, Pull::Up);

    loop {
        // Wait for falling edge (button press, active-low).
        btn.wait_for_falling_edge().await;

        // Debounce: wait and re-check.
        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        if btn.is_low() {
            if BUTTON_ENABLED.load(Ordering::Acquire) {
                info!("Button: P0.{=u8}", pin_no);
                push_event(Event::ButtonPressed { pin: pin_no });
            } else {
                debug!("Button: P0.{=u8} ignored, not connected", pin_no);
            }

            // Wait for release to avoid repeat triggers.
            btn.wait_for_rising_edge().await;
            Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;
        }
    }
}
