//! nRF52840-DK board support: LEDs, button gating, wake pin, serial
//! diagnostics and the connection parameter timer.

pub mod buttons;
pub mod timer;

use core::fmt::Write;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_nrf::gpio::Output;
use embassy_nrf::pac;
use embassy_nrf::peripherals::UARTE0;
use embassy_nrf::uarte::UarteTx;
use heapless::String;
use ledbutton::config::{LEDS_ACTIVE_LOW, WAKEUP_BUTTON_PIN};
use ledbutton::error::Status;
use ledbutton::hal::{Board, Led};

use self::timer::{TimerCommand, CONN_PARAMS_TIMER};

/// Button presses are forwarded only while this is set.
pub static BUTTON_ENABLED: AtomicBool = AtomicBool::new(false);

pub struct NrfBoard {
    advertising: Output<'static>,
    connected: Output<'static>,
    ledbutton: Output<'static>,
    uart: UarteTx<'static, UARTE0>,
}

impl NrfBoard {
    pub fn new(
        advertising: Output<'static>,
        connected: Output<'static>,
        ledbutton: Output<'static>,
        uart: UarteTx<'static, UARTE0>,
    ) -> Self {
        Self {
            advertising,
            connected,
            ledbutton,
            uart,
        }
    }

    fn pin(&mut self, led: Led) -> &mut Output<'static> {
        match led {
            Led::Advertising => &mut self.advertising,
            Led::Connected => &mut self.connected,
            Led::LedButton => &mut self.ledbutton,
        }
    }
}

impl Board for NrfBoard {
    fn init_leds(&mut self) {
        for led in Led::ALL {
            self.clear_led(led);
        }
    }

    fn set_led(&mut self, led: Led) {
        let pin = self.pin(led);
        if LEDS_ACTIVE_LOW {
            pin.set_low();
        } else {
            pin.set_high();
        }
    }

    fn clear_led(&mut self, led: Led) {
        let pin = self.pin(led);
        if LEDS_ACTIVE_LOW {
            pin.set_high();
        } else {
            pin.set_low();
        }
    }

    fn toggle_led(&mut self, led: Led) {
        self.pin(led).toggle();
    }

    fn enable_button(&mut self) -> Status {
        BUTTON_ENABLED.store(true, Ordering::Release);
        Ok(())
    }

    fn disable_button(&mut self) -> Status {
        BUTTON_ENABLED.store(false, Ordering::Release);
        Ok(())
    }

    fn arm_wakeup(&mut self) {
        // Pull-up input that raises DETECT on a low level, which wakes
        // the chip from system-off.
        pac::P0.pin_cnf(WAKEUP_BUTTON_PIN as usize).write(|w| {
            w.set_dir(pac::gpio::vals::Dir::INPUT);
            w.set_input(pac::gpio::vals::Input::CONNECT);
            w.set_pull(pac::gpio::vals::Pull::PULLUP);
            w.set_drive(pac::gpio::vals::Drive::S0S1);
            w.set_sense(pac::gpio::vals::Sense::LOW);
        });
    }

    fn start_conn_params_timer(&mut self, delay_ms: u32) -> Status {
        CONN_PARAMS_TIMER.signal(TimerCommand::Start(delay_ms));
        Ok(())
    }

    fn stop_conn_params_timer(&mut self) -> Status {
        CONN_PARAMS_TIMER.signal(TimerCommand::Stop);
        Ok(())
    }

    fn diag(&mut self, label: &str, code: u32) {
        let mut line: String<64> = String::new();
        if write!(line, "{} {}\r\n", label, code).is_err() {
            // Label too long for the buffer; send what fits.
            line.clear();
            for c in label.chars().take(line.capacity() - 2) {
                let _ = line.push(c);
            }
            let _ = line.push_str("\r\n");
        }
        let _ = self.uart.blocking_write(line.as_bytes());
    }
}
