//! Single-shot connection parameter timer.
//!
//! Restarting replaces a pending expiry; stopping cancels it.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use ledbutton::Event;

use crate::ble::push_event;

#[derive(Clone, Copy, defmt::Format)]
pub enum TimerCommand {
    Start(u32),
    Stop,
}

pub static CONN_PARAMS_TIMER: Signal<CriticalSectionRawMutex, TimerCommand> = Signal::new();

pub async fn conn_params_timer_task() -> ! {
    let mut cmd = CONN_PARAMS_TIMER.wait().await;
    loop {
        cmd = match cmd {
            TimerCommand::Stop => CONN_PARAMS_TIMER.wait().await,
            TimerCommand::Start(ms) => {
                let expiry = Timer::after(Duration::from_millis(u64::from(ms)));
                match select(expiry, CONN_PARAMS_TIMER.wait()).await {
                    Either::First(()) => {
                        push_event(Event::ConnParamsTimer);
                        CONN_PARAMS_TIMER.wait().await
                    }
                    Either::Second(next) => next,
                }
            }
        };
    }
}
