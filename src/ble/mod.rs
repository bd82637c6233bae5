//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **GATT server** - the LED Button Service, registered through the
//!    `nrf_softdevice` macros.
//! 2. **Radio** - [`radio::SoftdeviceRadio`], the `hal::Radio` implementation
//!    the core calls into.
//! 3. **Link task** - advertises, runs the GATT server for the live
//!    connection and turns everything the stack reports into queued events.
//! 4. **Bonder** - answers pairing and re-encryption requests inline.
//!
//! Every producer feeds the single [`EVENTS`] channel; the main task
//! drains it.

pub mod bonder;
pub mod link;
pub mod radio;

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use ledbutton::config::SCHED_QUEUE_SIZE;
use ledbutton::event::ConnParams;
use ledbutton::Event;
use nrf_softdevice::raw;

/// LED Button Service (base UUID 00001523-1212-EFDE-1523-785FEABCD123).
#[nrf_softdevice::gatt_service(uuid = "00001523-1212-efde-1523-785feabcd123")]
pub struct LbsService {
    #[characteristic(uuid = "00001524-1212-efde-1523-785feabcd123", read, notify)]
    button: u8,
    #[characteristic(uuid = "00001525-1212-efde-1523-785feabcd123", read, write)]
    led: u8,
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub lbs: LbsService,
}

/// Deferred event queue shared by all producers.
pub static EVENTS: Channel<CriticalSectionRawMutex, Event, SCHED_QUEUE_SIZE> = Channel::new();

static OVERFLOW: AtomicBool = AtomicBool::new(false);

/// Queue an event for the main loop.
///
/// Producers never wait: a full queue means the main loop fell behind.
/// The event is lost and the main loop treats it as a fault.
pub fn push_event(event: impl Into<Event>) {
    if EVENTS.try_send(event.into()).is_err() {
        defmt::error!("event queue full ({=usize} entries)", SCHED_QUEUE_SIZE);
        OVERFLOW.store(true, Ordering::Relaxed);
    }
}

/// Whether a producer has dropped an event since the last call.
pub fn take_overflow() -> bool {
    OVERFLOW.swap(false, Ordering::Relaxed)
}

pub(crate) fn conn_params_from_raw(raw: &raw::ble_gap_conn_params_t) -> ConnParams {
    ConnParams {
        min_interval: raw.min_conn_interval,
        max_interval: raw.max_conn_interval,
        slave_latency: raw.slave_latency,
        sup_timeout: raw.conn_sup_timeout,
    }
}

pub(crate) fn conn_params_to_raw(params: &ConnParams) -> raw::ble_gap_conn_params_t {
    raw::ble_gap_conn_params_t {
        min_conn_interval: params.min_interval,
        max_conn_interval: params.max_interval,
        slave_latency: params.slave_latency,
        conn_sup_timeout: params.sup_timeout,
    }
}
