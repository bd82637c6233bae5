//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place. The
//! [`Config`] bundle carries the values the core actually consumes,
//! so tests can override a single field without touching the rest.

use crate::event::ConnParams;
use crate::security::{IoCapabilities, SecurityParams};

// GAP

/// Device name included in the advertising data.
pub const DEVICE_NAME: &str = "LedButtonDemo";

/// Public device address (LSB first, as the SoftDevice expects it).
pub const DEVICE_ADDRESS: [u8; 6] = [0xE7, 0xAA, 0xAA, 0xAA, 0xAA, 0xAB];

/// GAP appearance advertised with the name. 0 = unknown.
pub const APPEARANCE: u16 = 0x0000;

/// Advertising interval (in 0.625 ms units). 64 = 40 ms.
pub const ADV_INTERVAL: u16 = 64;

/// Advertising timeout (seconds). After this the device powers off.
pub const ADV_TIMEOUT_SECS: u16 = 180;

// Preferred connection parameters

/// Connection interval range (in 1.25 ms units).
/// 6 = 7.5 ms, 800 = 1 s.
pub const MIN_CONN_INTERVAL: u16 = 6;
pub const MAX_CONN_INTERVAL: u16 = 800;

/// Slave latency (number of connection events the peripheral can skip).
pub const SLAVE_LATENCY: u16 = 3;

/// Supervision timeout (in 10 ms units). 400 = 4 s.
pub const CONN_SUP_TIMEOUT: u16 = 400;

/// Delay from connect to the first connection parameter update request (ms).
pub const FIRST_CONN_PARAMS_UPDATE_DELAY_MS: u32 = 20_000;

/// Delay between subsequent update requests (ms).
pub const NEXT_CONN_PARAMS_UPDATE_DELAY_MS: u32 = 5_000;

/// Number of rejected attempts before giving up and disconnecting.
pub const MAX_CONN_PARAMS_UPDATE_COUNT: u8 = 3;

// Security

/// Timeout for a Pairing Request or Security Request (seconds).
pub const SEC_PARAM_TIMEOUT_SECS: u16 = 30;
pub const SEC_PARAM_BOND: bool = true;
pub const SEC_PARAM_MITM: bool = false;
pub const SEC_PARAM_IO_CAPABILITIES: IoCapabilities = IoCapabilities::None;
pub const SEC_PARAM_OOB: bool = false;
pub const SEC_PARAM_MIN_KEY_SIZE: u8 = 7;
pub const SEC_PARAM_MAX_KEY_SIZE: u8 = 16;

// Scheduler

/// Maximum number of events in the deferred event queue.
pub const SCHED_QUEUE_SIZE: usize = 10;

/// Largest characteristic write payload carried by an event (default ATT MTU - 3).
pub const MAX_WRITE_LEN: usize = 20;

// GPIO pin assignments (nRF52840-DK P0 numbering)
//
// These are logical numbers; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   LED-button button -> P0.11 (Button 1)
//   Wake-up button    -> P0.12 (Button 2)
//   Advertising LED   -> P0.13 (LED 1)
//   Connected LED     -> P0.14 (LED 2)
//   LED-button LED    -> P0.15 (LED 3)
//   Diagnostic UART   -> P0.06 (TXD, routed to the J-Link VCOM)

pub const LEDBUTTON_BUTTON_PIN: u8 = 11;
pub const WAKEUP_BUTTON_PIN: u8 = 12;
pub const ADVERTISING_LED_PIN: u8 = 13;
pub const CONNECTED_LED_PIN: u8 = 14;
pub const LEDBUTTON_LED_PIN: u8 = 15;
pub const UART_TX_PIN: u8 = 6;

/// The DK LEDs are wired to VDD, so a low pin lights them.
pub const LEDS_ACTIVE_LOW: bool = true;

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_MS: u64 = 50;

/// Advertising parameters handed to the radio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvParams {
    /// Interval in 0.625 ms units.
    pub interval: u16,
    /// Timeout in seconds, 0 = never.
    pub timeout_secs: u16,
}

/// Timing and budget of the connection parameter negotiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnParamsConfig {
    pub preferred: ConnParams,
    pub first_update_delay_ms: u32,
    pub next_update_delay_ms: u32,
    pub max_attempts: u8,
}

/// Everything the peripheral needs at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub device_name: &'static str,
    pub device_address: [u8; 6],
    pub advertising: AdvParams,
    pub conn_params: ConnParamsConfig,
    pub security: SecurityParams,
    pub button_pin: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_name: DEVICE_NAME,
            device_address: DEVICE_ADDRESS,
            advertising: AdvParams {
                interval: ADV_INTERVAL,
                timeout_secs: ADV_TIMEOUT_SECS,
            },
            conn_params: ConnParamsConfig {
                preferred: ConnParams {
                    min_interval: MIN_CONN_INTERVAL,
                    max_interval: MAX_CONN_INTERVAL,
                    slave_latency: SLAVE_LATENCY,
                    sup_timeout: CONN_SUP_TIMEOUT,
                },
                first_update_delay_ms: FIRST_CONN_PARAMS_UPDATE_DELAY_MS,
                next_update_delay_ms: NEXT_CONN_PARAMS_UPDATE_DELAY_MS,
                max_attempts: MAX_CONN_PARAMS_UPDATE_COUNT,
            },
            security: SecurityParams {
                timeout_secs: SEC_PARAM_TIMEOUT_SECS,
                bond: SEC_PARAM_BOND,
                mitm: SEC_PARAM_MITM,
                io_caps: SEC_PARAM_IO_CAPABILITIES,
                oob: SEC_PARAM_OOB,
                min_key_size: SEC_PARAM_MIN_KEY_SIZE,
                max_key_size: SEC_PARAM_MAX_KEY_SIZE,
            },
            button_pin: LEDBUTTON_BUTTON_PIN,
        }
    }
}
