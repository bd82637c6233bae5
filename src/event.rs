//! Event descriptors carried through the deferred event queue.
//!
//! Producers (radio stack, app timer, debounced button) copy a small
//! fixed-size value into the queue; the main loop pops it and hands it
//! to the dispatch router. The set of events is closed.

use heapless::Vec;

use crate::config::MAX_WRITE_LEN;
use crate::security::{AuthStatus, Diversifier};

/// Connection handle as assigned by the radio stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnHandle(pub u16);

impl ConnHandle {
    /// Sentinel passed to the stack when there is no live connection.
    pub const INVALID: ConnHandle = ConnHandle(0xFFFF);
}

/// Attribute handle inside the local GATT table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AttrHandle(pub u16);

/// Link-layer connection parameters (matches `ble_gap_conn_params_t`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnParams {
    /// Minimum connection interval (1.25 ms units).
    pub min_interval: u16,
    /// Maximum connection interval (1.25 ms units).
    pub max_interval: u16,
    pub slave_latency: u16,
    /// Supervision timeout (10 ms units).
    pub sup_timeout: u16,
}

/// HCI reason codes used when terminating a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum HciReason {
    RemoteUserTerminated = 0x13,
    ConnIntervalUnacceptable = 0x3B,
}

/// What a GAP timeout event refers to. Only advertising timeouts reach
/// the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeoutSource {
    Advertising,
}

/// Characteristic write payload.
pub type WriteData = Vec<u8, MAX_WRITE_LEN>;

/// Events raised by the radio stack.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleEvent {
    Connected {
        handle: ConnHandle,
        params: ConnParams,
    },
    Disconnected {
        handle: ConnHandle,
        reason: u8,
    },
    Timeout {
        source: TimeoutSource,
    },
    /// Central asked for our pairing parameters.
    SecParamsRequest {
        handle: ConnHandle,
    },
    /// Central wants to re-encrypt with previously distributed keys.
    SecInfoRequest {
        handle: ConnHandle,
        div: Diversifier,
    },
    /// Pairing procedure finished (successfully or not).
    AuthStatus {
        handle: ConnHandle,
        status: AuthStatus,
    },
    /// A CCCD was accessed before system attributes were set.
    SysAttrMissing {
        handle: ConnHandle,
    },
    /// The link now runs with `params`.
    ConnParamUpdate {
        handle: ConnHandle,
        params: ConnParams,
    },
    Write {
        handle: ConnHandle,
        attr: AttrHandle,
        data: WriteData,
    },
}

/// Everything that can be queued for the main loop.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Ble(BleEvent),
    /// The connection parameter update timer expired.
    ConnParamsTimer,
    /// Debounced press on the given button pin.
    ButtonPressed { pin: u8 },
}

impl From<BleEvent> for Event {
    fn from(evt: BleEvent) -> Self {
        Event::Ble(evt)
    }
}
