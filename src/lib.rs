//! Host-testable core of the LED Button peripheral.
//!
//! Everything that decides *what* the device does lives here: the GAP
//! state machine, connection parameter and security negotiators, the
//! LED Button Service bridge, the dispatch router and the deferred event
//! queue. Hardware is reached only through the [`hal::Radio`] and
//! [`hal::Board`] traits, so `cargo test` runs it all on the host against
//! recording mocks.
//!
//! Note: The embedded binary (main.rs, `--features embedded`) supplies
//! SoftDevice and GPIO implementations of those traits.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Foundations
// ═══════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod error;
pub mod event;
pub mod hal;

// ═══════════════════════════════════════════════════════════════════════════
// Protocol handlers
// ═══════════════════════════════════════════════════════════════════════════

pub mod conn_params;
pub mod gap;
pub mod lbs;
pub mod security;

// ═══════════════════════════════════════════════════════════════════════════
// Routing and main loop
// ═══════════════════════════════════════════════════════════════════════════

pub mod peripheral;
pub mod scheduler;

pub use config::Config;
pub use error::{Error, Fault, NrfError, Status};
pub use event::{BleEvent, ConnHandle, Event};
pub use gap::GapState;
pub use peripheral::Peripheral;
pub use scheduler::{EventQueue, Exit, Flow, Wake};
