//! Unified error types for the LED Button peripheral.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

use core::panic::Location;

// SoftDevice status codes (nrf_error.h / ble_err.h).
const NRF_SUCCESS: u32 = 0;
const NRF_ERROR_NO_MEM: u32 = 4;
const NRF_ERROR_NOT_FOUND: u32 = 5;
const NRF_ERROR_INVALID_PARAM: u32 = 7;
const NRF_ERROR_INVALID_STATE: u32 = 8;
const NRF_ERROR_TIMEOUT: u32 = 13;
const NRF_ERROR_BUSY: u32 = 17;
const BLE_ERROR_INVALID_CONN_HANDLE: u32 = 0x3002;

/// Non-success status returned by a radio stack or board call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NrfError {
    /// The operation is not allowed in the current stack state.
    InvalidState,
    /// The connection handle does not refer to a live link.
    InvalidConnHandle,
    /// The stack is busy with a previous request.
    Busy,
    /// A parameter was out of range.
    InvalidParam,
    /// Out of buffers.
    NoMem,
    NotFound,
    Timeout,
    /// Any other raw status code.
    Raw(u32),
}

impl NrfError {
    /// Convert a raw status code; `0` is success.
    pub fn check(code: u32) -> Status {
        match code {
            NRF_SUCCESS => Ok(()),
            NRF_ERROR_NO_MEM => Err(Self::NoMem),
            NRF_ERROR_NOT_FOUND => Err(Self::NotFound),
            NRF_ERROR_INVALID_PARAM => Err(Self::InvalidParam),
            NRF_ERROR_INVALID_STATE => Err(Self::InvalidState),
            NRF_ERROR_TIMEOUT => Err(Self::Timeout),
            NRF_ERROR_BUSY => Err(Self::Busy),
            BLE_ERROR_INVALID_CONN_HANDLE => Err(Self::InvalidConnHandle),
            other => Err(Self::Raw(other)),
        }
    }

    /// Raw status code for the serial diagnostic line.
    pub fn code(self) -> u32 {
        match self {
            Self::NoMem => NRF_ERROR_NO_MEM,
            Self::NotFound => NRF_ERROR_NOT_FOUND,
            Self::InvalidParam => NRF_ERROR_INVALID_PARAM,
            Self::InvalidState => NRF_ERROR_INVALID_STATE,
            Self::Timeout => NRF_ERROR_TIMEOUT,
            Self::Busy => NRF_ERROR_BUSY,
            Self::InvalidConnHandle => BLE_ERROR_INVALID_CONN_HANDLE,
            Self::Raw(code) => code,
        }
    }

    /// Statuses produced when a best-effort call races a disconnect.
    pub fn is_link_race(self) -> bool {
        matches!(self, Self::InvalidConnHandle | Self::InvalidState)
    }
}

/// Outcome of a single stack call.
pub type Status = Result<(), NrfError>;

/// Drop the statuses that only mean "the link went away under us".
pub fn tolerate_link_race(status: Status) -> Status {
    match status {
        Err(e) if e.is_link_race() => Ok(()),
        other => other,
    }
}

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The SoftDevice (or a board service) returned a non-success status.
    Stack(NrfError),

    /// An interrupt producer found the event queue full.
    QueueFull,
}

impl Error {
    pub fn code(self) -> u32 {
        match self {
            Self::Stack(e) => e.code(),
            Self::QueueFull => NRF_ERROR_NO_MEM,
        }
    }
}

impl From<NrfError> for Error {
    fn from(e: NrfError) -> Self {
        Error::Stack(e)
    }
}

/// A fatal error together with the place it was observed.
///
/// Once a fault is raised the device stops making progress and tries to
/// enter system-off; only an external reset or wake brings it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    pub error: Error,
    pub location: &'static Location<'static>,
}

impl Fault {
    /// Record `error` at the caller's source location.
    #[track_caller]
    pub fn new(error: impl Into<Error>) -> Self {
        Self {
            error: error.into(),
            location: Location::caller(),
        }
    }

    pub fn code(&self) -> u32 {
        self.error.code()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Fault {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{} (code {=u32:#x}) at {=str}:{=u32}",
            self.error,
            self.code(),
            self.location.file(),
            self.location.line()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_code_is_ok() {
        assert_eq!(NrfError::check(0), Ok(()));
    }

    #[test]
    fn known_codes_map_to_variants() {
        assert_eq!(NrfError::check(8), Err(NrfError::InvalidState));
        assert_eq!(NrfError::check(0x3002), Err(NrfError::InvalidConnHandle));
        assert_eq!(NrfError::check(17), Err(NrfError::Busy));
        assert_eq!(NrfError::check(0x1234), Err(NrfError::Raw(0x1234)));
    }

    #[test]
    fn code_survives_conversion() {
        for code in [4, 5, 7, 8, 13, 17, 0x3002, 0x42] {
            let err = NrfError::check(code).unwrap_err();
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn only_two_statuses_are_tolerated() {
        assert_eq!(tolerate_link_race(Err(NrfError::InvalidConnHandle)), Ok(()));
        assert_eq!(tolerate_link_race(Err(NrfError::InvalidState)), Ok(()));
        assert_eq!(tolerate_link_race(Err(NrfError::Busy)), Err(NrfError::Busy));
        assert_eq!(
            tolerate_link_race(Err(NrfError::Raw(3))),
            Err(NrfError::Raw(3))
        );
    }

    #[test]
    fn fault_records_its_location() {
        let line = line!() + 1;
        let fault = Fault::new(NrfError::NoMem);
        assert_eq!(fault.location.line(), line);
        assert!(fault.location.file().ends_with("error.rs"));
        assert_eq!(fault.code(), 4);
    }

    #[test]
    fn queue_full_reports_no_mem() {
        assert_eq!(Error::QueueFull.code(), 4);
    }
}
