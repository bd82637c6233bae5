//! Boundaries to the radio stack and to the board.
//!
//! The core never touches the SoftDevice or GPIO directly; everything
//! goes through these two traits so the state machine can run on the
//! host against recording mocks.

use crate::config::AdvParams;
use crate::error::{NrfError, Status};
use crate::event::{AttrHandle, ConnHandle, ConnParams, HciReason};
use crate::lbs::LbsHandles;
use crate::security::{EncInfo, SecStatus, SecurityParams};

/// Calls into the BLE protocol stack. Every call returns a status.
pub trait Radio {
    fn set_device_name(&mut self, name: &str) -> Status;

    fn set_address(&mut self, address: &[u8; 6]) -> Status;

    /// Set the Peripheral Preferred Connection Parameters.
    fn set_ppcp(&mut self, params: &ConnParams) -> Status;

    /// Register the LED Button Service and return its attribute handles.
    fn register_lbs(&mut self) -> Result<LbsHandles, NrfError>;

    fn start_advertising(&mut self, params: &AdvParams) -> Status;

    fn disconnect(&mut self, handle: ConnHandle, reason: HciReason) -> Status;

    /// Ask the central to switch to `params`.
    fn update_conn_params(&mut self, handle: ConnHandle, params: &ConnParams) -> Status;

    fn sec_params_reply(
        &mut self,
        handle: ConnHandle,
        status: SecStatus,
        params: Option<&SecurityParams>,
    ) -> Status;

    /// `None` means "no keys for this peer".
    fn sec_info_reply(&mut self, handle: ConnHandle, enc_info: Option<&EncInfo>) -> Status;

    /// Set an empty set of GATT system attributes.
    fn set_sys_attr(&mut self, handle: ConnHandle) -> Status;

    fn notify(&mut self, handle: ConnHandle, attr: AttrHandle, value: &[u8]) -> Status;

    /// Enter system-off. Does not return on hardware; a wake-up resets the chip.
    fn system_off(&mut self) -> Status;
}

/// Indicator LEDs driven by the firmware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Led {
    Advertising,
    Connected,
    /// The LED exposed through the LED characteristic.
    LedButton,
}

impl Led {
    pub const ALL: [Led; 3] = [Led::Advertising, Led::Connected, Led::LedButton];
}

/// Everything outside the radio: GPIO, button monitoring, app timer, UART.
pub trait Board {
    /// Configure all LED pins as outputs, every LED off.
    fn init_leds(&mut self);

    fn set_led(&mut self, led: Led);

    fn clear_led(&mut self, led: Led);

    fn toggle_led(&mut self, led: Led);

    /// Start delivering debounced button presses.
    fn enable_button(&mut self) -> Status;

    fn disable_button(&mut self) -> Status;

    /// Configure the wake-up button as a system-off wake source.
    fn arm_wakeup(&mut self);

    /// (Re)start the single-shot connection parameter timer.
    fn start_conn_params_timer(&mut self, delay_ms: u32) -> Status;

    fn stop_conn_params_timer(&mut self) -> Status;

    /// Fire-and-forget one-line status on the serial port.
    fn diag(&mut self, label: &str, code: u32);
}

impl<R: Radio + ?Sized> Radio for &mut R {
    fn set_device_name(&mut self, name: &str) -> Status {
        R::set_device_name(self, name)
    }

    fn set_address(&mut self, address: &[u8; 6]) -> Status {
        R::set_address(self, address)
    }

    fn set_ppcp(&mut self, params: &ConnParams) -> Status {
        R::set_ppcp(self, params)
    }

    fn register_lbs(&mut self) -> Result<LbsHandles, NrfError> {
        R::register_lbs(self)
    }

    fn start_advertising(&mut self, params: &AdvParams) -> Status {
        R::start_advertising(self, params)
    }

    fn disconnect(&mut self, handle: ConnHandle, reason: HciReason) -> Status {
        R::disconnect(self, handle, reason)
    }

    fn update_conn_params(&mut self, handle: ConnHandle, params: &ConnParams) -> Status {
        R::update_conn_params(self, handle, params)
    }

    fn sec_params_reply(
        &mut self,
        handle: ConnHandle,
        status: SecStatus,
        params: Option<&SecurityParams>,
    ) -> Status {
        R::sec_params_reply(self, handle, status, params)
    }

    fn sec_info_reply(&mut self, handle: ConnHandle, enc_info: Option<&EncInfo>) -> Status {
        R::sec_info_reply(self, handle, enc_info)
    }

    fn set_sys_attr(&mut self, handle: ConnHandle) -> Status {
        R::set_sys_attr(self, handle)
    }

    fn notify(&mut self, handle: ConnHandle, attr: AttrHandle, value: &[u8]) -> Status {
        R::notify(self, handle, attr, value)
    }

    fn system_off(&mut self) -> Status {
        R::system_off(self)
    }
}

impl<B: Board + ?Sized> Board for &mut B {
    fn init_leds(&mut self) {
        B::init_leds(self)
    }

    fn set_led(&mut self, led: Led) {
        B::set_led(self, led)
    }

    fn clear_led(&mut self, led: Led) {
        B::clear_led(self, led)
    }

    fn toggle_led(&mut self, led: Led) {
        B::toggle_led(self, led)
    }

    fn enable_button(&mut self) -> Status {
        B::enable_button(self)
    }

    fn disable_button(&mut self) -> Status {
        B::disable_button(self)
    }

    fn arm_wakeup(&mut self) {
        B::arm_wakeup(self)
    }

    fn start_conn_params_timer(&mut self, delay_ms: u32) -> Status {
        B::start_conn_params_timer(self, delay_ms)
    }

    fn stop_conn_params_timer(&mut self) -> Status {
        B::stop_conn_params_timer(self)
    }

    fn diag(&mut self, label: &str, code: u32) {
        B::diag(self, label, code)
    }
}
