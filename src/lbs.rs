//! LED Button Service bridge.
//!
//! One custom service with two characteristics:
//!
//! | Characteristic | UUID   | Properties | Payload |
//! |----------------|--------|------------|---------|
//! | Button         | 0x1524 | notify     | 1 byte  |
//! | LED            | 0x1525 | write      | 1 byte  |
//!
//! Writes to the LED characteristic drive the LED-button pin with
//! inverted logic (1 = off, 0 = on). Each debounced button press flips
//! a toggle and notifies its new value.

use crate::error::{NrfError, Status};
use crate::event::{AttrHandle, BleEvent, ConnHandle};
use crate::hal::{Board, Led, Radio};

/// 128-bit vendor base UUID, little-endian as the SoftDevice wants it.
/// 00001523-1212-EFDE-1523-785FEABCD123
pub const LBS_UUID_BASE: [u8; 16] = [
    0x23, 0xD1, 0xBC, 0xEA, 0x5F, 0x78, 0x23, 0x15, 0xDE, 0xEF, 0x12, 0x12, 0x00, 0x00, 0x00,
    0x00,
];
pub const LBS_UUID_SERVICE: u16 = 0x1523;
pub const LBS_UUID_BUTTON_CHAR: u16 = 0x1524;
pub const LBS_UUID_LED_CHAR: u16 = 0x1525;

/// Attribute handles assigned when the service was registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LbsHandles {
    pub led_value: AttrHandle,
    pub button_value: AttrHandle,
}

pub struct LedButtonService {
    handles: LbsHandles,
    conn_handle: Option<ConnHandle>,
    /// Value carried by the last button notification.
    button_state: bool,
}

impl LedButtonService {
    pub fn new(handles: LbsHandles) -> Self {
        Self {
            handles,
            conn_handle: None,
            button_state: false,
        }
    }

    pub fn handles(&self) -> &LbsHandles {
        &self.handles
    }

    pub fn button_state(&self) -> bool {
        self.button_state
    }

    pub fn on_ble_evt<B: Board>(&mut self, evt: &BleEvent, board: &mut B) -> Status {
        match evt {
            BleEvent::Connected { handle, .. } => self.conn_handle = Some(*handle),
            BleEvent::Disconnected { .. } => self.conn_handle = None,
            BleEvent::Write { attr, data, .. } => {
                if *attr == self.handles.led_value && data.len() == 1 {
                    self.on_led_write(data[0], board);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_led_write<B: Board>(&mut self, value: u8, board: &mut B) {
        board.diag("led_write_handler:", u32::from(value));
        // Inverted: a written 1 turns the LED off.
        if value != 0 {
            board.clear_led(Led::LedButton);
        } else {
            board.set_led(Led::LedButton);
        }
    }

    /// Flip the toggle and notify the peer of its new value.
    ///
    /// The raw notification status is returned; deciding which failures
    /// are tolerable is up to the caller.
    pub fn on_button_change<R: Radio>(&mut self, radio: &mut R) -> Result<bool, NrfError> {
        self.button_state = !self.button_state;
        let handle = self.conn_handle.unwrap_or(ConnHandle::INVALID);
        radio.notify(
            handle,
            self.handles.button_value,
            &[u8::from(self.button_state)],
        )?;
        Ok(self.button_state)
    }
}
