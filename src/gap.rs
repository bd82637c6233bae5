//! GAP connection state machine.
//!
//! ```text
//!              connect                 disconnect
//! Advertising ---------> Connected ---------------> Disconnected
//!      |  ^                                              |
//!      |  +---------------- restart advertising ---------+
//!      | advertising timeout
//!      v
//! LowPowerHalt  (system-off; only a reset leaves it)
//! ```
//!
//! The state machine owns the connection handle and the two status
//! LEDs. Security requests are answered here too, through the
//! [`SecurityNegotiator`], because they need the current handle.

use crate::config::AdvParams;
use crate::error::{tolerate_link_race, Status};
use crate::event::{BleEvent, ConnHandle, TimeoutSource};
use crate::hal::{Board, Led, Radio};
use crate::security::SecurityNegotiator;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GapState {
    Advertising,
    Connected,
    Disconnected,
    /// System-off requested; nothing happens until reset.
    LowPowerHalt,
}

/// The advertising run currently (or last) in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingSession {
    pub interval: u16,
    pub timeout_secs: u16,
    pub active: bool,
}

pub struct Gap {
    state: GapState,
    conn_handle: Option<ConnHandle>,
    adv_params: AdvParams,
    session: Option<AdvertisingSession>,
}

impl Gap {
    pub fn new(adv_params: AdvParams) -> Self {
        Self {
            state: GapState::Advertising,
            conn_handle: None,
            adv_params,
            session: None,
        }
    }

    pub fn state(&self) -> GapState {
        self.state
    }

    pub fn conn_handle(&self) -> Option<ConnHandle> {
        self.conn_handle
    }

    /// Handle for stack calls; the sentinel when nothing is connected.
    pub fn handle_or_invalid(&self) -> ConnHandle {
        self.conn_handle.unwrap_or(ConnHandle::INVALID)
    }

    pub fn session(&self) -> Option<&AdvertisingSession> {
        self.session.as_ref()
    }

    /// Start connectable advertising and light the advertising LED.
    pub fn start_advertising<R: Radio, B: Board>(&mut self, radio: &mut R, board: &mut B) -> Status {
        radio.start_advertising(&self.adv_params)?;
        board.set_led(Led::Advertising);
        self.session = Some(AdvertisingSession {
            interval: self.adv_params.interval,
            timeout_secs: self.adv_params.timeout_secs,
            active: true,
        });
        self.state = GapState::Advertising;
        info!("gap: advertising");
        Ok(())
    }

    pub fn on_ble_evt<R: Radio, B: Board>(
        &mut self,
        evt: &BleEvent,
        radio: &mut R,
        board: &mut B,
        security: &mut SecurityNegotiator,
    ) -> Status {
        match evt {
            BleEvent::Connected { handle, .. } => self.on_connected(*handle, board),
            BleEvent::Disconnected { reason, .. } => self.on_disconnected(*reason, radio, board),
            BleEvent::Timeout {
                source: TimeoutSource::Advertising,
            } => self.on_advertising_timeout(radio, board),
            BleEvent::SysAttrMissing { .. } => radio.set_sys_attr(self.handle_or_invalid()),
            BleEvent::ConnParamUpdate { params, .. } => {
                if self.state == GapState::Connected {
                    debug!("gap: link params now {}", params);
                    board.toggle_led(Led::LedButton);
                }
                Ok(())
            }
            BleEvent::SecParamsRequest { .. }
            | BleEvent::SecInfoRequest { .. }
            | BleEvent::AuthStatus { .. } => {
                security.on_ble_evt(evt, self.handle_or_invalid(), radio)
            }
            _ => Ok(()),
        }
    }

    fn on_connected<B: Board>(&mut self, handle: ConnHandle, board: &mut B) -> Status {
        if self.state != GapState::Advertising {
            return Ok(());
        }
        info!("gap: connected, handle {}", handle);
        board.clear_led(Led::Advertising);
        board.set_led(Led::Connected);
        self.conn_handle = Some(handle);
        if let Some(session) = self.session.as_mut() {
            session.active = false;
        }
        self.state = GapState::Connected;
        tolerate_link_race(board.enable_button())
    }

    fn on_disconnected<R: Radio, B: Board>(
        &mut self,
        reason: u8,
        radio: &mut R,
        board: &mut B,
    ) -> Status {
        if self.state != GapState::Connected {
            return Ok(());
        }
        info!("gap: disconnected, reason {=u8:#x}", reason);
        board.clear_led(Led::Connected);
        self.conn_handle = None;
        self.state = GapState::Disconnected;
        tolerate_link_race(board.disable_button())?;
        self.start_advertising(radio, board)
    }

    fn on_advertising_timeout<R: Radio, B: Board>(&mut self, radio: &mut R, board: &mut B) -> Status {
        if self.state != GapState::Advertising {
            return Ok(());
        }
        warn!("gap: advertising timed out, powering off");
        board.clear_led(Led::Advertising);
        if let Some(session) = self.session.as_mut() {
            session.active = false;
        }
        board.arm_wakeup();
        board.diag("reset by timeout", 0);
        self.state = GapState::LowPowerHalt;
        radio.system_off()
    }

    /// Force the halt state after a fatal error.
    pub(crate) fn halt(&mut self) {
        self.state = GapState::LowPowerHalt;
        self.conn_handle = None;
        if let Some(session) = self.session.as_mut() {
            session.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn starts_in_advertising_without_handle() {
        let gap = Gap::new(Config::default().advertising);
        assert_eq!(gap.state(), GapState::Advertising);
        assert!(gap.conn_handle().is_none());
        assert_eq!(gap.handle_or_invalid(), ConnHandle::INVALID);
        assert!(gap.session().is_none());
    }

    #[test]
    fn halt_drops_handle() {
        let mut gap = Gap::new(Config::default().advertising);
        gap.halt();
        assert_eq!(gap.state(), GapState::LowPowerHalt);
        assert!(gap.conn_handle().is_none());
    }
}
