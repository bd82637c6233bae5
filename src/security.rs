//! Security negotiator.
//!
//! Answers pairing requests with a fixed policy and re-encryption
//! requests from the keys of the last pairing. Keys live in RAM only;
//! every new pairing overwrites the previous one.

use crate::error::Status;
use crate::event::{BleEvent, ConnHandle};
use crate::hal::Radio;

/// Encrypted diversifier identifying a distributed LTK.
pub type Diversifier = u16;

/// IO capabilities advertised during pairing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoCapabilities {
    DisplayOnly,
    DisplayYesNo,
    KeyboardOnly,
    None,
    KeyboardDisplay,
}

/// Pairing policy, set once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SecurityParams {
    /// Pairing / security request timeout (seconds).
    pub timeout_secs: u16,
    pub bond: bool,
    /// Man-in-the-middle protection required.
    pub mitm: bool,
    pub io_caps: IoCapabilities,
    /// Out-of-band data available.
    pub oob: bool,
    pub min_key_size: u8,
    pub max_key_size: u8,
}

/// Status reported with a security parameters reply. Pairing is always
/// accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecStatus {
    Success,
}

/// Long term key and its properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncInfo {
    pub ltk: [u8; 16],
    /// Key was generated with MITM protection.
    pub auth: bool,
    pub ltk_len: u8,
}

/// Outcome of a pairing procedure as reported by the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AuthStatus {
    /// Raw `BLE_GAP_SEC_STATUS_*`, 0 = success.
    pub status: u8,
    pub bonded: bool,
    /// Diversifier of the key we distributed.
    pub div: Diversifier,
    pub enc_info: EncInfo,
}

pub struct SecurityNegotiator {
    params: SecurityParams,
    auth: Option<AuthStatus>,
}

impl SecurityNegotiator {
    pub fn new(params: SecurityParams) -> Self {
        Self { params, auth: None }
    }

    pub fn params(&self) -> &SecurityParams {
        &self.params
    }

    /// Keys of the last pairing, if any.
    pub fn auth_status(&self) -> Option<&AuthStatus> {
        self.auth.as_ref()
    }

    /// Stored encryption info for `div`, if it belongs to the last pairing.
    pub fn keys_for(&self, div: Diversifier) -> Option<&EncInfo> {
        self.auth
            .as_ref()
            .filter(|auth| auth.div == div)
            .map(|auth| &auth.enc_info)
    }

    /// Last pairing wins, whatever its outcome.
    pub fn store(&mut self, status: AuthStatus) {
        self.auth = Some(status);
    }

    /// Handle the security related stack events; everything else is ignored.
    ///
    /// Replies go to `handle`, the connection currently tracked by GAP.
    pub fn on_ble_evt<R: Radio>(
        &mut self,
        evt: &BleEvent,
        handle: ConnHandle,
        radio: &mut R,
    ) -> Status {
        match evt {
            BleEvent::SecParamsRequest { .. } => {
                debug!("security: params request on {}", handle);
                radio.sec_params_reply(handle, SecStatus::Success, Some(&self.params))
            }
            BleEvent::SecInfoRequest { div, .. } => {
                let keys = self.keys_for(*div);
                if keys.is_none() {
                    info!("security: no keys for div {=u16:#x}", *div);
                }
                radio.sec_info_reply(handle, keys)
            }
            BleEvent::AuthStatus { status, .. } => {
                info!(
                    "security: auth status {=u8}, bonded {=bool}",
                    status.status,
                    status.bonded
                );
                self.store(*status);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
