//! Pairing and re-encryption, answered inline for the SoftDevice.
//!
//! `nrf_softdevice` resolves security requests inside its own event
//! handler, before anything could be queued, so the [`SecurityNegotiator`]
//! used here is shared with that handler rather than owned by the main
//! loop.

use core::cell::RefCell;

use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use ledbutton::config::Config;
use ledbutton::security::{self, AuthStatus, EncInfo, SecurityNegotiator};
use nrf_softdevice::ble::security::{IoCapabilities, SecurityHandler};
use nrf_softdevice::ble::{Connection, EncryptionInfo, IdentityKey, MasterId, SecurityMode};
use static_cell::StaticCell;

// `ble_gap_enc_info_t` flag layout: lesc:1, auth:1, ltk_len:6.
const ENC_FLAG_AUTH: u8 = 1 << 1;
const ENC_LTK_LEN_SHIFT: u8 = 2;

pub struct Bonder {
    negotiator: Mutex<CriticalSectionRawMutex, RefCell<SecurityNegotiator>>,
}

impl Bonder {
    fn new(config: &Config) -> Self {
        Self {
            negotiator: Mutex::new(RefCell::new(SecurityNegotiator::new(config.security))),
        }
    }
}

fn enc_info_from_sd(key: &EncryptionInfo) -> EncInfo {
    EncInfo {
        ltk: key.ltk,
        auth: key.flags & ENC_FLAG_AUTH != 0,
        ltk_len: key.flags >> ENC_LTK_LEN_SHIFT,
    }
}

fn enc_info_to_sd(info: &EncInfo) -> EncryptionInfo {
    let mut flags = info.ltk_len << ENC_LTK_LEN_SHIFT;
    if info.auth {
        flags |= ENC_FLAG_AUTH;
    }
    EncryptionInfo {
        ltk: info.ltk,
        flags,
    }
}

impl SecurityHandler for Bonder {
    fn io_capabilities(&self) -> IoCapabilities {
        let io_caps = self.negotiator.lock(|n| n.borrow().params().io_caps);
        match io_caps {
            security::IoCapabilities::DisplayOnly => IoCapabilities::DisplayOnly,
            security::IoCapabilities::DisplayYesNo => IoCapabilities::DisplayYesNo,
            security::IoCapabilities::KeyboardOnly => IoCapabilities::KeyboardOnly,
            security::IoCapabilities::None => IoCapabilities::None,
            security::IoCapabilities::KeyboardDisplay => IoCapabilities::KeyboardDisplay,
        }
    }

    fn can_bond(&self, _conn: &Connection) -> bool {
        self.negotiator.lock(|n| n.borrow().params().bond)
    }

    fn on_bonded(
        &self,
        _conn: &Connection,
        master_id: MasterId,
        key: EncryptionInfo,
        _peer_id: IdentityKey,
    ) {
        info!("bonded, ediv {=u16:#x}", master_id.ediv);
        let status = AuthStatus {
            status: 0,
            bonded: true,
            div: master_id.ediv,
            enc_info: enc_info_from_sd(&key),
        };
        self.negotiator.lock(|n| n.borrow_mut().store(status));
    }

    fn get_key(&self, _conn: &Connection, master_id: MasterId) -> Option<EncryptionInfo> {
        let key = self
            .negotiator
            .lock(|n| n.borrow().keys_for(master_id.ediv).map(enc_info_to_sd));
        if key.is_none() {
            info!("no keys for ediv {=u16:#x}", master_id.ediv);
        }
        key
    }

    fn on_security_update(&self, _conn: &Connection, mode: SecurityMode) {
        info!("BLE security mode updated: {}", mode);
    }
}

pub fn bonder(config: &Config) -> &'static Bonder {
    static BONDER: StaticCell<Bonder> = StaticCell::new();
    BONDER.init(Bonder::new(config))
}
