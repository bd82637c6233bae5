//! `hal::Radio` on top of the SoftDevice.
//!
//! Calls that need a result code go straight to `nrf_softdevice::raw` so
//! the core sees the real status. Advertising is asynchronous in
//! `nrf_softdevice`, so starting it only hands the parameters to the link
//! task.

use core::mem;
use core::ptr;

use defmt::{debug, info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use ledbutton::config::AdvParams;
use ledbutton::error::{NrfError, Status};
use ledbutton::event::{AttrHandle, ConnHandle, ConnParams, HciReason};
use ledbutton::hal::Radio;
use ledbutton::lbs::LbsHandles;
use ledbutton::security::{EncInfo, SecStatus, SecurityParams};
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;

use super::{conn_params_to_raw, Server};

/// Advertising requests from the core to the link task.
pub static ADV_START: Signal<CriticalSectionRawMutex, AdvParams> = Signal::new();

/// Raised when the central has been asked for new link parameters; the
/// link task owes the core a result for it.
pub static CONN_PARAMS_REQUESTED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

static SERVER: StaticCell<Server> = StaticCell::new();

pub struct SoftdeviceRadio {
    sd: &'static Softdevice,
    server: Option<&'static Server>,
}

impl SoftdeviceRadio {
    pub fn new(sd: &'static Softdevice) -> Self {
        Self { sd, server: None }
    }

    /// The GATT server, once [`Radio::register_lbs`] has run.
    pub fn server(&self) -> Option<&'static Server> {
        self.server
    }
}

impl Radio for SoftdeviceRadio {
    fn set_device_name(&mut self, name: &str) -> Status {
        // Open link: security mode 1, level 1.
        let mut mode: raw::ble_gap_conn_sec_mode_t = unsafe { mem::zeroed() };
        mode.set_sm(1);
        mode.set_lv(1);
        NrfError::check(unsafe {
            raw::sd_ble_gap_device_name_set(&mode, name.as_ptr(), name.len() as u16)
        })
    }

    fn set_address(&mut self, address: &[u8; 6]) -> Status {
        let mut addr: raw::ble_gap_addr_t = unsafe { mem::zeroed() };
        addr.set_addr_type(raw::BLE_GAP_ADDR_TYPE_PUBLIC as u8);
        addr.addr = *address;
        NrfError::check(unsafe { raw::sd_ble_gap_addr_set(&addr) })
    }

    fn set_ppcp(&mut self, params: &ConnParams) -> Status {
        let raw_params = conn_params_to_raw(params);
        NrfError::check(unsafe { raw::sd_ble_gap_ppcp_set(&raw_params) })
    }

    fn register_lbs(&mut self) -> Result<LbsHandles, NrfError> {
        let server = Server::new(self.sd).map_err(|e| {
            warn!("gatt register failed: {:?}", defmt::Debug2Format(&e));
            NrfError::NoMem
        })?;
        let server: &'static Server = SERVER.try_init(server).ok_or(NrfError::InvalidState)?;
        self.server = Some(server);

        let lbs = &server.lbs;
        Ok(LbsHandles {
            led_value: AttrHandle(lbs.led_value_handle),
            button_value: AttrHandle(lbs.button_value_handle),
        })
    }

    fn start_advertising(&mut self, params: &AdvParams) -> Status {
        if self.server.is_none() {
            return Err(NrfError::InvalidState);
        }
        ADV_START.signal(*params);
        Ok(())
    }

    fn disconnect(&mut self, handle: ConnHandle, reason: HciReason) -> Status {
        info!("disconnecting {}: {}", handle, reason);
        NrfError::check(unsafe { raw::sd_ble_gap_disconnect(handle.0, reason as u8) })
    }

    fn update_conn_params(&mut self, handle: ConnHandle, params: &ConnParams) -> Status {
        let raw_params = conn_params_to_raw(params);
        NrfError::check(unsafe { raw::sd_ble_gap_conn_param_update(handle.0, &raw_params) })?;
        CONN_PARAMS_REQUESTED.signal(());
        Ok(())
    }

    // nrf-softdevice replies to SEC_PARAMS_REQUEST and SEC_INFO_REQUEST from
    // its own event handler through `Bonder`; these events never reach the
    // queue on hardware.
    fn sec_params_reply(
        &mut self,
        handle: ConnHandle,
        status: SecStatus,
        _params: Option<&SecurityParams>,
    ) -> Status {
        debug!("sec params on {} answered by the stack ({})", handle, status);
        Ok(())
    }

    fn sec_info_reply(&mut self, handle: ConnHandle, enc_info: Option<&EncInfo>) -> Status {
        debug!(
            "sec info on {} answered by the stack (keys: {=bool})",
            handle,
            enc_info.is_some()
        );
        Ok(())
    }

    fn set_sys_attr(&mut self, handle: ConnHandle) -> Status {
        NrfError::check(unsafe { raw::sd_ble_gatts_sys_attr_set(handle.0, ptr::null(), 0, 0) })
    }

    fn notify(&mut self, handle: ConnHandle, attr: AttrHandle, value: &[u8]) -> Status {
        let mut len = value.len() as u16;
        let params = raw::ble_gatts_hvx_params_t {
            handle: attr.0,
            type_: raw::BLE_GATT_HVX_NOTIFICATION as u8,
            offset: 0,
            p_len: &mut len,
            p_data: value.as_ptr(),
        };
        NrfError::check(unsafe { raw::sd_ble_gatts_hvx(handle.0, &params) })
    }

    fn system_off(&mut self) -> Status {
        info!("entering system off");
        // Only returns on failure; a wake-up resets the chip.
        NrfError::check(unsafe { raw::sd_power_system_off() })
    }
}
