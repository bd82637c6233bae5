//! Advertising and connection lifetime.
//!
//! The link task waits for the core to request advertising, advertises
//! until a central connects or the timeout expires, then runs the GATT
//! server until the link drops. Everything it observes is pushed onto
//! the event queue as a [`BleEvent`]; it never touches core state.

use defmt::info;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Timer};
use heapless::Vec;
use ledbutton::event::{AttrHandle, BleEvent, ConnHandle, HciReason, TimeoutSource};
use nrf_softdevice::ble::advertisement_builder::{
    AdvertisementDataType, Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload,
    ServiceList,
};
use nrf_softdevice::ble::peripheral::{self, AdvertiseError, ConnectableAdvertisement};
use nrf_softdevice::ble::{gatt_server, Connection};
use nrf_softdevice::Softdevice;

use super::bonder::Bonder;
use super::radio::{ADV_START, CONN_PARAMS_REQUESTED};
use super::{conn_params_from_raw, push_event, LbsServiceEvent, Server, ServerEvent};

/// How often the live connection parameters are compared for changes.
const CONN_PARAMS_POLL: Duration = Duration::from_millis(250);

/// How long the central gets to answer a parameter update request. When it
/// expires the unchanged parameters are reported as the result.
const CONN_PARAMS_RESULT_TIMEOUT: Duration = Duration::from_secs(30);

const APPEARANCE: [u8; 2] = ledbutton::config::APPEARANCE.to_le_bytes();

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::LimitedDiscovery, Flag::LE_Only])
    .raw(AdvertisementDataType::APPEARANCE, &APPEARANCE)
    .full_name(ledbutton::config::DEVICE_NAME)
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .services_128(
        ServiceList::Complete,
        &[0x00001523_1212_efde_1523_785feabcd123_u128.to_le_bytes()],
    )
    .build();

pub async fn link_task(
    sd: &'static Softdevice,
    server: &'static Server,
    bonder: &'static Bonder,
) -> ! {
    loop {
        let params = ADV_START.wait().await;

        let config = peripheral::Config {
            interval: u32::from(params.interval),
            // 10 ms units; zero disables the timeout.
            timeout: (params.timeout_secs != 0).then(|| params.timeout_secs.saturating_mul(100)),
            ..Default::default()
        };
        let adv = ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };

        let conn = match peripheral::advertise_pairable(sd, adv, &config, bonder).await {
            Ok(conn) => conn,
            Err(AdvertiseError::Timeout) => {
                push_event(BleEvent::Timeout {
                    source: TimeoutSource::Advertising,
                });
                continue;
            }
            Err(e) => defmt::panic!("advertising failed: {:?}", defmt::Debug2Format(&e)),
        };

        let handle = ConnHandle(conn.handle().unwrap_or(ConnHandle::INVALID.0));
        push_event(BleEvent::Connected {
            handle,
            params: conn_params_from_raw(&conn.conn_params()),
        });

        serve(&conn, server, handle).await;

        push_event(BleEvent::Disconnected {
            handle,
            // gatt_server::run does not report the HCI reason.
            reason: HciReason::RemoteUserTerminated as u8,
        });
    }
}

/// Run the GATT server for one connection; returns once it is gone.
async fn serve(conn: &Connection, server: &'static Server, handle: ConnHandle) {
    let led_attr = AttrHandle(server.lbs.led_value_handle);

    let gatt = gatt_server::run(conn, server, |e| match e {
        ServerEvent::Lbs(e) => match e {
            LbsServiceEvent::LedWrite(value) => {
                let mut data = Vec::new();
                // Capacity is never below one byte.
                let _ = data.push(value);
                push_event(BleEvent::Write {
                    handle,
                    attr: led_attr,
                    data,
                });
            }
            LbsServiceEvent::ButtonCccdWrite { notifications } => {
                info!("button notifications: {}", notifications)
            }
        },
    });

    let watch = async {
        let mut last = conn_params_from_raw(&conn.conn_params());
        // A request left over from the previous link is not ours.
        CONN_PARAMS_REQUESTED.reset();
        let mut result_due: Option<Instant> = None;
        loop {
            Timer::after(CONN_PARAMS_POLL).await;
            if CONN_PARAMS_REQUESTED.try_take().is_some() {
                result_due = Some(Instant::now() + CONN_PARAMS_RESULT_TIMEOUT);
            }

            let now = conn_params_from_raw(&conn.conn_params());
            let expired = result_due.is_some_and(|due| Instant::now() >= due);
            if now != last || expired {
                if expired && now == last {
                    info!("conn params request unanswered, reporting current");
                }
                last = now;
                result_due = None;
                push_event(BleEvent::ConnParamUpdate {
                    handle,
                    params: now,
                });
            }
        }
    };

    if let Either::First(e) = select(gatt, watch).await {
        info!("disconnected: {:?}", defmt::Debug2Format(&e));
    }
}
