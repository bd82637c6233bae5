//! LED Button peripheral firmware for the nRF52840-DK (S140).
//!
//! Boot order: Embassy HAL, board pins, SoftDevice, core peripheral
//! (device name, address, PPCP, GATT service), producer tasks, then
//! advertising. The main task is the single consumer of the event queue;
//! between bursts it sleeps in the executor's WFE.

#![no_std]
#![no_main]

mod ble;
mod board;

use core::mem;

use defmt::{info, unwrap};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::gpio::{AnyPin, Level, Output, OutputDrive};
use embassy_nrf::interrupt::Priority;
use embassy_nrf::{bind_interrupts, peripherals, uarte};
use ledbutton::config::{Config, DEVICE_NAME, LEDBUTTON_BUTTON_PIN};
use ledbutton::scheduler::{self, Flow};
use ledbutton::{Error, Peripheral};
use nrf_softdevice::{raw, Softdevice};
use panic_probe as _;

use ble::bonder::{bonder, Bonder};
use ble::radio::SoftdeviceRadio;
use ble::{Server, EVENTS};
use board::NrfBoard;

bind_interrupts!(struct Irqs {
    UARTE0_UART0 => uarte::InterruptHandler<peripherals::UARTE0>;
});

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn link_task(sd: &'static Softdevice, server: &'static Server, bonder: &'static Bonder) -> ! {
    ble::link::link_task(sd, server, bonder).await
}

#[embassy_executor::task]
async fn conn_params_timer_task() -> ! {
    board::timer::conn_params_timer_task().await
}

#[embassy_executor::task]
async fn button_task(pin: AnyPin, pin_no: u8) -> ! {
    board::buttons::button_task(pin, pin_no).await
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_XTAL as u8,
            rc_ctiv: 0,
            rc_temp_ctiv: 0,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_20_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("ledbutton starting");

    // SoftDevice reserves priorities 0, 1 and 4.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    // Start dark; NrfBoard::init_leds settles the final level.
    let led = |pin: AnyPin| Output::new(pin, Level::High, OutputDrive::Standard);
    let mut uart_config = uarte::Config::default();
    uart_config.baudrate = uarte::Baudrate::BAUD115200;
    let uart = uarte::UarteTx::new(p.UARTE0, Irqs, p.P0_06, uart_config);
    let board = NrfBoard::new(
        led(AnyPin::from(p.P0_13)),
        led(AnyPin::from(p.P0_14)),
        led(AnyPin::from(p.P0_15)),
        uart,
    );

    let sd = Softdevice::enable(&softdevice_config());
    let config = Config::default();

    let mut peripheral = match Peripheral::new(SoftdeviceRadio::new(sd), board, &config) {
        Ok(peripheral) => peripheral,
        Err(fault) => defmt::panic!("init failed: {}", fault),
    };
    let server = unwrap!(peripheral.radio().server());

    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(link_task(sd, server, bonder(&config))));
    unwrap!(spawner.spawn(conn_params_timer_task()));
    unwrap!(spawner.spawn(button_task(
        AnyPin::from(p.P0_11),
        LEDBUTTON_BUTTON_PIN
    )));

    if let Err(fault) = peripheral.start() {
        defmt::panic!("start failed: {}", fault);
    }

    loop {
        EVENTS.ready_to_receive().await;
        if ble::take_overflow() {
            let fault = peripheral.fail(Error::QueueFull);
            defmt::panic!("fault: {}", fault);
        }
        match scheduler::drain(&mut peripheral, || EVENTS.try_receive().ok()) {
            Ok(Flow::Idle) => {}
            Ok(Flow::Halted) => break,
            Err(fault) => defmt::panic!("fault: {}", fault),
        }
    }

    // System-off only returns under a debugger; park here.
    info!("halted");
    loop {
        cortex_m::asm::wfe();
    }
}
