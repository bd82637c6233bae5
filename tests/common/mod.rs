//! Shared test helpers: recording `Radio` / `Board` mocks and builders.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use ledbutton::config::{AdvParams, Config};
use ledbutton::error::{Error, NrfError, Status};
use ledbutton::event::{AttrHandle, BleEvent, ConnHandle, ConnParams, HciReason, WriteData};
use ledbutton::hal::{Board, Led, Radio};
use ledbutton::lbs::LbsHandles;
use ledbutton::peripheral::{self, Peripheral};
use ledbutton::scheduler::{EventQueue, Wake};
use ledbutton::security::{EncInfo, SecStatus, SecurityParams};
use ledbutton::Event;

pub const HANDLE: ConnHandle = ConnHandle(0x0001);

/// Client configuration descriptor of the button characteristic.
pub const BUTTON_CCCD: AttrHandle = AttrHandle(0x0011);

pub fn handles() -> LbsHandles {
    LbsHandles {
        led_value: AttrHandle(0x000E),
        button_value: AttrHandle(0x0010),
    }
}

/// Link parameters with the given interval (1.25 ms units).
pub fn link_params(interval: u16) -> ConnParams {
    ConnParams {
        min_interval: interval,
        max_interval: interval,
        slave_latency: 0,
        sup_timeout: 400,
    }
}

/// Inside the preferred 6..=800 range.
pub fn acceptable() -> ConnParams {
    link_params(80)
}

/// Above the preferred range.
pub fn unacceptable() -> ConnParams {
    link_params(1000)
}

pub fn connected(params: ConnParams) -> Event {
    BleEvent::Connected {
        handle: HANDLE,
        params,
    }
    .into()
}

pub fn disconnected() -> Event {
    BleEvent::Disconnected {
        handle: HANDLE,
        reason: 0x13,
    }
    .into()
}

pub fn param_update(params: ConnParams) -> Event {
    BleEvent::ConnParamUpdate {
        handle: HANDLE,
        params,
    }
    .into()
}

pub fn led_write(attr: AttrHandle, bytes: &[u8]) -> Event {
    BleEvent::Write {
        handle: HANDLE,
        attr,
        data: WriteData::from_slice(bytes).unwrap(),
    }
    .into()
}

pub fn button(config: &Config) -> Event {
    Event::ButtonPressed {
        pin: config.button_pin,
    }
}

/// Queue one failure for the next call named `call`.
#[derive(Default)]
struct Failures(HashMap<&'static str, VecDeque<NrfError>>);

impl Failures {
    fn push(&mut self, call: &'static str, err: NrfError) {
        self.0.entry(call).or_default().push_back(err);
    }

    fn take(&mut self, call: &'static str) -> Status {
        match self.0.get_mut(call).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Radio
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum RadioCall {
    SetDeviceName(String),
    SetAddress([u8; 6]),
    SetPpcp(ConnParams),
    RegisterLbs,
    StartAdvertising(AdvParams),
    Disconnect(ConnHandle, HciReason),
    UpdateConnParams(ConnHandle, ConnParams),
    SecParamsReply(ConnHandle, SecStatus, Option<SecurityParams>),
    SecInfoReply(ConnHandle, Option<EncInfo>),
    SetSysAttr(ConnHandle),
    Notify(ConnHandle, AttrHandle, Vec<u8>),
    SystemOff,
}

#[derive(Default)]
pub struct MockRadio {
    pub calls: Vec<RadioCall>,
    failures: Failures,
}

impl MockRadio {
    pub fn fail_once(&mut self, call: &'static str, err: NrfError) {
        self.failures.push(call, err);
    }

    pub fn disconnects(&self) -> Vec<(ConnHandle, HciReason)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RadioCall::Disconnect(h, r) => Some((*h, *r)),
                _ => None,
            })
            .collect()
    }

    pub fn update_requests(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RadioCall::UpdateConnParams(..)))
            .count()
    }

    /// Payloads of every notification attempted, in order.
    pub fn notified_values(&self) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RadioCall::Notify(_, _, v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn advertising_starts(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RadioCall::StartAdvertising(_)))
            .count()
    }

    pub fn powered_off(&self) -> bool {
        self.calls.contains(&RadioCall::SystemOff)
    }
}

impl Radio for MockRadio {
    fn set_device_name(&mut self, name: &str) -> Status {
        self.calls.push(RadioCall::SetDeviceName(name.to_string()));
        self.failures.take("set_device_name")
    }

    fn set_address(&mut self, address: &[u8; 6]) -> Status {
        self.calls.push(RadioCall::SetAddress(*address));
        self.failures.take("set_address")
    }

    fn set_ppcp(&mut self, params: &ConnParams) -> Status {
        self.calls.push(RadioCall::SetPpcp(*params));
        self.failures.take("set_ppcp")
    }

    fn register_lbs(&mut self) -> Result<LbsHandles, NrfError> {
        self.calls.push(RadioCall::RegisterLbs);
        self.failures.take("register_lbs")?;
        Ok(handles())
    }

    fn start_advertising(&mut self, params: &AdvParams) -> Status {
        self.calls.push(RadioCall::StartAdvertising(*params));
        self.failures.take("start_advertising")
    }

    fn disconnect(&mut self, handle: ConnHandle, reason: HciReason) -> Status {
        self.calls.push(RadioCall::Disconnect(handle, reason));
        self.failures.take("disconnect")
    }

    fn update_conn_params(&mut self, handle: ConnHandle, params: &ConnParams) -> Status {
        self.calls.push(RadioCall::UpdateConnParams(handle, *params));
        self.failures.take("update_conn_params")
    }

    fn sec_params_reply(
        &mut self,
        handle: ConnHandle,
        status: SecStatus,
        params: Option<&SecurityParams>,
    ) -> Status {
        self.calls
            .push(RadioCall::SecParamsReply(handle, status, params.copied()));
        self.failures.take("sec_params_reply")
    }

    fn sec_info_reply(&mut self, handle: ConnHandle, enc_info: Option<&EncInfo>) -> Status {
        self.calls
            .push(RadioCall::SecInfoReply(handle, enc_info.copied()));
        self.failures.take("sec_info_reply")
    }

    fn set_sys_attr(&mut self, handle: ConnHandle) -> Status {
        self.calls.push(RadioCall::SetSysAttr(handle));
        self.failures.take("set_sys_attr")
    }

    fn notify(&mut self, handle: ConnHandle, attr: AttrHandle, value: &[u8]) -> Status {
        self.calls
            .push(RadioCall::Notify(handle, attr, value.to_vec()));
        self.failures.take("notify")
    }

    fn system_off(&mut self) -> Status {
        self.calls.push(RadioCall::SystemOff);
        self.failures.take("system_off")
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Board
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum BoardCall {
    InitLeds,
    SetLed(Led),
    ClearLed(Led),
    ToggleLed(Led),
    EnableButton,
    DisableButton,
    ArmWakeup,
    StartTimer(u32),
    StopTimer,
    Diag(String, u32),
}

#[derive(Default)]
pub struct MockBoard {
    pub calls: Vec<BoardCall>,
    leds: [bool; 3],
    pub button_enabled: bool,
    pub wakeup_armed: bool,
    /// Delay of the running conn params timer.
    pub timer: Option<u32>,
    failures: Failures,
}

fn slot(led: Led) -> usize {
    match led {
        Led::Advertising => 0,
        Led::Connected => 1,
        Led::LedButton => 2,
    }
}

impl MockBoard {
    pub fn fail_once(&mut self, call: &'static str, err: NrfError) {
        self.failures.push(call, err);
    }

    pub fn led(&self, led: Led) -> bool {
        self.leds[slot(led)]
    }

    pub fn diag_lines(&self) -> Vec<(String, u32)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BoardCall::Diag(label, code) => Some((label.clone(), *code)),
                _ => None,
            })
            .collect()
    }

    pub fn has_diag(&self, label: &str, code: u32) -> bool {
        self.diag_lines()
            .iter()
            .any(|(l, c)| l == label && *c == code)
    }
}

impl Board for MockBoard {
    fn init_leds(&mut self) {
        self.calls.push(BoardCall::InitLeds);
        self.leds = [false; 3];
    }

    fn set_led(&mut self, led: Led) {
        self.calls.push(BoardCall::SetLed(led));
        self.leds[slot(led)] = true;
    }

    fn clear_led(&mut self, led: Led) {
        self.calls.push(BoardCall::ClearLed(led));
        self.leds[slot(led)] = false;
    }

    fn toggle_led(&mut self, led: Led) {
        self.calls.push(BoardCall::ToggleLed(led));
        self.leds[slot(led)] = !self.leds[slot(led)];
    }

    fn enable_button(&mut self) -> Status {
        self.calls.push(BoardCall::EnableButton);
        self.failures.take("enable_button")?;
        self.button_enabled = true;
        Ok(())
    }

    fn disable_button(&mut self) -> Status {
        self.calls.push(BoardCall::DisableButton);
        self.failures.take("disable_button")?;
        self.button_enabled = false;
        Ok(())
    }

    fn arm_wakeup(&mut self) {
        self.calls.push(BoardCall::ArmWakeup);
        self.wakeup_armed = true;
    }

    fn start_conn_params_timer(&mut self, delay_ms: u32) -> Status {
        self.calls.push(BoardCall::StartTimer(delay_ms));
        self.failures.take("start_conn_params_timer")?;
        self.timer = Some(delay_ms);
        Ok(())
    }

    fn stop_conn_params_timer(&mut self) -> Status {
        self.calls.push(BoardCall::StopTimer);
        self.failures.take("stop_conn_params_timer")?;
        self.timer = None;
        Ok(())
    }

    fn diag(&mut self, label: &str, code: u32) {
        self.calls.push(BoardCall::Diag(label.to_string(), code));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Builders
// ═══════════════════════════════════════════════════════════════════════════

pub type TestPeripheral = Peripheral<MockRadio, MockBoard>;

pub fn boot_with(config: &Config, radio: MockRadio, board: MockBoard) -> TestPeripheral {
    peripheral::boot(radio, board, config).expect("boot")
}

/// Freshly powered-on peripheral, advertising.
pub fn booted() -> TestPeripheral {
    boot_with(&Config::default(), MockRadio::default(), MockBoard::default())
}

/// Booted and connected with acceptable link parameters.
pub fn booted_connected() -> TestPeripheral {
    let mut p = booted();
    p.dispatch(connected(acceptable())).expect("connect");
    p
}

/// Feeds pre-scripted batches of events, one batch per wake-up.
pub struct ScriptedWake {
    batches: VecDeque<Vec<Event>>,
}

impl ScriptedWake {
    pub fn new(batches: Vec<Vec<Event>>) -> Self {
        Self {
            batches: batches.into(),
        }
    }
}

impl Wake for ScriptedWake {
    fn wait<const N: usize>(&mut self, queue: &mut EventQueue<N>) -> Result<bool, Error> {
        let Some(batch) = self.batches.pop_front() else {
            return Ok(false);
        };
        for event in batch {
            queue.push(event)?;
        }
        Ok(true)
    }
}
