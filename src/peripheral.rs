//! Peripheral context and dispatch router.
//!
//! [`Peripheral`] owns every piece of mutable state (GAP, negotiators,
//! service) together with the radio and board it drives. The main loop
//! feeds it one [`Event`] at a time through [`Peripheral::dispatch`].
//!
//! Stack events fan out in a fixed order: GAP state machine, then the
//! connection parameters negotiator, then the LED Button Service. Only
//! the status of the last handler decides whether the event was fatal.

use crate::config::Config;
use crate::conn_params::ConnParamsNegotiator;
use crate::error::{Error, Fault, Status};
use crate::event::{BleEvent, Event};
use crate::gap::{Gap, GapState};
use crate::hal::{Board, Radio};
use crate::lbs::{LbsHandles, LedButtonService};
use crate::security::SecurityNegotiator;

pub struct Peripheral<R: Radio, B: Board> {
    radio: R,
    board: B,
    gap: Gap,
    conn_params: ConnParamsNegotiator,
    security: SecurityNegotiator,
    lbs: LedButtonService,
    button_pin: u8,
    fault: Option<Fault>,
}

impl<R: Radio, B: Board> Peripheral<R, B> {
    /// Bring up GAP parameters and the GATT service.
    ///
    /// Nothing is advertised yet; call [`Peripheral::start`] for that.
    /// A failing step is reported and powers the device off like any
    /// other fault.
    pub fn new(mut radio: R, mut board: B, config: &Config) -> Result<Self, Fault> {
        board.init_leds();
        let handles = match init_stack(&mut radio, config) {
            Ok(handles) => handles,
            Err(fault) => {
                power_down(&mut radio, &mut board, &fault);
                return Err(fault);
            }
        };
        debug!("lbs registered: {}", handles);

        Ok(Self {
            radio,
            board,
            gap: Gap::new(config.advertising),
            conn_params: ConnParamsNegotiator::new(config.conn_params),
            security: SecurityNegotiator::new(config.security),
            lbs: LedButtonService::new(handles),
            button_pin: config.button_pin,
            fault: None,
        })
    }

    /// Start advertising. This is the `Advertising` entry at power-on.
    pub fn start(&mut self) -> Result<(), Fault> {
        if let Err(e) = self.gap.start_advertising(&mut self.radio, &mut self.board) {
            return Err(self.fatal(Fault::new(e)));
        }
        self.board.diag("ledbutton run", 0);
        Ok(())
    }

    /// Route one event to its handlers.
    ///
    /// Once halted (advertising timeout or an earlier fault) every event
    /// is dropped.
    pub fn dispatch(&mut self, event: Event) -> Result<(), Fault> {
        if self.is_halted() {
            trace!("dropping event while halted");
            return Ok(());
        }

        let status = match &event {
            Event::Ble(evt) => self.dispatch_ble(evt),
            Event::ConnParamsTimer => self.conn_params.on_timer(&mut self.radio),
            Event::ButtonPressed { pin } => return self.on_button(*pin),
        };

        match status {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fatal(Fault::new(e))),
        }
    }

    fn dispatch_ble(&mut self, evt: &BleEvent) -> Status {
        let mut status = self.gap.on_ble_evt(
            evt,
            &mut self.radio,
            &mut self.board,
            &mut self.security,
        );
        status = last_status_wins(
            status,
            self.conn_params
                .on_ble_evt(evt, &mut self.radio, &mut self.board),
        );
        last_status_wins(status, self.lbs.on_ble_evt(evt, &mut self.board))
    }

    fn on_button(&mut self, pin: u8) -> Result<(), Fault> {
        self.board.diag("event pin #", u32::from(pin));
        if pin != self.button_pin {
            return Ok(());
        }
        match self.lbs.on_button_change(&mut self.radio) {
            Ok(value) => {
                debug!("button notified {=bool}", value);
                Ok(())
            }
            Err(e) if e.is_link_race() => {
                debug!("button notification dropped: {}", e);
                Ok(())
            }
            Err(e) => Err(self.fatal(Fault::new(e))),
        }
    }

    /// Treat an error raised outside the handlers (e.g. by an event
    /// producer) as fatal.
    #[track_caller]
    pub fn fail(&mut self, error: impl Into<Error>) -> Fault {
        let fault = Fault::new(error);
        self.fatal(fault)
    }

    /// Record the fault, report it and try to power off.
    fn fatal(&mut self, fault: Fault) -> Fault {
        self.gap.halt();
        self.fault = Some(fault);
        power_down(&mut self.radio, &mut self.board, &fault);
        fault
    }

    pub fn is_halted(&self) -> bool {
        self.gap.state() == GapState::LowPowerHalt
    }

    pub fn state(&self) -> GapState {
        self.gap.state()
    }

    pub fn gap(&self) -> &Gap {
        &self.gap
    }

    pub fn conn_params(&self) -> &ConnParamsNegotiator {
        &self.conn_params
    }

    pub fn security(&self) -> &SecurityNegotiator {
        &self.security
    }

    pub fn lbs(&self) -> &LedButtonService {
        &self.lbs
    }

    /// The fault that halted the device, if any.
    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Give back the hardware, dropping all session state.
    pub fn into_parts(self) -> (R, B) {
        (self.radio, self.board)
    }
}

fn init_stack<R: Radio>(radio: &mut R, config: &Config) -> Result<LbsHandles, Fault> {
    radio.set_device_name(config.device_name).map_err(Fault::new)?;
    radio.set_address(&config.device_address).map_err(Fault::new)?;
    radio
        .set_ppcp(&config.conn_params.preferred)
        .map_err(Fault::new)?;
    radio.register_lbs().map_err(Fault::new)
}

/// Report a fault on the serial line and try to enter system-off.
fn power_down<R: Radio, B: Board>(radio: &mut R, board: &mut B, fault: &Fault) {
    error!("fatal: {}", fault);
    board.diag("reset @ err. code #:", fault.code());
    if let Err(e) = radio.system_off() {
        error!("system off failed: {}", e);
    }
}

/// The later handler's status replaces the earlier one.
fn last_status_wins(earlier: Status, later: Status) -> Status {
    if let Err(e) = earlier {
        warn!("handler status {} superseded by later handler", e);
    }
    later
}

/// Power-on sequence: initialise and start advertising.
pub fn boot<R: Radio, B: Board>(
    radio: R,
    board: B,
    config: &Config,
) -> Result<Peripheral<R, B>, Fault> {
    let mut peripheral = Peripheral::new(radio, board, config)?;
    peripheral.start()?;
    Ok(peripheral)
}

/// What a wake from system-off does: a full reset, not a resume.
pub fn wake<R: Radio, B: Board>(
    halted: Peripheral<R, B>,
    config: &Config,
) -> Result<Peripheral<R, B>, Fault> {
    let (radio, board) = halted.into_parts();
    boot(radio, board, config)
}
