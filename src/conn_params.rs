//! Connection parameters negotiator.
//!
//! After a central connects, the peripheral waits a while and then asks
//! for its preferred connection interval. Every rejected request counts
//! against a fixed budget; when the budget is spent the link is dropped
//! with "unacceptable connection interval".
//!
//! The negotiation record lives from connect until success, failure or
//! disconnect, whichever comes first.

use crate::config::ConnParamsConfig;
use crate::error::Status;
use crate::event::{BleEvent, ConnHandle, ConnParams, HciReason};
use crate::hal::{Board, Radio};

/// Result of a finished negotiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// Live negotiation state for one connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Negotiation {
    pub handle: ConnHandle,
    /// Rejected requests so far.
    pub attempts: u8,
    /// A request was sent and its result has not arrived yet.
    pub pending: bool,
}

pub struct ConnParamsNegotiator {
    config: ConnParamsConfig,
    negotiation: Option<Negotiation>,
    last_outcome: Option<Outcome>,
}

impl ConnParamsNegotiator {
    pub fn new(config: ConnParamsConfig) -> Self {
        Self {
            config,
            negotiation: None,
            last_outcome: None,
        }
    }

    pub fn negotiation(&self) -> Option<&Negotiation> {
        self.negotiation.as_ref()
    }

    /// How the last negotiation ended, if one has ended.
    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    /// The link interval lies inside the preferred range.
    pub fn is_acceptable(&self, params: &ConnParams) -> bool {
        let preferred = &self.config.preferred;
        params.max_interval >= preferred.min_interval
            && params.max_interval <= preferred.max_interval
    }

    pub fn on_ble_evt<R: Radio, B: Board>(
        &mut self,
        evt: &BleEvent,
        radio: &mut R,
        board: &mut B,
    ) -> Status {
        match evt {
            BleEvent::Connected { handle, params } => {
                self.last_outcome = None;
                if self.is_acceptable(params) {
                    self.finish(Outcome::Succeeded, board);
                    return Ok(());
                }
                self.negotiation = Some(Negotiation {
                    handle: *handle,
                    attempts: 0,
                    pending: false,
                });
                board.start_conn_params_timer(self.config.first_update_delay_ms)
            }
            BleEvent::Disconnected { .. } => {
                if self.negotiation.take().is_some() {
                    board.stop_conn_params_timer()?;
                }
                Ok(())
            }
            BleEvent::ConnParamUpdate { params, .. } => self.on_update(params, radio, board),
            _ => Ok(()),
        }
    }

    /// Timer expiry: send the next request.
    pub fn on_timer<R: Radio>(&mut self, radio: &mut R) -> Status {
        let Some(neg) = self.negotiation.as_mut() else {
            return Ok(());
        };
        neg.pending = true;
        debug!("conn params: request #{=u8}", neg.attempts + 1);
        radio.update_conn_params(neg.handle, &self.config.preferred)
    }

    fn on_update<R: Radio, B: Board>(
        &mut self,
        params: &ConnParams,
        radio: &mut R,
        board: &mut B,
    ) -> Status {
        let acceptable = self.is_acceptable(params);
        let Some(neg) = self.negotiation.as_mut() else {
            return Ok(());
        };

        if acceptable {
            board.stop_conn_params_timer()?;
            self.finish(Outcome::Succeeded, board);
            return Ok(());
        }

        // An unsolicited update from the central does not use up the budget.
        if !neg.pending {
            return Ok(());
        }
        neg.pending = false;
        neg.attempts += 1;

        if neg.attempts < self.config.max_attempts {
            return board.start_conn_params_timer(self.config.next_update_delay_ms);
        }

        let handle = neg.handle;
        self.finish(Outcome::Failed, board);
        radio.disconnect(handle, HciReason::ConnIntervalUnacceptable)
    }

    fn finish<B: Board>(&mut self, outcome: Outcome, board: &mut B) {
        info!("conn params: negotiation {}", outcome);
        board.diag("on_conn_params_evt() evt_type:", outcome as u32);
        self.negotiation = None;
        self.last_outcome = Some(outcome);
    }
}
