//! Deferred event queue and main loop.
//!
//! Interrupt-level producers only copy an [`Event`] into a bounded FIFO;
//! all handling happens on the main context, one event at a time, in
//! arrival order. When the queue is empty the loop sleeps until a
//! producer wakes it.

use heapless::Deque;

use crate::config::SCHED_QUEUE_SIZE;
use crate::error::{Error, Fault};
use crate::event::Event;
use crate::hal::{Board, Radio};
use crate::peripheral::Peripheral;

/// Bounded FIFO of pending events.
pub struct EventQueue<const N: usize = SCHED_QUEUE_SIZE> {
    events: Deque<Event, N>,
}

impl<const N: usize> EventQueue<N> {
    pub const fn new() -> Self {
        Self {
            events: Deque::new(),
        }
    }

    /// Append an event. A full queue is an error the producer must report.
    pub fn push(&mut self, event: Event) -> Result<(), Error> {
        self.events.push_back(event).map_err(|_| Error::QueueFull)
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// State of the peripheral after draining.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flow {
    /// Queue empty, waiting for the next event.
    Idle,
    /// System-off was requested; nothing more will be handled.
    Halted,
}

/// Why [`run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    /// Advertising timed out and the device went to system-off.
    Halted,
    Fault(Fault),
    /// The wake source has nothing more to deliver.
    WakeClosed,
}

/// Sleep until producers have queued something.
pub trait Wake {
    /// Block until at least one event is queued.
    ///
    /// `Ok(false)` means no more events will ever arrive. An overflowing
    /// producer surfaces as `Err(Error::QueueFull)`.
    fn wait<const N: usize>(&mut self, queue: &mut EventQueue<N>) -> Result<bool, Error>;
}

/// Dispatch events from `next` until it runs dry or the device halts.
pub fn drain<R, B>(
    peripheral: &mut Peripheral<R, B>,
    mut next: impl FnMut() -> Option<Event>,
) -> Result<Flow, Fault>
where
    R: Radio,
    B: Board,
{
    while let Some(event) = next() {
        trace!("dispatch {}", event);
        peripheral.dispatch(event)?;
        if peripheral.is_halted() {
            return Ok(Flow::Halted);
        }
    }
    Ok(Flow::Idle)
}

/// The main loop: drain, then sleep, forever (or until halt).
pub fn run<R, B, W, const N: usize>(
    peripheral: &mut Peripheral<R, B>,
    queue: &mut EventQueue<N>,
    wake: &mut W,
) -> Exit
where
    R: Radio,
    B: Board,
    W: Wake,
{
    if peripheral.is_halted() {
        return Exit::Halted;
    }
    loop {
        match drain(peripheral, || queue.pop()) {
            Ok(Flow::Idle) => {}
            Ok(Flow::Halted) => return Exit::Halted,
            Err(fault) => return Exit::Fault(fault),
        }
        match wake.wait(queue) {
            Ok(true) => {}
            Ok(false) => return Exit::WakeClosed,
            Err(e) => {
                error!("event producer failed: {}", e);
                return Exit::Fault(peripheral.fail(e));
            }
        }
    }
}
