//! In-memory GPIO backend with a virtual clock.
//!
//! [SimGpioDriver] keeps the level of every pin and an event log of everything that was done to the
//! pins, stamped with the time of a shared [SimClock]. [SimDelay] advances that clock instead of
//! sleeping, so a whole LCD session runs instantly while pulse widths and settling times stay
//! measurable.
//!
//! All handles are cheap clones sharing the same state, which lets a test give one clone to the driver
//! under test and keep another one for inspection.
use crate::{GpioBias, GpioDriver, GpioError, GpioResult};
use bitvec::vec::BitVec;
use embedded_hal::delay::DelayNs;
use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Shared virtual clock, counting nanoseconds since creation.
#[derive(Clone, Debug, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in nanoseconds.
    pub fn now_ns(&self) -> u64 {
        self.0.get()
    }

    pub fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

/// [DelayNs] implementation that only advances a [SimClock].
#[derive(Clone, Debug)]
pub struct SimDelay {
    clock: SimClock,
}

impl SimDelay {
    pub fn new(clock: SimClock) -> Self {
        Self { clock }
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(ns as u64);
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.advance_ns(us as u64 * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance_ns(ms as u64 * 1_000_000);
    }
}

/// A single recorded pin operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SimEvent {
    Output { pin: usize, at_ns: u64 },
    Bias { pin: usize, bias: GpioBias, at_ns: u64 },
    Write { pin: usize, high: bool, at_ns: u64 },
}

impl SimEvent {
    pub fn pin(&self) -> usize {
        match *self {
            SimEvent::Output { pin, .. }
            | SimEvent::Bias { pin, .. }
            | SimEvent::Write { pin, .. } => pin,
        }
    }

    pub fn at_ns(&self) -> u64 {
        match *self {
            SimEvent::Output { at_ns, .. }
            | SimEvent::Bias { at_ns, .. }
            | SimEvent::Write { at_ns, .. } => at_ns,
        }
    }
}

struct SimState {
    levels: BitVec,
    outputs: BitVec,
    events: Vec<SimEvent>,
}

#[derive(Clone)]
pub struct SimGpioDriver {
    clock: SimClock,
    state: Rc<RefCell<SimState>>,
}

impl SimGpioDriver {
    /// Raspberry Pi sized pin bank, matching [RawGpioDriver](crate::raw::RawGpioDriver).
    pub const DEFAULT_PIN_COUNT: usize = 58;

    pub fn new(clock: SimClock) -> Self {
        Self::with_pin_count(clock, Self::DEFAULT_PIN_COUNT)
    }

    pub fn with_pin_count(clock: SimClock, pin_count: usize) -> Self {
        Self {
            clock,
            state: Rc::new(RefCell::new(SimState {
                levels: BitVec::repeat(false, pin_count),
                outputs: BitVec::repeat(false, pin_count),
                events: Vec::new(),
            })),
        }
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Copy of the event log so far.
    pub fn events(&self) -> Vec<SimEvent> {
        self.state.borrow().events.clone()
    }

    /// Drops the recorded events, keeping pin levels and configuration.
    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    pub fn is_output(&self, pin: usize) -> bool {
        self.state.borrow().outputs.get(pin).is_some_and(|bit| *bit)
    }

    /// Current level of the pin, `None` if it doesn't exist.
    pub fn level(&self, pin: usize) -> Option<bool> {
        self.state.borrow().levels.get(pin).map(|bit| *bit)
    }

    fn check_pin(&self, pin: usize) -> GpioResult<()> {
        if pin >= self.state.borrow().levels.len() {
            return Err(GpioError::InvalidArgument);
        }
        Ok(())
    }

    fn record(&self, event: SimEvent) {
        self.state.borrow_mut().events.push(event);
    }
}

impl Debug for SimGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        write!(f, "SimGpioDriver({} pins, {} events)", state.levels.len(), state.events.len())
    }
}

impl GpioDriver for SimGpioDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.state.borrow().levels.len())
    }

    fn set_output(&self, pin: usize) -> GpioResult<()> {
        self.check_pin(pin)?;
        self.state.borrow_mut().outputs.set(pin, true);
        self.record(SimEvent::Output { pin, at_ns: self.clock.now_ns() });
        Ok(())
    }

    fn set_bias(&self, pin: usize, bias: GpioBias) -> GpioResult<()> {
        self.check_pin(pin)?;
        self.record(SimEvent::Bias { pin, bias, at_ns: self.clock.now_ns() });
        Ok(())
    }

    fn write(&self, pin: usize, high: bool) -> GpioResult<()> {
        self.check_pin(pin)?;
        if !self.is_output(pin) {
            return Err(GpioError::NotOutput(pin));
        }
        self.state.borrow_mut().levels.set(pin, high);
        self.record(SimEvent::Write { pin, high, at_ns: self.clock.now_ns() });
        Ok(())
    }

    fn read(&self, pin: usize) -> GpioResult<bool> {
        self.level(pin).ok_or(GpioError::InvalidArgument)
    }
}
