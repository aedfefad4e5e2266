//! GpiodDriver implementation for managing GPIO pins using the gpiod library.
//!
//! Slower than [RawGpioDriver](crate::raw::RawGpioDriver), since every level change is an ioctl, but
//! works on any board exposing a `/dev/gpiochipN` character device and does not need `/dev/mem`.
use crate::{GpioBias, GpioDriver, GpioError, GpioResult};
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

/// GpiodDriver is a GPIO driver that uses the gpiod library to manage GPIO pins.
///
/// Each pin configured as output holds its own line request for as long as the driver lives.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    pins: RefCell<HashMap<usize, GpiodPin>>,
}

#[derive(Default)]
struct GpiodPin {
    bias: GpioBias,
    line: Option<gpiod::Lines<gpiod::Output>>,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        Self {
            chip,
            pins: RefCell::new(HashMap::new()),
        }
    }

    pub fn open(path: &str) -> GpioResult<Self> {
        Ok(Self::new(gpiod::Chip::new(path)?))
    }

    fn check_pin(&self, pin: usize) -> GpioResult<()> {
        if pin >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }
        Ok(())
    }

    fn request_output(
        &self,
        pin: usize,
        bias: GpioBias,
    ) -> GpioResult<gpiod::Lines<gpiod::Output>> {
        debug!("Requesting {:?} line {} as output, bias {:?}", self, pin, bias);
        let line = self.chip.request_lines(
            gpiod::Options::output([pin as u32])
                .consumer(env!("CARGO_PKG_NAME"))
                .bias(bias.into()),
        )?;
        Ok(line)
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl From<GpioBias> for gpiod::Bias {
    fn from(bias: GpioBias) -> Self {
        match bias {
            GpioBias::None => gpiod::Bias::Disable,
            GpioBias::PullUp => gpiod::Bias::PullUp,
            GpioBias::PullDown => gpiod::Bias::PullDown,
        }
    }
}

impl GpioDriver for GpiodDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip.num_lines() as usize)
    }

    fn set_output(&self, pin: usize) -> GpioResult<()> {
        self.check_pin(pin)?;
        let mut pins = self.pins.borrow_mut();
        let state = pins.entry(pin).or_default();
        // Release the previous request first, the kernel refuses a second one for the same line
        state.line = None;
        state.line = Some(self.request_output(pin, state.bias)?);
        Ok(())
    }

    fn set_bias(&self, pin: usize, bias: GpioBias) -> GpioResult<()> {
        self.check_pin(pin)?;
        let mut pins = self.pins.borrow_mut();
        let state = pins.entry(pin).or_default();
        state.bias = bias;
        // The bias is part of the line request, so an active output has to be requested again
        if state.line.take().is_some() {
            state.line = Some(self.request_output(pin, bias)?);
        }
        Ok(())
    }

    fn write(&self, pin: usize, high: bool) -> GpioResult<()> {
        let pins = self.pins.borrow();
        let line = pins
            .get(&pin)
            .and_then(|state| state.line.as_ref())
            .ok_or(GpioError::NotOutput(pin))?;
        line.set_values([high])?;
        Ok(())
    }

    fn read(&self, pin: usize) -> GpioResult<bool> {
        let pins = self.pins.borrow();
        if let Some(line) = pins.get(&pin).and_then(|state| state.line.as_ref()) {
            let values = line.get_values([false])?;
            return Ok(values[0]);
        }
        drop(pins);

        self.check_pin(pin)?;
        let line = self.chip.request_lines(
            gpiod::Options::input([pin as u32]).consumer(env!("CARGO_PKG_NAME")),
        )?;
        let values = line.get_values([false])?;
        Ok(values[0])
    }
}
