pub mod delay;
pub mod gpiod;
pub mod lcd;
pub mod raw;
pub mod sim;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("invalid argument")]
    InvalidArgument,
    #[error("pin {0} is not configured as an output")]
    NotOutput(usize),
    #[error("the feature is not supported on this backend")]
    NotSupported,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Pin-addressed access to the GPIO block of the board.
///
/// Every method takes `&self`; backends use interior mutability where they need state, so a driver
/// can be shared by reference between the LCD bus and anything else living on the same chip.
pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO pins available. Valid pin indices are `0..count`.
    fn count(&self) -> GpioResult<usize>;

    /// Sets the GPIO pin function to output, allowing writing its state.
    fn set_output(&self, pin: usize) -> GpioResult<()>;

    /// Sets the bias of the GPIO pin.
    ///
    /// # Errors
    /// - `GpioError::NotSupported` if the backend cannot control the bias.
    fn set_bias(&self, pin: usize, bias: GpioBias) -> GpioResult<()>;

    /// Drives the GPIO pin high (`true`) or low (`false`).
    fn write(&self, pin: usize, high: bool) -> GpioResult<()>;

    /// Reads the current level of the GPIO pin.
    fn read(&self, pin: usize) -> GpioResult<bool>;
}

impl<G: GpioDriver + ?Sized> GpioDriver for &G {
    fn count(&self) -> GpioResult<usize> {
        (**self).count()
    }

    fn set_output(&self, pin: usize) -> GpioResult<()> {
        (**self).set_output(pin)
    }

    fn set_bias(&self, pin: usize, bias: GpioBias) -> GpioResult<()> {
        (**self).set_bias(pin, bias)
    }

    fn write(&self, pin: usize, high: bool) -> GpioResult<()> {
        (**self).write(pin, high)
    }

    fn read(&self, pin: usize) -> GpioResult<bool> {
        (**self).read(pin)
    }
}

/// Specifies the bias of the GPIO pin.
///
/// You can use this to enable pull-up or pull-down resistors.
/// These should work in both input and output modes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioBias {
    #[default] None,
    PullUp,
    PullDown,
}
