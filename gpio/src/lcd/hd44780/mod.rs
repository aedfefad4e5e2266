//! HD44780 character LCD on an 8-bit parallel bus.
//!
//! Two layers:
//! - [driver] moves single bytes over the bus with the right timing. [GpioHd44780Bus] bit-bangs it on
//!   GPIO pins described by a [PinAssignment].
//! - [Hd44780Display] turns display operations (clear, select line, toggle cursor, write text) into
//!   instructions, and keeps the flags the controller wants OR'ed together in one instruction.
//!
//! R/W is expected to be tied to ground, so the busy flag is never polled and every instruction waits
//! for its worst case execution time instead.
//!
//! ```no_run
//! use charlcd_gpio::delay::StdDelay;
//! use charlcd_gpio::lcd::hd44780::{GpioHd44780Bus, Hd44780Display, PinAssignment};
//! use charlcd_gpio::raw::RawGpioDriver;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gpio = RawGpioDriver::new_gpiomem()?;
//! let pins = PinAssignment::new(14, 15, [16, 17, 18, 19, 20, 21, 22, 26]);
//! let mut lcd = Hd44780Display::new(GpioHd44780Bus::initialize(&gpio, StdDelay, pins)?);
//! lcd.clear()?;
//! lcd.write_string("Hello\nworld")?;
//! # Ok(())
//! # }
//! ```

pub mod driver;
mod display;
mod flags;
pub mod instruction;
pub mod latch;

pub use display::*;
pub use driver::{GpioHd44780Bus, Hd44780Bus, PinAssignment, PinConfigError, PinRole};
pub use flags::*;
