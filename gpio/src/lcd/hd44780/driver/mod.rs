//! HD44780 bus driver.
//!
//! See [Hd44780Bus] for the interface the [display](crate::lcd::hd44780::Hd44780Display) is written
//! against, and [GpioHd44780Bus] for the bit-banged 8-bit implementation on plain GPIO pins.

mod gpio;

use crate::{GpioError, GpioResult};
pub use gpio::*;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use thiserror::Error;

/// Byte level access to an HD44780 controller, write only.
///
/// Implementations own the pins and the timing. Bytes are only ever interpreted by the register-select
/// level they're sent with, which is why there's a separate method for each.
pub trait Hd44780Bus: Debug {
    /// Sends an instruction byte (RS low).
    fn send_instruction(&mut self, instruction: u8) -> GpioResult<()>;

    /// Sends a data byte (RS high) to DDRAM or CGRAM, whichever was addressed last.
    fn send_data_byte(&mut self, data: u8) -> GpioResult<()>;

    /// Blocks for the given number of milliseconds, for instructions that need longer than the
    /// settling time every transfer already includes.
    fn wait_ms(&mut self, ms: u32);
}

impl<B: Hd44780Bus + ?Sized> Hd44780Bus for &mut B {
    fn send_instruction(&mut self, instruction: u8) -> GpioResult<()> {
        (**self).send_instruction(instruction)
    }

    fn send_data_byte(&mut self, data: u8) -> GpioResult<()> {
        (**self).send_data_byte(data)
    }

    fn wait_ms(&mut self, ms: u32) {
        (**self).wait_ms(ms)
    }
}

/// The signal lines of the parallel interface. R/W is expected to be tied to ground.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PinRole {
    RegisterSelect,
    Enable,
    /// Data line D0..D7.
    Data(u8),
}

impl Display for PinRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PinRole::RegisterSelect => write!(f, "RS"),
            PinRole::Enable => write!(f, "E"),
            PinRole::Data(i) => write!(f, "D{}", i),
        }
    }
}

/// Which GPIO pin carries which signal.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PinAssignment {
    pub register_select: usize,
    pub enable: usize,
    /// D0 first.
    pub data: [usize; 8],
}

impl PinAssignment {
    pub fn new(register_select: usize, enable: usize, data: [usize; 8]) -> Self {
        Self { register_select, enable, data }
    }

    /// All 10 roles with their pins, control lines first.
    pub fn roles(&self) -> impl Iterator<Item = (PinRole, usize)> + '_ {
        [
            (PinRole::RegisterSelect, self.register_select),
            (PinRole::Enable, self.enable),
        ]
        .into_iter()
        .chain(self.data.iter().enumerate().map(|(i, &pin)| (PinRole::Data(i as u8), pin)))
    }

    /// Checks that every pin exists on a chip with `pin_count` pins and that no pin has two roles.
    pub fn validate(&self, pin_count: usize) -> Result<(), PinConfigError> {
        let roles = self.roles().collect::<Vec<_>>();

        for (i, &(role, pin)) in roles.iter().enumerate() {
            if pin >= pin_count {
                return Err(PinConfigError::OutOfRange { role, pin, count: pin_count });
            }
            if let Some(&(first, _)) = roles[..i].iter().find(|(_, other)| *other == pin) {
                return Err(PinConfigError::Duplicate { pin, first, second: role });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum PinConfigError {
    #[error("pin {pin} for {role} is out of range, the chip has {count} pins")]
    OutOfRange { role: PinRole, pin: usize, count: usize },
    #[error("pin {pin} is assigned to both {first} and {second}")]
    Duplicate { pin: usize, first: PinRole, second: PinRole },
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_pins() -> PinAssignment {
        PinAssignment::new(14, 15, [16, 17, 18, 19, 20, 21, 22, 26])
    }

    #[test]
    fn roles_are_listed_control_lines_first() {
        let roles = reference_pins().roles().collect::<Vec<_>>();
        assert_eq!(roles.len(), 10);
        assert_eq!(roles[0], (PinRole::RegisterSelect, 14));
        assert_eq!(roles[1], (PinRole::Enable, 15));
        assert_eq!(roles[9], (PinRole::Data(7), 26));
    }

    #[test]
    fn valid_assignment_passes() {
        assert_eq!(reference_pins().validate(58), Ok(()));
    }

    #[test]
    fn duplicate_pin_is_rejected() {
        let mut pins = reference_pins();
        pins.data[5] = 15;
        assert_eq!(
            pins.validate(58),
            Err(PinConfigError::Duplicate {
                pin: 15,
                first: PinRole::Enable,
                second: PinRole::Data(5),
            })
        );
    }

    #[test]
    fn out_of_range_pin_is_rejected() {
        let err = reference_pins().validate(26).unwrap_err();
        assert_eq!(err, PinConfigError::OutOfRange { role: PinRole::Data(7), pin: 26, count: 26 });
        assert_eq!(err.to_string(), "pin 26 for D7 is out of range, the chip has 26 pins");
    }

    #[test]
    fn roles_cover_every_pin() {
        let pins = PinAssignment {
            register_select: 1,
            enable: 2,
            data: [3, 4, 5, 6, 7, 8, 9, 10],
        };
        assert_eq!(pins.roles().map(|(_, pin)| pin).sum::<usize>(), 55);
        assert_eq!(PinRole::Data(3).to_string(), "D3");
        assert_eq!(PinRole::RegisterSelect.to_string(), "RS");
    }
}
