use crate::lcd::hd44780::driver::{Hd44780Bus, PinAssignment, PinConfigError};
use crate::{GpioBias, GpioDriver, GpioResult};
use embedded_hal::delay::DelayNs;
use log::{debug, log_enabled, trace, Level};
use std::fmt::{Debug, Formatter};

/// Bit-banged 8-bit HD44780 bus on GPIO pins, write only.
///
/// The busy flag is never read (R/W is tied to ground), so every transfer waits a fixed
/// [SETTLE_TIME_US](Self::SETTLE_TIME_US) after the enable pulse, which covers every instruction
/// except clear display and return home. Those need an additional [wait_ms](Hd44780Bus::wait_ms)
/// by the caller.
///
/// RS is low between transfers. [send_data_byte](Hd44780Bus::send_data_byte) raises it only for
/// the duration of its own transfer, and lowers it again even if the transfer fails.
pub struct GpioHd44780Bus<G: GpioDriver, D: DelayNs> {
    gpio: G,
    delay: D,
    pins: PinAssignment,
}

impl<G: GpioDriver, D: DelayNs> GpioHd44780Bus<G, D> {
    /// Time the data lines get to settle before E rises.
    pub const SETUP_TIME_US: u32 = 2;
    /// Width of the E pulse. The controller needs at least 1200 ns.
    pub const PULSE_WIDTH_US: u32 = 2;
    /// Wait after E falls. Most instructions take 37 us to execute.
    pub const SETTLE_TIME_US: u32 = 100;

    /// Configures all 10 pins as pulled-up outputs driven low, after checking the assignment.
    ///
    /// Nothing is written to the GPIO if the assignment is invalid.
    ///
    /// # Errors
    /// - [PinConfigError::OutOfRange] if a pin doesn't exist on the chip.
    /// - [PinConfigError::Duplicate] if two roles share a pin.
    /// - [PinConfigError::Gpio] if the GPIO backend fails to configure a pin.
    pub fn initialize(gpio: G, delay: D, pins: PinAssignment) -> Result<Self, PinConfigError> {
        pins.validate(gpio.count()?)?;

        for (role, pin) in pins.roles() {
            gpio.set_bias(pin, GpioBias::PullUp)?;
            gpio.set_output(pin)?;
            gpio.write(pin, false)?;
            debug!("{} on GPIO {}", role, pin);
        }

        debug!("HD44780 bus ready on {:?}", gpio);

        Ok(GpioHd44780Bus { gpio, delay, pins })
    }

    pub fn pins(&self) -> &PinAssignment {
        &self.pins
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    /// Gives back the GPIO driver and the delay. The pins stay configured as they are.
    pub fn into_inner(self) -> (G, D) {
        (self.gpio, self.delay)
    }

    /// Latches whatever is on the bus. Must not be interrupted half way, the controller would be
    /// left with an undefined latch state.
    fn pulse_enable(&mut self) -> GpioResult<()> {
        self.delay.delay_us(Self::SETUP_TIME_US);
        self.gpio.write(self.pins.enable, true)?;
        self.delay.delay_us(Self::PULSE_WIDTH_US);
        self.gpio.write(self.pins.enable, false)?;
        self.delay.delay_us(Self::SETTLE_TIME_US);
        Ok(())
    }

    /// Puts `byte` on D0..D7 (bit i on Di) and pulses E. Leaves RS alone.
    fn transfer(&mut self, byte: u8) -> GpioResult<()> {
        for (i, &pin) in self.pins.data.iter().enumerate() {
            self.gpio.write(pin, (byte >> i) & 1 != 0)?;
        }
        self.pulse_enable()?;

        if log_enabled!(Level::Trace) {
            let (rs, byte) = self.read_back()?;
            trace!("Sent {}: {:08b}", if rs { "data" } else { "instruction" }, byte);
        }

        Ok(())
    }

    /// Reads RS and D0..D7 back from the pins as they are driven right now.
    fn read_back(&self) -> GpioResult<(bool, u8)> {
        let rs = self.gpio.read(self.pins.register_select)?;
        let mut byte = 0u8;
        for (i, &pin) in self.pins.data.iter().enumerate() {
            if self.gpio.read(pin)? {
                byte |= 1 << i;
            }
        }
        Ok((rs, byte))
    }
}

impl<G: GpioDriver, D: DelayNs> Debug for GpioHd44780Bus<G, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GpioHd44780Bus({:?}, RS: {}, E: {}, data: {:?})",
            self.gpio, self.pins.register_select, self.pins.enable, self.pins.data
        )
    }
}

impl<G: GpioDriver, D: DelayNs> Hd44780Bus for GpioHd44780Bus<G, D> {
    fn send_instruction(&mut self, instruction: u8) -> GpioResult<()> {
        self.transfer(instruction)
    }

    fn send_data_byte(&mut self, data: u8) -> GpioResult<()> {
        self.gpio.write(self.pins.register_select, true)?;
        let result = self.transfer(data);
        self.gpio.write(self.pins.register_select, false)?;
        result
    }

    fn wait_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
