use crate::lcd::hd44780::driver::Hd44780Bus;
use crate::lcd::hd44780::flags::{BitMode, ControlFlags, FontSize, LineCount, ModeFlags};
use crate::lcd::hd44780::instruction::*;
use crate::{GpioError, GpioResult};
use log::{debug, warn};
use thiserror::Error;

/// Rejected display arguments, kept apart from failures of the pins themselves.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    #[error("DDRAM address {0:#04x} doesn't fit in 7 bits")]
    DdramAddress(u8),
    #[error("CGRAM address {0:#04x} doesn't fit in 6 bits")]
    CgramAddress(u8),
    #[error("glyph slot {0} is out of range, CGRAM holds 8")]
    GlyphSlot(u8),
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
}

/// Direction the address counter moves after each written character.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShiftDirection {
    Left,
    Right,
}

/// A two line HD44780 character display driven over an [Hd44780Bus].
///
/// Owns the display control and function set accumulators. Each toggle updates one bit and sends
/// the whole accumulated instruction, so toggles never reset each other.
///
/// Nothing here reads the display back, so the flags are what was last sent, not what the
/// controller actually has (e.g. after a power glitch).
#[derive(Debug)]
pub struct Hd44780Display<B: Hd44780Bus> {
    bus: B,
    control: ControlFlags,
    mode: ModeFlags,
}

impl<B: Hd44780Bus> Hd44780Display<B> {
    /// Clear display and return home take up to 1.52 ms to execute.
    pub const LONG_INSTRUCTION_WAIT_MS: u32 = 2;

    /// Number of custom characters CGRAM can hold.
    pub const GLYPH_SLOTS: u8 = 8;

    /// Wraps an initialized bus. Nothing is sent, and both accumulators start with every flag off.
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            control: ControlFlags::new(),
            mode: ModeFlags::new(),
        }
    }

    pub fn control_flags(&self) -> ControlFlags {
        self.control
    }

    pub fn mode_flags(&self) -> ModeFlags {
        self.mode
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Clears the display and sets the cursor to the home position.
    pub fn clear(&mut self) -> GpioResult<()> {
        self.bus.send_instruction(CLEAR_DISPLAY)?;
        self.bus.wait_ms(Self::LONG_INSTRUCTION_WAIT_MS);
        Ok(())
    }

    /// Sets the cursor to the home position, leaving the display content alone.
    pub fn return_home(&mut self) -> GpioResult<()> {
        self.bus.send_instruction(RETURN_HOME)?;
        self.bus.wait_ms(Self::LONG_INSTRUCTION_WAIT_MS);
        Ok(())
    }

    pub fn set_write_direction(&mut self, direction: CursorDirection) -> GpioResult<()> {
        self.bus.send_instruction(match direction {
            CursorDirection::Right => WRITE_RIGHT,
            CursorDirection::Left => WRITE_LEFT,
        })
    }

    /// Makes every written character shift the whole display instead of just moving the cursor.
    pub fn set_auto_shift(&mut self, direction: ShiftDirection) -> GpioResult<()> {
        self.bus.send_instruction(match direction {
            ShiftDirection::Left => SHIFT_LEFT,
            ShiftDirection::Right => SHIFT_RIGHT,
        })
    }

    /// Shifts the whole display content by one cell, without touching DDRAM.
    pub fn scroll_display(&mut self, direction: ShiftDirection) -> GpioResult<()> {
        let mut command = CURSOR_SHIFT | DISPLAY_SHIFT;
        if direction == ShiftDirection::Right {
            command |= MOVE_RIGHT;
        }
        self.bus.send_instruction(command)
    }

    /// Moves the cursor to the start of line 1 or 2.
    ///
    /// Any other line number is a no-op: nothing is sent and no error is returned.
    pub fn select_line(&mut self, line: u8) -> GpioResult<()> {
        let address = match line {
            1 => LINE_1_ADDRESS,
            2 => LINE_2_ADDRESS,
            _ => {
                debug!("Ignoring selection of line {}", line);
                return Ok(());
            }
        };
        self.bus.send_instruction(SET_DDRAM | address)
    }

    /// Sets the DDRAM address, i.e. the cursor position.
    ///
    /// # Errors
    /// - [LcdError::DdramAddress] if the address doesn't fit in 7 bits.
    /// - [LcdError::Gpio] if the bus fails.
    pub fn set_ddram_address(&mut self, address: u8) -> Result<(), LcdError> {
        if address > DDRAM_ADDRESS_MASK {
            return Err(LcdError::DdramAddress(address));
        }
        Ok(self.bus.send_instruction(SET_DDRAM | address)?)
    }

    /// Sets the CGRAM address. Following data bytes go to the custom character memory.
    ///
    /// # Errors
    /// - [LcdError::CgramAddress] if the address doesn't fit in 6 bits.
    /// - [LcdError::Gpio] if the bus fails.
    pub fn set_cgram_address(&mut self, address: u8) -> Result<(), LcdError> {
        if address > CGRAM_ADDRESS_MASK {
            return Err(LcdError::CgramAddress(address));
        }
        Ok(self.bus.send_instruction(SET_CGRAM | address)?)
    }

    /// Stores a 5x8 custom character in `slot`, top row first, low 5 bits of each row used.
    /// The character is then printed by writing the byte `slot`.
    ///
    /// Leaves the cursor at the start of line 1, since writing CGRAM loses the DDRAM address.
    ///
    /// # Errors
    /// - [LcdError::GlyphSlot] if `slot` is not below [GLYPH_SLOTS](Self::GLYPH_SLOTS).
    /// - [LcdError::Gpio] if the bus fails.
    pub fn define_glyph(&mut self, slot: u8, rows: [u8; 8]) -> Result<(), LcdError> {
        if slot >= Self::GLYPH_SLOTS {
            return Err(LcdError::GlyphSlot(slot));
        }
        self.set_cgram_address(slot * 8)?;
        for row in rows {
            self.bus.send_data_byte(row & 0b1_1111)?;
        }
        Ok(self.select_line(1)?)
    }

    pub fn set_display(&mut self, on: bool) -> GpioResult<()> {
        self.control.set_display(on);
        self.send_control()
    }

    pub fn set_cursor(&mut self, on: bool) -> GpioResult<()> {
        self.control.set_cursor(on);
        self.send_control()
    }

    pub fn set_cursor_blink(&mut self, on: bool) -> GpioResult<()> {
        self.control.set_blink(on);
        self.send_control()
    }

    /// Only meant for initialization. The bus driver always transfers 8 bits at once, so switching
    /// the controller to 4-bit mode desynchronizes every following transfer.
    pub fn set_bit_mode(&mut self, mode: BitMode) -> GpioResult<()> {
        if mode == BitMode::Four {
            warn!("Switching the controller to 4-bit mode, the 8-bit bus won't be understood");
        }
        self.mode.set_bit_mode(mode);
        self.send_mode()
    }

    /// Only meant for initialization.
    pub fn set_line_count(&mut self, lines: LineCount) -> GpioResult<()> {
        self.mode.set_line_count(lines);
        self.send_mode()
    }

    /// Only meant for initialization.
    pub fn set_font(&mut self, font: FontSize) -> GpioResult<()> {
        self.mode.set_font(font);
        self.send_mode()
    }

    pub fn write_char(&mut self, c: u8) -> GpioResult<()> {
        self.bus.send_data_byte(c)
    }

    /// Writes the bytes of `s` one by one. A newline moves to the start of line 2, there is no
    /// wrapping at the end of a line and no way to get to a third line.
    pub fn write_string(&mut self, s: impl AsRef<[u8]>) -> GpioResult<()> {
        for &c in s.as_ref() {
            if c == b'\n' {
                self.select_line(2)?;
            } else {
                self.write_char(c)?;
            }
        }
        Ok(())
    }

    /// Like [write_string](Self::write_string), but replaces characters outside ASCII with `?`.
    pub fn print(&mut self, s: &str) -> GpioResult<()> {
        for c in s.chars() {
            if c == '\n' {
                self.select_line(2)?;
            } else if c.is_ascii() {
                self.write_char(c as u8)?;
            } else {
                warn!("Non-ASCII character: {}", c);
                self.write_char(b'?')?;
            }
        }
        Ok(())
    }

    fn send_control(&mut self) -> GpioResult<()> {
        debug!("Display control: {:08b}", self.control);
        self.bus.send_instruction(self.control.bits())
    }

    fn send_mode(&mut self) -> GpioResult<()> {
        debug!("Function set: {:08b}", self.mode);
        self.bus.send_instruction(self.mode.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    enum Op {
        Instruction(u8),
        Data(u8),
        Wait(u32),
    }

    #[derive(Debug, Default)]
    struct RecordingBus {
        ops: Vec<Op>,
    }

    impl Hd44780Bus for RecordingBus {
        fn send_instruction(&mut self, instruction: u8) -> GpioResult<()> {
            self.ops.push(Op::Instruction(instruction));
            Ok(())
        }

        fn send_data_byte(&mut self, data: u8) -> GpioResult<()> {
            self.ops.push(Op::Data(data));
            Ok(())
        }

        fn wait_ms(&mut self, ms: u32) {
            self.ops.push(Op::Wait(ms));
        }
    }

    fn display() -> Hd44780Display<RecordingBus> {
        Hd44780Display::new(RecordingBus::default())
    }

    fn ops(display: &Hd44780Display<RecordingBus>) -> &[Op] {
        &display.bus().ops
    }

    #[test]
    fn control_toggles_accumulate() {
        let mut lcd = display();
        lcd.set_cursor(true).unwrap();
        lcd.set_display(false).unwrap();
        lcd.set_cursor_blink(true).unwrap();

        assert_eq!(
            ops(&lcd),
            [Op::Instruction(0x0A), Op::Instruction(0x0A), Op::Instruction(0x0B)]
        );
        assert_eq!(lcd.control_flags().bits(), 0x0B);
    }

    #[test]
    fn turning_one_toggle_off_keeps_the_others() {
        let mut lcd = display();
        lcd.set_display(true).unwrap();
        lcd.set_cursor(true).unwrap();
        lcd.set_cursor_blink(true).unwrap();
        lcd.set_display(false).unwrap();

        assert_eq!(ops(&lcd).last(), Some(&Op::Instruction(0x0B)));

        lcd.set_cursor(false).unwrap();
        assert_eq!(ops(&lcd).last(), Some(&Op::Instruction(0x09)));
    }

    #[test]
    fn mode_toggles_accumulate() {
        let mut lcd = display();
        lcd.set_bit_mode(BitMode::Eight).unwrap();
        lcd.set_line_count(LineCount::Two).unwrap();
        lcd.set_font(FontSize::Dots5x8).unwrap();
        lcd.set_font(FontSize::Dots5x11).unwrap();
        lcd.set_line_count(LineCount::One).unwrap();

        assert_eq!(
            ops(&lcd),
            [
                Op::Instruction(0x30),
                Op::Instruction(0x38),
                Op::Instruction(0x38),
                Op::Instruction(0x3C),
                Op::Instruction(0x34),
            ]
        );
        assert_eq!(lcd.mode_flags().font(), FontSize::Dots5x11);
    }

    #[test]
    fn mode_and_control_are_independent() {
        let mut lcd = display();
        lcd.set_display(true).unwrap();
        lcd.set_bit_mode(BitMode::Eight).unwrap();
        lcd.set_cursor(true).unwrap();

        assert_eq!(
            ops(&lcd),
            [Op::Instruction(0x0C), Op::Instruction(0x30), Op::Instruction(0x0E)]
        );
    }

    #[test]
    fn line_selection() {
        let mut lcd = display();
        lcd.select_line(1).unwrap();
        lcd.select_line(2).unwrap();
        assert_eq!(ops(&lcd), [Op::Instruction(0x80), Op::Instruction(0xC0)]);

        let mut lcd = display();
        lcd.select_line(3).unwrap();
        lcd.select_line(0).unwrap();
        assert!(ops(&lcd).is_empty());
    }

    #[test]
    fn newline_moves_to_second_line() {
        let mut lcd = display();
        lcd.write_string("AB\nCD").unwrap();
        assert_eq!(
            ops(&lcd),
            [
                Op::Data(b'A'),
                Op::Data(b'B'),
                Op::Instruction(0xC0),
                Op::Data(b'C'),
                Op::Data(b'D'),
            ]
        );
    }

    #[test]
    fn long_text_does_not_wrap() {
        let mut lcd = display();
        lcd.write_string([b'x'; 40]).unwrap();
        assert_eq!(ops(&lcd).len(), 40);
        assert!(ops(&lcd).iter().all(|op| *op == Op::Data(b'x')));

        let mut lcd = display();
        lcd.write_string("a\nb\nc").unwrap();
        assert_eq!(
            ops(&lcd).iter().filter(|op| **op == Op::Instruction(0xC0)).count(),
            2
        );
    }

    #[test]
    fn print_replaces_non_ascii() {
        let mut lcd = display();
        lcd.print("é\n1").unwrap();
        assert_eq!(ops(&lcd), [Op::Data(b'?'), Op::Instruction(0xC0), Op::Data(b'1')]);
    }

    #[test]
    fn clear_twice_waits_twice() {
        let mut lcd = display();
        lcd.clear().unwrap();
        let once = ops(&lcd).to_vec();
        lcd.clear().unwrap();

        assert_eq!(once, [Op::Instruction(0x01), Op::Wait(2)]);
        assert_eq!(
            ops(&lcd),
            [Op::Instruction(0x01), Op::Wait(2), Op::Instruction(0x01), Op::Wait(2)]
        );
        assert_eq!(lcd.control_flags(), ControlFlags::new());
        assert_eq!(lcd.mode_flags(), ModeFlags::new());
    }

    #[test]
    fn entry_mode_and_home() {
        let mut lcd = display();
        lcd.return_home().unwrap();
        lcd.set_write_direction(CursorDirection::Right).unwrap();
        lcd.set_write_direction(CursorDirection::Left).unwrap();
        lcd.set_auto_shift(ShiftDirection::Left).unwrap();
        lcd.set_auto_shift(ShiftDirection::Right).unwrap();
        lcd.scroll_display(ShiftDirection::Left).unwrap();
        lcd.scroll_display(ShiftDirection::Right).unwrap();

        assert_eq!(
            ops(&lcd),
            [
                Op::Instruction(0x02),
                Op::Wait(2),
                Op::Instruction(0x06),
                Op::Instruction(0x04),
                Op::Instruction(0x07),
                Op::Instruction(0x05),
                Op::Instruction(0x18),
                Op::Instruction(0x1C),
            ]
        );
    }

    #[test]
    fn addresses_are_range_checked() {
        let mut lcd = display();
        lcd.set_ddram_address(0x4F).unwrap();
        lcd.set_cgram_address(0x3F).unwrap();
        assert_eq!(lcd.set_ddram_address(0x80), Err(LcdError::DdramAddress(0x80)));
        assert_eq!(lcd.set_cgram_address(0x40), Err(LcdError::CgramAddress(0x40)));
        assert_eq!(
            LcdError::DdramAddress(0x80).to_string(),
            "DDRAM address 0x80 doesn't fit in 7 bits"
        );
        assert_eq!(ops(&lcd), [Op::Instruction(0xCF), Op::Instruction(0x7F)]);
    }

    #[test]
    fn glyph_goes_to_its_cgram_slot() {
        let mut lcd = display();
        let heart = [0x00, 0x0A, 0x1F, 0x1F, 0x0E, 0x04, 0x00, 0xFF];
        lcd.define_glyph(2, heart).unwrap();

        let ops = ops(&lcd);
        assert_eq!(ops.len(), 10);
        assert_eq!(ops[0], Op::Instruction(0x40 | 16));
        assert_eq!(ops[3], Op::Data(0x1F));
        assert_eq!(ops[8], Op::Data(0x1F));
        assert_eq!(ops[9], Op::Instruction(0x80));

        let mut lcd = display();
        assert_eq!(lcd.define_glyph(8, heart), Err(LcdError::GlyphSlot(8)));
        assert!(lcd.bus().ops.is_empty());
    }
}
