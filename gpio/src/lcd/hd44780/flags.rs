use crate::lcd::hd44780::instruction::{
    BIT_MODE_8, BLINK, CURSOR, DISPLAY, DISPLAY_CONTROL, FONT_5X11, FUNCTION_SET, LINES_2,
};
use std::fmt::{Binary, Formatter};

/// Accumulated display control instruction: display, cursor and blink on/off.
///
/// The controller takes all three toggles in one byte, so changing one of them means resending the
/// other two as they were. The value always carries the [DISPLAY_CONTROL] bit and is ready to be sent.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControlFlags(u8);

impl ControlFlags {
    pub const fn new() -> Self {
        ControlFlags(DISPLAY_CONTROL)
    }

    pub fn set_display(&mut self, on: bool) {
        self.set_bit(DISPLAY, on);
    }

    pub fn set_cursor(&mut self, on: bool) {
        self.set_bit(CURSOR, on);
    }

    pub fn set_blink(&mut self, on: bool) {
        self.set_bit(BLINK, on);
    }

    pub fn display(&self) -> bool {
        self.0 & DISPLAY != 0
    }

    pub fn cursor(&self) -> bool {
        self.0 & CURSOR != 0
    }

    pub fn blink(&self) -> bool {
        self.0 & BLINK != 0
    }

    /// The instruction byte to send.
    pub fn bits(&self) -> u8 {
        self.0
    }

    fn set_bit(&mut self, bit: u8, on: bool) {
        self.0 = with_bit(self.0, bit, on);
    }
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl Binary for ControlFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Binary::fmt(&self.0, f)
    }
}

/// Width of the data bus the controller expects.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum BitMode {
    Four,
    #[default]
    Eight,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum LineCount {
    One,
    #[default]
    Two,
}

/// Character cell size in dots.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum FontSize {
    #[default]
    Dots5x8,
    Dots5x11,
}

/// Accumulated function set instruction: bus width, line count and font.
///
/// Same accumulation rules as [ControlFlags]. Only meant to change while the display is being
/// initialized, since the bus width can't be switched under a running transfer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ModeFlags(u8);

impl ModeFlags {
    pub const fn new() -> Self {
        ModeFlags(FUNCTION_SET)
    }

    pub fn set_bit_mode(&mut self, mode: BitMode) {
        self.0 = with_bit(self.0, BIT_MODE_8, mode == BitMode::Eight);
    }

    pub fn set_line_count(&mut self, lines: LineCount) {
        self.0 = with_bit(self.0, LINES_2, lines == LineCount::Two);
    }

    pub fn set_font(&mut self, font: FontSize) {
        self.0 = with_bit(self.0, FONT_5X11, font == FontSize::Dots5x11);
    }

    pub fn bit_mode(&self) -> BitMode {
        if self.0 & BIT_MODE_8 != 0 { BitMode::Eight } else { BitMode::Four }
    }

    pub fn line_count(&self) -> LineCount {
        if self.0 & LINES_2 != 0 { LineCount::Two } else { LineCount::One }
    }

    pub fn font(&self) -> FontSize {
        if self.0 & FONT_5X11 != 0 { FontSize::Dots5x11 } else { FontSize::Dots5x8 }
    }

    /// The instruction byte to send.
    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl Default for ModeFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl Binary for ModeFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Binary::fmt(&self.0, f)
    }
}

fn with_bit(value: u8, bit: u8, on: bool) -> u8 {
    if on { value | bit } else { value & !bit }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_flags_start_with_everything_off() {
        let flags = ControlFlags::new();
        assert_eq!(flags.bits(), 0x08);
        assert!(!flags.display() && !flags.cursor() && !flags.blink());
    }

    #[test]
    fn clearing_one_bit_keeps_siblings() {
        let mut flags = ControlFlags::new();
        flags.set_display(true);
        flags.set_cursor(true);
        flags.set_blink(true);
        assert_eq!(flags.bits(), 0x0F);

        flags.set_cursor(false);
        assert_eq!(flags.bits(), 0x0D);
        assert!(flags.display());
        assert!(flags.blink());

        let mut mode = ModeFlags::new();
        mode.set_bit_mode(BitMode::Eight);
        mode.set_line_count(LineCount::Two);
        mode.set_font(FontSize::Dots5x11);
        mode.set_line_count(LineCount::One);
        assert_eq!(mode.bits(), 0x20 | 0x10 | 0x04);
    }

    #[test]
    fn setting_a_bit_twice_is_stable() {
        let mut flags = ControlFlags::new();
        flags.set_blink(true);
        flags.set_blink(true);
        assert_eq!(flags.bits(), 0x09);
        flags.set_blink(false);
        flags.set_blink(false);
        assert_eq!(flags.bits(), 0x08);
    }

    #[test]
    fn mode_flags_round_trip_through_getters() {
        let mut mode = ModeFlags::new();
        assert_eq!(mode.bits(), 0x20);
        assert_eq!(mode.bit_mode(), BitMode::Four);
        assert_eq!(mode.line_count(), LineCount::One);
        assert_eq!(mode.font(), FontSize::Dots5x8);

        mode.set_bit_mode(BitMode::Eight);
        mode.set_line_count(LineCount::Two);
        assert_eq!(mode.bits(), 0x38);
        assert_eq!(mode.bit_mode(), BitMode::Eight);
        assert_eq!(mode.line_count(), LineCount::Two);
        assert_eq!(format!("{:08b}", mode), "00111000");
    }
}
