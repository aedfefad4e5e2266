//! HD44780 instruction set.
//!
//! Every instruction is a single byte sent with RS low. The highest set bit selects the instruction,
//! the bits below it are its parameters.

pub const CLEAR_DISPLAY: u8 = 0b0000_0001;
pub const RETURN_HOME: u8 = 0b0000_0010;

// Entry mode set: 0b0000_01[I/D][S]
pub const WRITE_LEFT: u8 = 0b0000_0100;
pub const WRITE_RIGHT: u8 = 0b0000_0110;
pub const SHIFT_LEFT: u8 = 0b0000_0111;
pub const SHIFT_RIGHT: u8 = 0b0000_0101;

/// Display control, OR'ed with [DISPLAY], [CURSOR] and [BLINK].
pub const DISPLAY_CONTROL: u8 = 0b0000_1000;
pub const DISPLAY: u8 = 0b0000_0100;
pub const CURSOR: u8 = 0b0000_0010;
pub const BLINK: u8 = 0b0000_0001;

/// Cursor or display shift, OR'ed with [DISPLAY_SHIFT] and [MOVE_RIGHT].
pub const CURSOR_SHIFT: u8 = 0b0001_0000;
pub const DISPLAY_SHIFT: u8 = 0b0000_1000;
pub const MOVE_RIGHT: u8 = 0b0000_0100;

/// Function set, OR'ed with [BIT_MODE_8], [LINES_2] and [FONT_5X11].
pub const FUNCTION_SET: u8 = 0b0010_0000;
pub const BIT_MODE_8: u8 = 0b0001_0000;
pub const LINES_2: u8 = 0b0000_1000;
pub const FONT_5X11: u8 = 0b0000_0100;

/// Set CGRAM address, the lower 6 bits are the address.
pub const SET_CGRAM: u8 = 0b0100_0000;
pub const CGRAM_ADDRESS_MASK: u8 = 0b0011_1111;

/// Set DDRAM address, the lower 7 bits are the address.
pub const SET_DDRAM: u8 = 0b1000_0000;
pub const DDRAM_ADDRESS_MASK: u8 = 0b0111_1111;

pub const LINE_1_ADDRESS: u8 = 0x00;
pub const LINE_2_ADDRESS: u8 = 0x40;
