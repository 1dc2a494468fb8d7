//! PackStream marker byte constants: tiny forms carry their size/value in
//! the low nibble, wider forms are a fixed marker byte followed by a
//! big-endian length.

pub const NULL: u8 = 0xC0;
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;
pub const FLOAT_64: u8 = 0xC1;

pub const INT_8: u8 = 0xC8;
pub const INT_16: u8 = 0xC9;
pub const INT_32: u8 = 0xCA;
pub const INT_64: u8 = 0xCB;

/// Tiny int positive range is the marker byte itself, 0x00..=0x7F.
pub const TINY_INT_POSITIVE_MAX: u8 = 0x7F;
/// Tiny int negative range is the marker byte itself, 0xF0..=0xFF (-16..=-1).
pub const TINY_INT_NEGATIVE_MIN: u8 = 0xF0;

pub const TINY_STRING_BASE: u8 = 0x80;
pub const STRING_8: u8 = 0xD0;
pub const STRING_16: u8 = 0xD1;
pub const STRING_32: u8 = 0xD2;

pub const TINY_LIST_BASE: u8 = 0x90;
pub const LIST_8: u8 = 0xD4;
pub const LIST_16: u8 = 0xD5;
pub const LIST_32: u8 = 0xD6;

pub const TINY_MAP_BASE: u8 = 0xA0;
pub const MAP_8: u8 = 0xD8;
pub const MAP_16: u8 = 0xD9;
pub const MAP_32: u8 = 0xDA;

pub const TINY_STRUCT_BASE: u8 = 0xB0;
pub const STRUCT_8: u8 = 0xDC;
pub const STRUCT_16: u8 = 0xDD;

/// Largest size representable by a tiny-form marker (low nibble).
pub const TINY_MAX: usize = 0x0F;
/// Largest size representable by an 8-bit-length form.
pub const SIZE_8_MAX: usize = u8::MAX as usize;
/// Largest size representable by a 16-bit-length form.
pub const SIZE_16_MAX: usize = u16::MAX as usize;
/// Largest size representable by a 32-bit-length form; there is no
/// STRUCT_32, so this only bounds strings/lists/maps.
pub const SIZE_32_MAX: usize = u32::MAX as usize;
/// Structures have no 32-bit form: STRUCT_16's `size_uint16` is the widest.
pub const STRUCT_SIZE_MAX: usize = u16::MAX as usize;
