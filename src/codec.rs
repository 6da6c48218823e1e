//! Numeric codec for raw 16-bit register values
//!
//! Pure conversion helpers shared by the expression evaluator and the
//! derivations. Inputs are raw Modbus holding-register values as read from
//! the controller; none of these functions can fail for valid input.

/// Low byte of a register value.
pub fn lsb(value: u16) -> u16 {
    value & 0x00FF
}

/// High byte of a register value.
pub fn msb(value: u16) -> u16 {
    value >> 8
}

/// Extract the inclusive bit range `[lo, hi]` of a register value.
///
/// `hi` and `lo` must be in `0..=15` with `hi >= lo`; a single bit is
/// `bits(v, n, n)`.
pub fn bits(value: u16, hi: u8, lo: u8) -> u16 {
    debug_assert!(hi <= 15 && lo <= hi, "bit range [{lo}, {hi}] out of bounds");
    let width = u32::from(hi - lo) + 1;
    let mask = ((1u32 << width) - 1) as u16;
    (value >> lo) & mask
}

/// Reinterpret a register value as a two's-complement signed integer.
pub fn to_signed16(value: u16) -> i16 {
    value as i16
}

/// Combine the high and low words of a 32-bit counter split across two registers.
pub fn compose32(hi: u16, lo: u16) -> u32 {
    (u32::from(hi) << 16) + u32::from(lo)
}

/// Round half away from zero to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: u8) -> f64 {
    let factor = 10f64.powi(i32::from(decimals));
    let rounded = (value * factor).round() / factor;
    // Normalise -0.0 so that idle readings serialise as 0.0
    if rounded == 0.0 { 0.0 } else { rounded }
}
