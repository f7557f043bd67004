//! RGB to luma conversion.
//!
//! Uses ITU-R BT.601 weights in 14-bit fixed point, rounded to nearest.
//! These are the same integer coefficients common vision libraries use
//! for their RGB to gray conversion, so snapshots match what users get
//! from those tools.

const SHIFT: u32 = 14;
const ROUND: u32 = 1 << (SHIFT - 1);

const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;

/// Converts one RGB pixel to its luma value.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = R_WEIGHT * r as u32 + G_WEIGHT * g as u32 + B_WEIGHT * b as u32;
    // Weights sum to 1 << SHIFT, so the result never exceeds 255.
    ((y + ROUND) >> SHIFT) as u8
}

/// Converts interleaved RGB8 bytes to one luma sample per pixel.
///
/// A trailing partial pixel is dropped.
pub fn rgb_to_luma(rgb: &[u8]) -> Vec<u8> {
    rgb.chunks_exact(3)
        .map(|px| luma(px[0], px[1], px[2]))
        .collect()
}
