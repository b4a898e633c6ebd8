// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Little-endian primitive readers used by the template decoder.
//!
//! Fixed-width readers take arrays so the caller does the bounds check once;
//! [`array`] is the checked way to get one out of a slice.

/// Copy the first `N` bytes of `bytes` into an array, or `None` if short.
pub fn array<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
    bytes.get(..N)?.try_into().ok()
}

/// Read a little-endian integer of `width` bytes (1..=8).
///
/// Bytes are accumulated unsigned; with `sign_extend` the result is then
/// interpreted as two's complement at the declared width. Returns `None` for
/// an unsupported width or when `bytes` is shorter than `width`.
pub fn read_int_le(bytes: &[u8], width: usize, sign_extend: bool) -> Option<i64> {
    if width == 0 || width > 8 {
        return None;
    }
    let raw = bytes
        .get(..width)?
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    if sign_extend && width < 8 {
        let shift = 64 - 8 * width as u32;
        Some(((raw << shift) as i64) >> shift)
    } else {
        Some(raw as i64)
    }
}

/// Read a 24-bit little-endian integer; the third byte carries the sign.
pub fn read_int24_le(bytes: [u8; 3]) -> i32 {
    i32::from(bytes[0]) | (i32::from(bytes[1]) << 8) | (i32::from(bytes[2] as i8) << 16)
}

/// Expand an IEEE754 binary16 bit pattern to `f32`.
pub fn f16_bits_to_f32(bits: u16) -> f32 {
    let sign = u32::from(bits >> 15) << 31;
    let exp = u32::from((bits >> 10) & 0x1F);
    let mant = u32::from(bits & 0x3FF);

    let out = match (exp, mant) {
        (0, 0) => sign,
        (0, _) => {
            // Subnormal half: normalize into an f32 normal.
            let mut m = mant;
            let mut shift = 0u32;
            while m & 0x400 == 0 {
                m <<= 1;
                shift += 1;
            }
            sign | ((113 - shift) << 23) | ((m & 0x3FF) << 13)
        }
        (0x1F, 0) => sign | 0x7F80_0000,
        (0x1F, _) => sign | 0x7F80_0000 | (mant << 13),
        _ => sign | ((exp + 112) << 23) | (mant << 13),
    };
    f32::from_bits(out)
}

pub fn read_f16_le(bytes: [u8; 2]) -> f32 {
    f16_bits_to_f32(u16::from_le_bytes(bytes))
}

pub fn read_f32_le(bytes: [u8; 4]) -> f32 {
    f32::from_le_bytes(bytes)
}

pub fn read_f64_le(bytes: [u8; 8]) -> f64 {
    f64::from_le_bytes(bytes)
}

/// Concatenate every non-zero byte, wherever it sits in the slice.
///
/// Each byte becomes the code point of the same value (Latin-1), so the
/// result is always valid UTF-8.
pub fn read_zero_elided_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}
