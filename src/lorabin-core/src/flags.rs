// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Trailing flag region that packs boolean fields as individual bits.

use std::fmt;

use crate::codec::read_int_le;
use crate::error::DecodeError;

/// Width of the trailing flag region, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagWidth {
    #[default]
    None,
    One,
    Two,
    Four,
    Eight,
}

impl FlagWidth {
    pub fn bytes(self) -> usize {
        match self {
            FlagWidth::None => 0,
            FlagWidth::One => 1,
            FlagWidth::Two => 2,
            FlagWidth::Four => 4,
            FlagWidth::Eight => 8,
        }
    }

    pub fn bits(self) -> usize {
        self.bytes() * 8
    }
}

impl TryFrom<u64> for FlagWidth {
    type Error = DecodeError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FlagWidth::None),
            1 => Ok(FlagWidth::One),
            2 => Ok(FlagWidth::Two),
            4 => Ok(FlagWidth::Four),
            8 => Ok(FlagWidth::Eight),
            other => Err(DecodeError::InvalidFlagWidth(other)),
        }
    }
}

impl fmt::Display for FlagWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

/// Read the last `width` bytes of `payload` as a signed little-endian integer.
///
/// Returns 0 when there is no flag region or the payload is too short to
/// hold one.
pub fn extract_flags(payload: &[u8], width: FlagWidth) -> i64 {
    let n = width.bytes();
    if n == 0 || payload.len() < n {
        return 0;
    }
    read_int_le(&payload[payload.len() - n..], n, true).unwrap_or(0)
}

/// The part of `payload` that non-boolean fields are read from.
pub fn main_region(payload: &[u8], width: FlagWidth) -> &[u8] {
    &payload[..payload.len().saturating_sub(width.bytes())]
}

/// Bit source for boolean fields, consumed low bit first.
#[derive(Debug, Clone, Copy)]
pub struct FlagBits {
    value: i64,
}

impl FlagBits {
    pub fn new(value: i64) -> Self {
        Self { value }
    }

    pub fn from_payload(payload: &[u8], width: FlagWidth) -> Self {
        Self::new(extract_flags(payload, width))
    }

    /// Take the lowest remaining bit. The shift is arithmetic, so once the
    /// region is exhausted further takes repeat its sign bit.
    pub fn take(&mut self) -> bool {
        let bit = self.value & 1 != 0;
        self.value >>= 1;
        bit
    }
}
