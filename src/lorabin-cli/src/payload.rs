// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Payload text as it arrives from network server webhooks.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::ValueEnum;

use crate::DynResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PayloadEncoding {
    Hex,
    Base64,
}

/// Decode payload text to bytes. Whitespace is ignored, and hex may carry a
/// `0x` prefix.
pub fn parse_payload(text: &str, encoding: PayloadEncoding) -> DynResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    match encoding {
        PayloadEncoding::Hex => {
            let digits = compact
                .strip_prefix("0x")
                .or_else(|| compact.strip_prefix("0X"))
                .unwrap_or(&compact);
            Ok(hex::decode(digits).map_err(|e| format!("Invalid hex payload: {}", e))?)
        }
        PayloadEncoding::Base64 => Ok(STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| format!("Invalid base64 payload: {}", e))?),
    }
}
