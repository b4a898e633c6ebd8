// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("invalid template ({reason}): {schema}")]
    TemplateParse { schema: String, reason: String },

    #[error("field '{key}' needs {needed} bytes, only {available} left in payload")]
    FieldBounds {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("field '{key}' has unrecognized type marker {literal}")]
    UnknownType { key: String, literal: String },

    #[error("unsupported flag byte width {0} (expected 0, 1, 2, 4 or 8)")]
    InvalidFlagWidth(u64),
}

impl DecodeError {
    pub(crate) fn template(schema: impl Into<String>, reason: impl Into<String>) -> Self {
        DecodeError::TemplateParse {
            schema: schema.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
