// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Template-driven decoder for fixed-layout LoRaWAN uplink payloads.
//!
//! A JSON schema names each field and its type marker; [`Template::parse`]
//! turns it into an ordered field layout once, and [`decode`] walks that
//! layout over the payload bytes to produce a [`DecodedRecord`].

pub mod codec;
pub mod decode;
mod error;
pub mod flags;
pub mod record;
pub mod template;

pub use decode::{decode, decode_with_schema, Decoder, PayloadDecoder};
pub use error::{DecodeError, Result};
pub use flags::{extract_flags, FlagWidth};
pub use record::{DecodedRecord, Value};
pub use template::{
    FieldSpec, FloatWidth, IntWidth, ParseOptions, Template, TypeDescriptor, UnknownTypePolicy,
};
