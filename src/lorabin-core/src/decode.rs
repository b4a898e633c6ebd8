// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tracing::debug;

use crate::codec::{
    array, read_f16_le, read_f32_le, read_f64_le, read_int24_le, read_int_le,
    read_zero_elided_string,
};
use crate::error::{DecodeError, Result};
use crate::flags::{main_region, FlagBits};
use crate::record::{DecodedRecord, Value};
use crate::template::{FloatWidth, IntWidth, ParseOptions, Template, TypeDescriptor};

/// Trait for decoding binary payload formats into records.
pub trait PayloadDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedRecord>;
}

/// Decode `payload` field by field in template order.
///
/// Non-boolean fields are read left to right from the start of the payload,
/// stopping short of the trailing flag region. Booleans take successive bits
/// of the flag value and consume no bytes.
pub fn decode(payload: &[u8], template: &Template) -> Result<DecodedRecord> {
    let mut flags = FlagBits::from_payload(payload, template.flag_width());
    let body = main_region(payload, template.flag_width());
    let mut cursor = 0usize;
    let mut record = DecodedRecord::with_capacity(template.len());

    for field in template.fields() {
        let value = match field.kind {
            TypeDescriptor::Boolean => Value::Bool(flags.take()),
            kind => {
                let needed = kind.byte_width();
                let out_of_bounds = || DecodeError::FieldBounds {
                    key: field.key.clone(),
                    needed,
                    available: body.len().saturating_sub(cursor),
                };
                let bytes = body
                    .get(cursor..)
                    .and_then(|rest| rest.get(..needed))
                    .ok_or_else(out_of_bounds)?;
                let value = read_value(kind, bytes).ok_or_else(out_of_bounds)?;
                cursor += needed;
                value
            }
        };
        record.push(field.key.as_str(), value);
    }

    debug!(
        "Decoded {} fields from {} byte payload ({} bytes used)",
        record.len(),
        payload.len(),
        cursor + template.flag_width().bytes()
    );
    Ok(record)
}

/// Parse `schema` and decode `payload` with it in one step.
pub fn decode_with_schema(
    payload: &[u8],
    schema: &str,
    options: &ParseOptions,
) -> Result<DecodedRecord> {
    let template = Template::parse(schema, options)?;
    decode(payload, &template)
}

fn read_value(kind: TypeDescriptor, bytes: &[u8]) -> Option<Value> {
    let value = match kind {
        TypeDescriptor::FixedString(_) => Value::Str(read_zero_elided_string(bytes)),
        TypeDescriptor::Integer(IntWidth::Three) => {
            Value::Int(i64::from(read_int24_le(array(bytes)?)))
        }
        TypeDescriptor::Integer(width) => Value::Int(read_int_le(bytes, width.bytes(), true)?),
        TypeDescriptor::Float(FloatWidth::Half) => {
            Value::Float(f64::from(read_f16_le(array(bytes)?)))
        }
        TypeDescriptor::Float(FloatWidth::Single) => {
            Value::Float(f64::from(read_f32_le(array(bytes)?)))
        }
        TypeDescriptor::Float(FloatWidth::Double) => Value::Float(read_f64_le(array(bytes)?)),
        TypeDescriptor::Boolean => return None,
    };
    Some(value)
}

/// A parsed template ready to decode payloads.
#[derive(Debug, Clone)]
pub struct Decoder {
    template: Template,
}

impl Decoder {
    pub fn new(template: Template) -> Self {
        Self { template }
    }

    pub fn from_schema(schema: &str, options: &ParseOptions) -> Result<Self> {
        Template::parse(schema, options).map(Self::new)
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

impl PayloadDecoder for Decoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedRecord> {
        decode(bytes, &self.template)
    }
}
