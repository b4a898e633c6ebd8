// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Field templates and the JSON schema parser that builds them.
//!
//! A schema maps field names to type markers, either as an object
//! (`{"id": 14, "temp": 14.1, "ok": true}`) or as an array of single-entry
//! objects (`[{"id": 14}, {"temp": 14.1}]`). Declaration order decides byte
//! offsets, so entries are collected straight into a `Vec` while the JSON is
//! being read.
//!
//! Markers:
//! - string: fixed-length text; its integer value is the length, or its own
//!   byte length when it is not a positive integer (`"8"`, `"serialno"`)
//! - integer `11`, `12`, `13`, `14`, `18`: signed int of 1, 2, 3, 4, 8 bytes
//! - number strictly between `N` and `N + 0.2` for `N` in 12, 14, 18, 1:
//!   float16, float32, float64, float64 (`12.1`, `14.1`, `18.1`, `1.1`)
//! - `true` / `false`: a bit in the trailing flag region

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::{DecodeError, Result};
use crate::flags::FlagWidth;

/// Byte width of an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    One,
    Two,
    Three,
    Four,
    Eight,
}

impl IntWidth {
    /// Map a schema integer code to a width.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            11 => Some(IntWidth::One),
            12 => Some(IntWidth::Two),
            13 => Some(IntWidth::Three),
            14 => Some(IntWidth::Four),
            18 => Some(IntWidth::Eight),
            _ => None,
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            IntWidth::One => 1,
            IntWidth::Two => 2,
            IntWidth::Three => 3,
            IntWidth::Four => 4,
            IntWidth::Eight => 8,
        }
    }
}

/// Byte width of a floating point field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    Half,
    Single,
    Double,
}

const FLOAT_MARKERS: [(f64, FloatWidth); 4] = [
    (12.0, FloatWidth::Half),
    (14.0, FloatWidth::Single),
    (18.0, FloatWidth::Double),
    (1.0, FloatWidth::Double),
];

impl FloatWidth {
    /// Map a schema float marker to a width.
    ///
    /// A marker matches base `N` when it lies strictly between `N` and
    /// `N + 0.2`. Values near either edge (`12.0`, `12.2`) match nothing.
    pub fn from_marker(marker: f64) -> Option<Self> {
        FLOAT_MARKERS
            .iter()
            .find(|(base, _)| marker > *base && marker < *base + 0.2)
            .map(|(_, width)| *width)
    }

    pub fn bytes(self) -> usize {
        match self {
            FloatWidth::Half => 2,
            FloatWidth::Single => 4,
            FloatWidth::Double => 8,
        }
    }
}

/// Decoded shape of one template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDescriptor {
    FixedString(usize),
    Integer(IntWidth),
    Float(FloatWidth),
    Boolean,
}

impl TypeDescriptor {
    /// Infer a type from a schema marker, or `None` if it is not one.
    pub fn infer(marker: &JsonValue) -> Option<Self> {
        match marker {
            JsonValue::String(s) => {
                let len = s
                    .parse::<i64>()
                    .ok()
                    .filter(|&n| n > 0)
                    .and_then(|n| usize::try_from(n).ok())
                    .unwrap_or(s.len());
                Some(TypeDescriptor::FixedString(len))
            }
            JsonValue::Number(n) => match n.as_i64() {
                Some(code) => IntWidth::from_code(code).map(TypeDescriptor::Integer),
                None if n.is_f64() => n
                    .as_f64()
                    .and_then(FloatWidth::from_marker)
                    .map(TypeDescriptor::Float),
                None => None,
            },
            JsonValue::Bool(_) => Some(TypeDescriptor::Boolean),
            _ => None,
        }
    }

    /// Payload bytes consumed from the main region (0 for booleans).
    pub fn byte_width(self) -> usize {
        match self {
            TypeDescriptor::FixedString(len) => len,
            TypeDescriptor::Integer(w) => w.bytes(),
            TypeDescriptor::Float(w) => w.bytes(),
            TypeDescriptor::Boolean => 0,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::FixedString(len) => write!(f, "string({})", len),
            TypeDescriptor::Integer(w) => write!(f, "int{}", w.bytes() * 8),
            TypeDescriptor::Float(w) => write!(f, "float{}", w.bytes() * 8),
            TypeDescriptor::Boolean => f.write_str("bool"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: String,
    pub kind: TypeDescriptor,
}

impl FieldSpec {
    pub fn new(key: impl Into<String>, kind: TypeDescriptor) -> Self {
        Self {
            key: key.into(),
            kind,
        }
    }
}

/// What to do with a schema entry whose marker matches no known type.
///
/// The default is [`UnknownTypePolicy::Lenient`]: the entry is dropped from
/// the template with a warning, so it never appears in decoded records and
/// consumes no payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTypePolicy {
    /// Fail with [`DecodeError::UnknownType`].
    Strict,
    /// Skip the entry and keep going.
    #[default]
    Lenient,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub flag_width: FlagWidth,
    pub unknown_types: UnknownTypePolicy,
}

/// Ordered field layout for one payload format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    fields: Vec<FieldSpec>,
    flag_width: FlagWidth,
}

impl Template {
    pub fn new(fields: Vec<FieldSpec>, flag_width: FlagWidth) -> Self {
        Self { fields, flag_width }
    }

    /// Parse a JSON schema, keeping the order fields are declared in.
    pub fn parse(schema: &str, options: &ParseOptions) -> Result<Self> {
        let entries: OrderedEntries = serde_json::from_str(schema)
            .map_err(|e| DecodeError::template(schema, e.to_string()))?;

        let mut seen = HashSet::with_capacity(entries.0.len());
        let mut fields = Vec::with_capacity(entries.0.len());
        for (key, marker) in entries.0 {
            if !seen.insert(key.clone()) {
                return Err(DecodeError::template(
                    schema,
                    format!("duplicate field '{}'", key),
                ));
            }
            match TypeDescriptor::infer(&marker) {
                Some(kind) => fields.push(FieldSpec { key, kind }),
                None => match options.unknown_types {
                    UnknownTypePolicy::Strict => {
                        return Err(DecodeError::UnknownType {
                            key,
                            literal: marker.to_string(),
                        });
                    }
                    UnknownTypePolicy::Lenient => {
                        warn!("Skipping template field '{}': unknown type {}", key, marker);
                    }
                },
            }
        }

        let total = fields
            .iter()
            .try_fold(options.flag_width.bytes(), |acc, f| {
                acc.checked_add(f.kind.byte_width())
            });
        if total.is_none() {
            return Err(DecodeError::template(schema, "template width overflows"));
        }

        let template = Self::new(fields, options.flag_width);
        let booleans = template.boolean_count();
        if booleans > template.flag_width.bits() {
            warn!(
                "Template has {} boolean fields but only {} flag bits",
                booleans,
                template.flag_width.bits()
            );
        }
        debug!(
            "Parsed template: {} fields, {} payload bytes, {} flag bytes",
            template.fields.len(),
            template.payload_width(),
            template.flag_width
        );
        Ok(template)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn flag_width(&self) -> FlagWidth {
        self.flag_width
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total bytes consumed by non-boolean fields.
    pub fn payload_width(&self) -> usize {
        self.fields.iter().map(|f| f.kind.byte_width()).sum()
    }

    /// Shortest payload that decodes without a bounds error.
    pub fn min_payload_len(&self) -> usize {
        self.payload_width() + self.flag_width.bytes()
    }

    pub fn boolean_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.kind == TypeDescriptor::Boolean)
            .count()
    }

    /// Byte offset of every field in the main region, in declaration order.
    /// Booleans report the offset the cursor is at when they are read.
    pub fn offsets(&self) -> Vec<(&str, usize)> {
        let mut cursor = 0;
        self.fields
            .iter()
            .map(|f| {
                let at = cursor;
                cursor += f.kind.byte_width();
                (f.key.as_str(), at)
            })
            .collect()
    }
}

/// Schema entries in source order.
struct OrderedEntries(Vec<(String, JsonValue)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(EntriesVisitor)
    }
}

struct EntriesVisitor;

impl<'de> Visitor<'de> for EntriesVisitor {
    type Value = OrderedEntries;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object or an array of single-field objects")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, JsonValue>()? {
            entries.push(entry);
        }
        Ok(OrderedEntries(entries))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(SingleEntry(key, marker)) = seq.next_element()? {
            entries.push((key, marker));
        }
        Ok(OrderedEntries(entries))
    }
}

/// One `{"name": marker}` element of an array schema.
struct SingleEntry(String, JsonValue);

impl<'de> Deserialize<'de> for SingleEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SingleEntryVisitor;

        impl<'de> Visitor<'de> for SingleEntryVisitor {
            type Value = SingleEntry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object with exactly one field")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let Some((key, marker)) = map.next_entry::<String, JsonValue>()? else {
                    return Err(de::Error::invalid_length(0, &self));
                };
                if map.next_key::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(2, &self));
                }
                Ok(SingleEntry(key, marker))
            }
        }

        deserializer.deserialize_map(SingleEntryVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(schema: &str) -> Result<Template> {
        Template::parse(schema, &ParseOptions::default())
    }

    fn kinds(template: &Template) -> Vec<(&str, TypeDescriptor)> {
        template
            .fields()
            .iter()
            .map(|f| (f.key.as_str(), f.kind))
            .collect()
    }

    #[test]
    fn test_string_markers() {
        assert_eq!(
            TypeDescriptor::infer(&json!("8")),
            Some(TypeDescriptor::FixedString(8))
        );
        // Not a positive integer: the marker's own length is the width.
        assert_eq!(
            TypeDescriptor::infer(&json!("serialno")),
            Some(TypeDescriptor::FixedString(8))
        );
        assert_eq!(
            TypeDescriptor::infer(&json!("0")),
            Some(TypeDescriptor::FixedString(1))
        );
        assert_eq!(
            TypeDescriptor::infer(&json!("-12")),
            Some(TypeDescriptor::FixedString(3))
        );
        assert_eq!(
            TypeDescriptor::infer(&json!("")),
            Some(TypeDescriptor::FixedString(0))
        );
    }

    #[test]
    fn test_integer_codes() {
        let cases = [
            (11, IntWidth::One),
            (12, IntWidth::Two),
            (13, IntWidth::Three),
            (14, IntWidth::Four),
            (18, IntWidth::Eight),
        ];
        for (code, width) in cases {
            assert_eq!(
                TypeDescriptor::infer(&json!(code)),
                Some(TypeDescriptor::Integer(width))
            );
        }
        for code in [10, 15, 16, 17, 19, 1, 0, -14] {
            assert_eq!(TypeDescriptor::infer(&json!(code)), None, "code {}", code);
        }
    }

    #[test]
    fn test_float_markers() {
        assert_eq!(
            TypeDescriptor::infer(&json!(12.1)),
            Some(TypeDescriptor::Float(FloatWidth::Half))
        );
        assert_eq!(
            TypeDescriptor::infer(&json!(14.1)),
            Some(TypeDescriptor::Float(FloatWidth::Single))
        );
        assert_eq!(
            TypeDescriptor::infer(&json!(18.1)),
            Some(TypeDescriptor::Float(FloatWidth::Double))
        );
        assert_eq!(
            TypeDescriptor::infer(&json!(1.1)),
            Some(TypeDescriptor::Float(FloatWidth::Double))
        );
        assert_eq!(
            TypeDescriptor::infer(&json!(14.19)),
            Some(TypeDescriptor::Float(FloatWidth::Single))
        );
    }

    #[test]
    fn test_float_marker_edges() {
        assert_eq!(FloatWidth::from_marker(12.0), None);
        assert_eq!(FloatWidth::from_marker(12.2), None);
        assert_eq!(FloatWidth::from_marker(13.1), None);
        assert_eq!(FloatWidth::from_marker(12.000001), Some(FloatWidth::Half));
        // A float literal equal to an integer code is not an integer marker.
        assert_eq!(TypeDescriptor::infer(&json!(14.0)), None);
    }

    #[test]
    fn test_boolean_and_unknown_markers() {
        assert_eq!(
            TypeDescriptor::infer(&json!(true)),
            Some(TypeDescriptor::Boolean)
        );
        assert_eq!(
            TypeDescriptor::infer(&json!(false)),
            Some(TypeDescriptor::Boolean)
        );
        assert_eq!(TypeDescriptor::infer(&json!(null)), None);
        assert_eq!(TypeDescriptor::infer(&json!([14])), None);
        assert_eq!(TypeDescriptor::infer(&json!({"a": 14})), None);
    }

    #[test]
    fn test_object_keeps_declaration_order() {
        let template = parse(r#"{"zulu": 14, "alpha": "4", "mike": true, "bravo": 12.1}"#).unwrap();
        assert_eq!(
            kinds(&template),
            vec![
                ("zulu", TypeDescriptor::Integer(IntWidth::Four)),
                ("alpha", TypeDescriptor::FixedString(4)),
                ("mike", TypeDescriptor::Boolean),
                ("bravo", TypeDescriptor::Float(FloatWidth::Half)),
            ]
        );
    }

    #[test]
    fn test_array_form_matches_object_form() {
        let object = parse(r#"{"id": 14, "temp": 14.1, "ok": true}"#).unwrap();
        let array = parse(r#"[{"id": 14}, {"temp": 14.1}, {"ok": true}]"#).unwrap();
        assert_eq!(object, array);
    }

    #[test]
    fn test_widths() {
        let options = ParseOptions {
            flag_width: FlagWidth::Two,
            ..Default::default()
        };
        let template =
            Template::parse(r#"{"sn": "6", "v": 13, "t": 12.1, "a": true, "b": false}"#, &options)
                .unwrap();
        assert_eq!(template.payload_width(), 11);
        assert_eq!(template.min_payload_len(), 13);
        assert_eq!(template.boolean_count(), 2);
        assert_eq!(
            template.offsets(),
            vec![("sn", 0), ("v", 6), ("t", 9), ("a", 11), ("b", 11)]
        );
    }

    #[test]
    fn test_lenient_skips_unknown() {
        let template = parse(r#"{"a": 11, "junk": 99, "n": null, "b": 12}"#).unwrap();
        assert_eq!(
            kinds(&template),
            vec![
                ("a", TypeDescriptor::Integer(IntWidth::One)),
                ("b", TypeDescriptor::Integer(IntWidth::Two)),
            ]
        );
    }

    #[test]
    fn test_strict_rejects_unknown() {
        let options = ParseOptions {
            unknown_types: UnknownTypePolicy::Strict,
            ..Default::default()
        };
        let err = Template::parse(r#"{"a": 11, "junk": 99}"#, &options).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownType {
                key: "junk".to_string(),
                literal: "99".to_string(),
            }
        );
    }

    #[test]
    fn test_malformed_schema() {
        for schema in [
            "",
            "{",
            "14",
            r#""id""#,
            r#"[{"a": 11, "b": 12}]"#,
            r#"[{}]"#,
            r#"[14]"#,
        ] {
            match parse(schema) {
                Err(DecodeError::TemplateParse { schema: s, .. }) => assert_eq!(s, schema),
                other => panic!("expected parse error for {:?}, got {:?}", schema, other),
            }
        }
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let err = parse(r#"{"a": 11, "a": 12}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate field 'a'"));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_oversized_string_widths_rejected() {
        let huge = r#"{"a":"9223372036854775807","b":"9223372036854775807","c":"9223372036854775807"}"#;
        match parse(huge) {
            Err(DecodeError::TemplateParse { reason, .. }) => {
                assert_eq!(reason, "template width overflows")
            }
            other => panic!("expected width overflow, got {:?}", other),
        }

        // Two fit on their own; the flag region pushes them over.
        let pair = r#"{"a":"9223372036854775807","b":"9223372036854775807"}"#;
        let template = parse(pair).unwrap();
        assert_eq!(template.payload_width(), usize::MAX - 1);
        assert_eq!(template.offsets()[1], ("b", 9_223_372_036_854_775_807));
        let options = ParseOptions {
            flag_width: FlagWidth::Eight,
            ..Default::default()
        };
        assert!(Template::parse(pair, &options).is_err());
    }

    #[test]
    fn test_empty_schema() {
        assert!(parse("{}").unwrap().is_empty());
        assert!(parse("[]").unwrap().is_empty());
    }
}
