// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Metadata schema definitions.
//!
//! A schema declares which metadata fields exist for segments and for
//! frames, the datatype of each field, and optionally a fixed list of
//! permissible values. Schemas are written in YAML (or JSON):
//!
//! ```yaml
//! fields:
//!   segments:
//!     - name: activity
//!       type: string
//!       values: [walking, running]
//!   frames:
//!     - name: occluded
//!       type: boolean
//! ```

use crate::error::{AnnotationError, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value as YamlValue;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Datatype of a metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Boolean,
    Float,
    Int,
    String,
}

impl FieldType {
    /// Parse a datatype tag as it appears in a schema file.
    pub fn parse_tag(tag: &str) -> Result<Self> {
        match tag {
            "boolean" => Ok(Self::Boolean),
            "float" => Ok(Self::Float),
            "int" => Ok(Self::Int),
            "string" => Ok(Self::String),
            other => Err(AnnotationError::UnknownType(other.to_string())),
        }
    }

    /// The tag used for this datatype in schema files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::Int => "int",
            Self::String => "string",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed metadata value.
///
/// Serialises as a plain JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// The datatype this value carries.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Bool(_) => FieldType::Boolean,
            Self::Int(_) => FieldType::Int,
            Self::Float(_) => FieldType::Float,
            Self::Text(_) => FieldType::String,
        }
    }

    /// Convert this value to the datatype of `field`.
    ///
    /// Integers widen to floats; every other mismatch is an error.
    /// Non-finite floats are rejected since they cannot be persisted.
    pub fn conform(self, field: &SchemaField) -> Result<FieldValue> {
        let value = match (field.field_type, self) {
            (FieldType::Float, FieldValue::Int(i)) => FieldValue::Float(i as f64),
            (expected, value) if value.field_type() == expected => value,
            (expected, value) => {
                return Err(AnnotationError::TypeMismatch {
                    field: field.name.clone(),
                    expected: expected.as_str(),
                    value: value.to_string(),
                })
            }
        };

        if let FieldValue::Float(f) = value {
            if !f.is_finite() {
                return Err(AnnotationError::InvalidValue {
                    field: field.name.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(value)
    }

    /// Build a value for `field` from a plain JSON value.
    ///
    /// Strings supplied for non-string fields are parsed with [`parse_value`].
    pub fn from_json(field: &SchemaField, json: &serde_json::Value) -> Result<FieldValue> {
        let value = match json {
            serde_json::Value::String(text) => return parse_value(field, text),
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => FieldValue::Int(i),
                // Integral floats (e.g. `3.0`) are accepted for int fields
                (None, Some(f)) if field.field_type == FieldType::Int && f.fract() == 0.0 => {
                    // `as` would saturate anything outside the i64 range
                    if !(f >= i64::MIN as f64 && f < i64::MAX as f64) {
                        return Err(AnnotationError::InvalidValue {
                            field: field.name.clone(),
                            value: n.to_string(),
                        });
                    }
                    FieldValue::Int(f as i64)
                }
                (None, Some(f)) => FieldValue::Float(f),
                (None, None) => {
                    return Err(AnnotationError::InvalidValue {
                        field: field.name.clone(),
                        value: n.to_string(),
                    })
                }
            },
            other => {
                return Err(AnnotationError::TypeMismatch {
                    field: field.name.clone(),
                    expected: field.field_type.as_str(),
                    value: other.to_string(),
                })
            }
        };
        value.conform(field)
    }

    /// The plain JSON form of this value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Definition of a single metadata field.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
    /// Permissible values, in schema order. `None` means unrestricted.
    pub values: Option<Vec<FieldValue>>,
}

impl SchemaField {
    /// Create an unrestricted field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            values: None,
        }
    }

    /// Restrict the field to a list of values. An empty list leaves it unrestricted.
    pub fn with_values(mut self, values: Vec<FieldValue>) -> Self {
        self.values = if values.is_empty() { None } else { Some(values) };
        self
    }

    /// Whether `value` is acceptable under this field's value restriction.
    pub fn allows(&self, value: &FieldValue) -> bool {
        match &self.values {
            Some(values) => values.contains(value),
            None => true,
        }
    }
}

/// The ordered field definitions for one kind of annotation.
///
/// Lookups are linear scans, which is fine for hand-written schemas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldGroup {
    fields: Vec<SchemaField>,
}

impl FieldGroup {
    /// Create a group, rejecting duplicate field names.
    pub fn new(fields: Vec<SchemaField>) -> Result<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(AnnotationError::SchemaFormat(format!(
                    "duplicate field name \"{}\"",
                    field.name
                )));
            }
        }
        Ok(Self { fields })
    }

    pub fn get(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A parsed metadata schema.
///
/// Field groups are shared with every metadata container built from them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRoot {
    pub segments: Arc<FieldGroup>,
    pub frames: Arc<FieldGroup>,
}

/// Load a metadata schema from a YAML or JSON file.
pub fn load_schema(path: &Path) -> Result<SchemaRoot> {
    let text = std::fs::read_to_string(path)?;
    let schema = parse_schema(&text)?;
    log::info!(
        "Loaded schema {} ({} segment fields, {} frame fields)",
        path.display(),
        schema.segments.len(),
        schema.frames.len()
    );
    Ok(schema)
}

/// Parse a metadata schema from YAML or JSON text.
pub fn parse_schema(text: &str) -> Result<SchemaRoot> {
    let root: YamlValue = serde_yaml::from_str(text)
        .map_err(|e| AnnotationError::SchemaFormat(format!("unparseable schema: {e}")))?;

    let fields = root
        .get("fields")
        .filter(|fields| fields.is_mapping())
        .ok_or_else(|| {
            AnnotationError::SchemaFormat("schema does not contain a top-level \"fields\" object".into())
        })?;

    Ok(SchemaRoot {
        segments: Arc::new(parse_group(fields, "segments")?),
        frames: Arc::new(parse_group(fields, "frames")?),
    })
}

fn parse_group(fields: &YamlValue, group: &str) -> Result<FieldGroup> {
    let entries = fields.get(group).and_then(YamlValue::as_sequence).ok_or_else(|| {
        AnnotationError::SchemaFormat(format!(
            "schema does not contain a \"{group}\" array in the top-level \"fields\" object"
        ))
    })?;

    let parsed = entries
        .iter()
        .map(parse_field)
        .collect::<Result<Vec<_>>>()?;
    FieldGroup::new(parsed)
}

fn parse_field(entry: &YamlValue) -> Result<SchemaField> {
    let name = entry
        .get("name")
        .and_then(YamlValue::as_str)
        .ok_or_else(|| AnnotationError::SchemaFormat("field does not contain a valid name".into()))?;

    let field_type = entry
        .get("type")
        .and_then(YamlValue::as_str)
        .ok_or_else(|| AnnotationError::SchemaFormat(format!("field \"{name}\" does not contain a valid type")))
        .and_then(|tag| {
            FieldType::parse_tag(tag).map_err(|_| {
                AnnotationError::SchemaFormat(format!("field \"{name}\" has unrecognised type \"{tag}\""))
            })
        })?;

    let field = SchemaField::new(name, field_type);

    let values = match entry.get("values") {
        None | Some(YamlValue::Null) => return Ok(field),
        Some(YamlValue::Sequence(values)) => values,
        Some(_) => {
            return Err(AnnotationError::SchemaFormat(format!(
                "field \"{name}\" does not contain a valid list of acceptable values"
            )))
        }
    };

    let values = values
        .iter()
        .map(|value| yaml_literal(value).and_then(|v| v.conform(&field)))
        .collect::<Result<Vec<_>>>()
        .map_err(|e| AnnotationError::SchemaFormat(format!("field \"{name}\": {e}")))?;

    Ok(field.with_values(values))
}

fn yaml_literal(value: &YamlValue) -> Result<FieldValue> {
    match value {
        YamlValue::Bool(b) => Ok(FieldValue::Bool(*b)),
        YamlValue::String(s) => Ok(FieldValue::Text(s.clone())),
        YamlValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(FieldValue::Int(i)),
            (None, Some(f)) => Ok(FieldValue::Float(f)),
            (None, None) => Err(AnnotationError::SchemaFormat(format!("unsupported number {n}"))),
        },
        _ => Err(AnnotationError::SchemaFormat(
            "acceptable values must be booleans, numbers or strings".into(),
        )),
    }
}

/// The value a field holds before anything is assigned to it.
///
/// Restricted fields default to their first permissible value; freeform
/// fields default to the zero value of their datatype.
pub fn default_value(field: &SchemaField) -> FieldValue {
    if let Some(first) = field.values.as_ref().and_then(|values| values.first()) {
        return first.clone();
    }

    match field.field_type {
        FieldType::Boolean => FieldValue::Bool(false),
        FieldType::Float => FieldValue::Float(0.0),
        FieldType::Int => FieldValue::Int(0),
        FieldType::String => FieldValue::Text(String::new()),
    }
}

/// Parse text into a value of `field`'s datatype.
///
/// Booleans accept exactly `true` or `false`. Numbers are parsed after
/// trimming surrounding whitespace; non-finite floats are rejected.
pub fn parse_value(field: &SchemaField, text: &str) -> Result<FieldValue> {
    let coercion_error = || AnnotationError::Coercion {
        field: field.name.clone(),
        expected: field.field_type.as_str(),
        text: text.to_string(),
    };

    match field.field_type {
        FieldType::Boolean => match text.trim() {
            "true" => Ok(FieldValue::Bool(true)),
            "false" => Ok(FieldValue::Bool(false)),
            _ => Err(coercion_error()),
        },
        FieldType::Float => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(FieldValue::Float)
            .ok_or_else(coercion_error),
        FieldType::Int => text
            .trim()
            .parse::<i64>()
            .map(FieldValue::Int)
            .map_err(|_| coercion_error()),
        FieldType::String => Ok(FieldValue::Text(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
fields:
  segments:
    - name: activity
      type: string
      values: [walking, running]
    - name: confidence
      type: float
  frames:
    - name: occluded
      type: boolean
    - name: count
      type: int
      values: [1, 2, 3]
    - name: note
      type: string
      values: []
"#;

    #[test]
    fn test_parse_schema() {
        let schema = parse_schema(SCHEMA).unwrap();
        assert_eq!(schema.segments.len(), 2);
        assert_eq!(schema.frames.len(), 3);

        let activity = schema.segments.get("activity").unwrap();
        assert_eq!(activity.field_type, FieldType::String);
        assert_eq!(
            activity.values,
            Some(vec![
                FieldValue::Text("walking".into()),
                FieldValue::Text("running".into())
            ])
        );

        // Empty value lists leave the field unrestricted
        assert_eq!(schema.frames.get("note").unwrap().values, None);
    }

    #[test]
    fn test_parse_json_schema() {
        let json = r#"{"fields": {"segments": [{"name": "a", "type": "int"}], "frames": []}}"#;
        let schema = parse_schema(json).unwrap();
        assert_eq!(schema.segments.fields()[0].field_type, FieldType::Int);
        assert!(schema.frames.is_empty());
    }

    #[test]
    fn test_yaml_syntax_error() {
        assert!(matches!(
            parse_schema("fields: [segments"),
            Err(AnnotationError::SchemaFormat(_))
        ));
    }

    #[test]
    fn test_missing_groups_rejected() {
        for source in [
            "other: 1",
            "fields: [1, 2]",
            "fields:\n  frames: []",
            "fields:\n  segments: []",
            "fields:\n  segments: {}\n  frames: []",
            "fields:\n  segments: []\n  frames: nope",
        ] {
            assert!(
                matches!(parse_schema(source), Err(AnnotationError::SchemaFormat(_))),
                "accepted {source:?}"
            );
        }
    }

    #[test]
    fn test_invalid_fields_rejected() {
        for entry in [
            "- type: int",
            "- name: 5\n    type: int",
            "- name: a",
            "- name: a\n    type: double",
            "- name: a\n    type: int\n    values: 3",
            "- name: a\n    type: int\n    values: [x]",
            "- name: a\n    type: int\n  - name: a\n    type: float",
        ] {
            let source = format!("fields:\n  frames: []\n  segments:\n  {entry}\n");
            assert!(
                matches!(parse_schema(&source), Err(AnnotationError::SchemaFormat(_))),
                "accepted {source:?}"
            );
        }
    }

    #[test]
    fn test_int_values_widen_for_float_fields() {
        let source = "fields:\n  segments: []\n  frames:\n    - name: f\n      type: float\n      values: [1, 2.5]\n";
        let schema = parse_schema(source).unwrap();
        assert_eq!(
            schema.frames.get("f").unwrap().values,
            Some(vec![FieldValue::Float(1.0), FieldValue::Float(2.5)])
        );
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_value(&SchemaField::new("a", FieldType::Boolean)), FieldValue::Bool(false));
        assert_eq!(default_value(&SchemaField::new("a", FieldType::Float)), FieldValue::Float(0.0));
        assert_eq!(default_value(&SchemaField::new("a", FieldType::Int)), FieldValue::Int(0));
        assert_eq!(
            default_value(&SchemaField::new("a", FieldType::String)),
            FieldValue::Text(String::new())
        );

        let restricted = SchemaField::new("a", FieldType::Int)
            .with_values(vec![FieldValue::Int(7), FieldValue::Int(9)]);
        assert_eq!(default_value(&restricted), FieldValue::Int(7));
    }

    #[test]
    fn test_parse_value() {
        let boolean = SchemaField::new("b", FieldType::Boolean);
        assert_eq!(parse_value(&boolean, "true").unwrap(), FieldValue::Bool(true));
        assert_eq!(parse_value(&boolean, "false").unwrap(), FieldValue::Bool(false));
        assert!(matches!(parse_value(&boolean, "yes"), Err(AnnotationError::Coercion { .. })));

        let float = SchemaField::new("f", FieldType::Float);
        assert_eq!(parse_value(&float, " 2.5 ").unwrap(), FieldValue::Float(2.5));
        assert!(matches!(parse_value(&float, "abc"), Err(AnnotationError::Coercion { .. })));
        assert!(matches!(parse_value(&float, "NaN"), Err(AnnotationError::Coercion { .. })));

        let int = SchemaField::new("i", FieldType::Int);
        assert_eq!(parse_value(&int, "42").unwrap(), FieldValue::Int(42));
        assert!(matches!(parse_value(&int, "4.2"), Err(AnnotationError::Coercion { .. })));

        let text = SchemaField::new("s", FieldType::String);
        assert_eq!(parse_value(&text, " x ").unwrap(), FieldValue::Text(" x ".into()));
    }

    #[test]
    fn test_unknown_type_tag() {
        assert!(matches!(FieldType::parse_tag("date"), Err(AnnotationError::UnknownType(_))));
        assert_eq!(FieldType::parse_tag("float").unwrap(), FieldType::Float);
    }

    #[test]
    fn test_conform() {
        let float = SchemaField::new("f", FieldType::Float);
        assert_eq!(FieldValue::Int(3).conform(&float).unwrap(), FieldValue::Float(3.0));
        assert!(matches!(
            FieldValue::Text("3".into()).conform(&float),
            Err(AnnotationError::TypeMismatch { .. })
        ));
        assert!(matches!(
            FieldValue::Float(f64::INFINITY).conform(&float),
            Err(AnnotationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_from_json_integral_floats() {
        let int = SchemaField::new("n", FieldType::Int);
        assert_eq!(
            FieldValue::from_json(&int, &serde_json::json!(3.0)).unwrap(),
            FieldValue::Int(3)
        );
        for value in [serde_json::json!(1e30), serde_json::json!(-1e30)] {
            assert!(matches!(
                FieldValue::from_json(&int, &value),
                Err(AnnotationError::InvalidValue { .. })
            ));
        }
    }
}
