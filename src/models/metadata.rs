// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Schema-bound metadata storage.
//!
//! Every segment and frame carries one [`Metadata`] bound to the matching
//! field group of the dataset's schema. The container always holds exactly
//! one value per declared field, so unknown keys and missing keys cannot
//! occur.

use super::schema::{default_value, parse_value, FieldGroup, FieldValue, SchemaField};
use crate::error::{AnnotationError, Result};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Key/value metadata validated against a field group.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    fields: Arc<FieldGroup>,
    /// One value per field, in schema order.
    values: Vec<FieldValue>,
}

impl Metadata {
    /// Create metadata with every field set to its default value.
    pub fn new(fields: Arc<FieldGroup>) -> Self {
        let values = fields.fields().iter().map(default_value).collect();
        Self { fields, values }
    }

    fn field(&self, name: &str) -> Result<(usize, &SchemaField)> {
        self.fields
            .index_of(name)
            .map(|index| (index, &self.fields.fields()[index]))
            .ok_or_else(|| AnnotationError::UnknownField(name.to_string()))
    }

    /// Retrieve the value of a field.
    pub fn get(&self, name: &str) -> Result<&FieldValue> {
        let (index, _) = self.field(name)?;
        Ok(&self.values[index])
    }

    /// Assign a value to a field.
    ///
    /// Integers are accepted for float fields. Fails if the field is not
    /// declared, the value has the wrong datatype, or the field restricts
    /// its values and `value` is not one of them.
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<()> {
        let (index, field) = self.field(name)?;
        let value = value.conform(field)?;
        if !field.allows(&value) {
            return Err(AnnotationError::InvalidValue {
                field: name.to_string(),
                value: value.to_string(),
            });
        }
        self.values[index] = value;
        Ok(())
    }

    /// Parse text into a value for the named field, without storing it.
    pub fn parse(&self, name: &str, text: &str) -> Result<FieldValue> {
        let (_, field) = self.field(name)?;
        parse_value(field, text)
    }

    /// Iterate over `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields
            .fields()
            .iter()
            .map(|field| field.name.as_str())
            .zip(self.values.iter())
    }

    /// The field group this metadata is bound to.
    pub fn fields(&self) -> &Arc<FieldGroup> {
        &self.fields
    }

    /// Convert to a plain JSON object keyed by field name.
    pub fn to_plain(&self) -> Map<String, Value> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect()
    }

    /// Assign every field present in a plain JSON object.
    ///
    /// Fields absent from `plain` keep their current values. Any key that is
    /// not declared, or any value that fails validation, aborts the update.
    pub fn update_from_plain(&mut self, plain: &Map<String, Value>) -> Result<()> {
        for (name, json) in plain {
            let (_, field) = self.field(name)?;
            let value = FieldValue::from_json(field, json)?;
            self.set(name, value)?;
        }
        Ok(())
    }
}
