//! Row-to-record conversion
//!
//! Rows are zipped with the table headers into a [`RowFields`] mapping and
//! then converted in one of two ways:
//! - per-field converters ([`ConversionSchema::Fields`]), looked up by header
//!   name exactly or after normalisation (`User Name` -> `user_name`);
//! - a structural validator ([`ConversionSchema::Validator`]) that receives
//!   the whole mapping.
//!
//! Typed conversion into serde types goes through a small deserializer over
//! string cells, so `i64`, `f64`, `bool` and `Option<_>` fields parse
//! directly from cell text.

use crate::error::{Error, Result, ValidationError};
use crate::table::Table;
use indexmap::IndexMap;
use serde::de::value::MapDeserializer;
use serde::de::{self, DeserializeOwned, IntoDeserializer, Visitor};
use serde::{forward_to_deserialize_any, Serialize};
use serde_json::{Number, Value};
use std::fmt::Display;

/// One row keyed by header, in column order
pub type RowFields = IndexMap<String, String>;

/// Converts one cell; the error string becomes the validation message
pub type CellConverter = fn(&str) -> std::result::Result<Value, String>;

/// Validates and converts a whole row
pub type RowValidator = fn(&RowFields) -> std::result::Result<Value, String>;

/// How a single field is converted
#[derive(Debug, Clone)]
pub enum FieldConverter {
    /// Keep the cell text as a string
    Text,
    /// Signed 64-bit integer; empty cells are rejected
    Integer,
    /// Finite float; empty cells are rejected
    Float,
    /// See [`parse_bool`]
    Boolean,
    /// Empty or whitespace-only cell becomes `null`, otherwise the inner converter applies
    Optional(Box<FieldConverter>),
    Custom(CellConverter),
}

impl FieldConverter {
    /// Wrap a converter so empty cells become `null`
    pub fn optional(inner: FieldConverter) -> Self {
        FieldConverter::Optional(Box::new(inner))
    }

    /// Convert one cell
    pub fn apply(&self, cell: &str) -> std::result::Result<Value, String> {
        match self {
            FieldConverter::Text => Ok(Value::String(cell.to_string())),
            FieldConverter::Integer => {
                let text = cell.trim();
                if text.is_empty() {
                    return Err("empty value for integer field".to_string());
                }
                text.parse::<i64>()
                    .map(Value::from)
                    .map_err(|e| format!("invalid integer '{}': {}", cell, e))
            }
            FieldConverter::Float => {
                let text = cell.trim();
                if text.is_empty() {
                    return Err("empty value for float field".to_string());
                }
                let value = text
                    .parse::<f64>()
                    .map_err(|e| format!("invalid float '{}': {}", cell, e))?;
                Number::from_f64(value)
                    .map(Value::Number)
                    .ok_or_else(|| format!("'{}' is not a finite number", cell))
            }
            FieldConverter::Boolean => parse_bool(cell).map(Value::Bool),
            FieldConverter::Optional(inner) => {
                if cell.trim().is_empty() {
                    Ok(Value::Null)
                } else {
                    inner.apply(cell)
                }
            }
            FieldConverter::Custom(convert) => convert(cell),
        }
    }
}

/// How rows become records
#[derive(Debug, Clone)]
pub enum ConversionSchema {
    /// Per-field converters keyed by field name; unmatched headers stay strings
    Fields(IndexMap<String, FieldConverter>),
    /// One validator for the whole row
    Validator(RowValidator),
}

impl ConversionSchema {
    /// Build a field-converter schema from `(field, converter)` pairs
    pub fn fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldConverter)>,
        K: Into<String>,
    {
        ConversionSchema::Fields(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Lowercase, trim and replace spaces with underscores: `User Name` -> `user_name`
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

/// Boolean coercion for table cells.
///
/// Case-insensitive `true/yes/1/on` and `false/no/0/off`, plus GFM task
/// markers `[x]` and `[ ]`. An empty cell is `false`.
pub fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" | "[x]" => Ok(true),
        "false" | "no" | "0" | "off" | "[ ]" | "" => Ok(false),
        _ => Err(format!("invalid boolean value '{}'", value)),
    }
}

/// Zip headers with one row's cells. A later duplicate header overwrites an earlier one.
pub fn row_fields(headers: &[String], row: &[String]) -> RowFields {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.clone(), row.get(i).cloned().unwrap_or_default()))
        .collect()
}

/// Outcome of converting one row: the record, or every failure found in it
pub type RowResult = std::result::Result<Value, Vec<ValidationError>>;

/// Convert every row, reporting failures per row
pub fn convert_rows(
    headers: &[String],
    rows: &[Vec<String>],
    schema: &ConversionSchema,
) -> Vec<RowResult> {
    let results: Vec<_> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| convert_row(i, row_fields(headers, row), schema))
        .collect();

    tracing::debug!(
        rows = results.len(),
        failed = results.iter().filter(|r| r.is_err()).count(),
        "converted rows"
    );
    results
}

/// Field converters run on every cell so one row reports all of its bad fields
fn convert_row(index: usize, fields: RowFields, schema: &ConversionSchema) -> RowResult {
    match schema {
        ConversionSchema::Fields(converters) => {
            let mut record = serde_json::Map::with_capacity(fields.len());
            let mut errors = Vec::new();
            for (header, cell) in fields {
                match lookup(converters, &header) {
                    Some((name, converter)) => match converter.apply(&cell) {
                        Ok(value) => {
                            record.insert(name.to_string(), value);
                        }
                        Err(message) => errors.push(ValidationError::field(index, name, message)),
                    },
                    None => {
                        record.insert(header, Value::String(cell));
                    }
                }
            }
            if errors.is_empty() {
                Ok(Value::Object(record))
            } else {
                Err(errors)
            }
        }
        ConversionSchema::Validator(validate) => {
            validate(&fields).map_err(|message| vec![ValidationError::row(index, message)])
        }
    }
}

fn lookup<'a>(
    converters: &'a IndexMap<String, FieldConverter>,
    header: &str,
) -> Option<(&'a str, &'a FieldConverter)> {
    if let Some((name, converter)) = converters.get_key_value(header) {
        return Some((name.as_str(), converter));
    }
    let normalized = normalize_header(header);
    converters
        .get_key_value(normalized.as_str())
        .map(|(name, converter)| (name.as_str(), converter))
}

/// Structural validator backed by a serde type.
///
/// Deserializes the row into `T` (field names matched against normalised
/// headers) and re-serializes it, so the record carries `T`'s field types.
/// Use as `ConversionSchema::Validator(serde_validator::<MyRow>)`.
pub fn serde_validator<T>(fields: &RowFields) -> std::result::Result<Value, String>
where
    T: DeserializeOwned + Serialize,
{
    let record: T = deserialize_fields(fields).map_err(|e| e.to_string())?;
    serde_json::to_value(record).map_err(|e| e.to_string())
}

impl Table {
    /// Convert each data row to a JSON record
    pub fn to_models(&self, schema: &ConversionSchema) -> Vec<RowResult> {
        convert_rows(&self.headers, &self.rows, schema)
    }

    /// Convert all rows, failing with every row error collected
    pub fn to_models_strict(&self, schema: &ConversionSchema) -> Result<Vec<Value>> {
        collect_rows(self.to_models(schema))
    }

    /// Deserialize every row into `T`.
    ///
    /// Headers are matched against `T`'s field names after normalisation.
    /// Cells parse according to the target field type; failures are
    /// collected into [`Error::Validation`].
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let results = self.rows.iter().enumerate().map(|(i, row)| {
            deserialize_fields::<T>(&row_fields(&self.headers, row)).map_err(|e| {
                vec![match e.field {
                    Some(field) => ValidationError::field(i, field, e.message),
                    None => ValidationError::row(i, e.message),
                }]
            })
        });
        collect_rows(results)
    }
}

fn collect_rows<T>(
    results: impl IntoIterator<Item = std::result::Result<T, Vec<ValidationError>>>,
) -> Result<Vec<T>> {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(record) => records.push(record),
            Err(row_errors) => errors.extend(row_errors),
        }
    }

    if errors.is_empty() {
        Ok(records)
    } else {
        Err(Error::Validation(errors))
    }
}

fn deserialize_fields<T: DeserializeOwned>(fields: &RowFields) -> std::result::Result<T, CellError> {
    let normalized: Vec<(String, &str)> = fields
        .iter()
        .map(|(header, cell)| (normalize_header(header), cell.as_str()))
        .collect();

    let entries = normalized.iter().map(|(field, value)| {
        (
            field.as_str(),
            CellDeserializer {
                field: field.as_str(),
                value,
            },
        )
    });
    let map: MapDeserializer<'_, _, CellError> = MapDeserializer::new(entries);
    T::deserialize(map)
}

/// Deserialization failure, attributed to a field when known
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct CellError {
    field: Option<String>,
    message: String,
}

impl de::Error for CellError {
    fn custom<T: Display>(msg: T) -> Self {
        CellError {
            field: None,
            message: msg.to_string(),
        }
    }

    fn missing_field(field: &'static str) -> Self {
        CellError {
            field: Some(field.to_string()),
            message: "missing field".to_string(),
        }
    }
}

/// Deserializer for one cell's text
struct CellDeserializer<'a> {
    field: &'a str,
    value: &'a str,
}

impl CellDeserializer<'_> {
    fn error(&self, message: impl Display) -> CellError {
        CellError {
            field: Some(self.field.to_string()),
            message: message.to_string(),
        }
    }
}

macro_rules! parse_number {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, CellError> {
                let value = self
                    .value
                    .trim()
                    .parse::<$ty>()
                    .map_err(|e| self.error(format!("invalid number '{}': {}", self.value, e)))?;
                visitor.$visit(value)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for CellDeserializer<'_> {
    type Error = CellError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, CellError> {
        visitor.visit_str(self.value)
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, CellError> {
        let value = parse_bool(self.value).map_err(|e| self.error(e))?;
        visitor.visit_bool(value)
    }

    parse_number! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, CellError> {
        if self.value.trim().is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> std::result::Result<V::Value, CellError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, CellError> {
        let variant: de::value::StrDeserializer<'_, CellError> =
            self.value.trim().into_deserializer();
        visitor.visit_enum(variant)
    }

    forward_to_deserialize_any! {
        i128 u128 char str string bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

impl<'de, 'a> IntoDeserializer<'de, CellError> for CellDeserializer<'a> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}
