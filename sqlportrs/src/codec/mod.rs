//! Column codecs: canonical application types stored portably across engines.
//!
//! Each logical type picks a native column type per dialect and converts
//! values on the way in (`encode`, producing a bind value) and on the way
//! out (`decode`, consuming whatever the driver handed back).

use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dialect::Dialect;
use crate::error::{Result, SqlportError};
use crate::params::BindValue;
use crate::registry::DialectRegistry;

mod identifier;
mod json;
mod text;

pub use identifier::IdentifierCodec;
pub use json::JsonCodec;
pub use text::LongTextCodec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalType {
    Identifier,
    Json,
    LongText,
}

/// Schema-level column type chosen for a logical type on one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Uuid,
    Char(u16),
    Raw(u16),
    Json,
    Jsonb,
    Text,
    LongText,
    Clob,
}

impl NativeType {
    pub fn ddl(&self) -> String {
        match self {
            NativeType::Uuid => "UUID".to_string(),
            NativeType::Char(len) => format!("CHAR({len})"),
            NativeType::Raw(len) => format!("RAW({len})"),
            NativeType::Json => "JSON".to_string(),
            NativeType::Jsonb => "JSONB".to_string(),
            NativeType::Text => "TEXT".to_string(),
            NativeType::LongText => "LONGTEXT".to_string(),
            NativeType::Clob => "CLOB".to_string(),
        }
    }

    /// Large objects hand back a locator that must be read before use.
    pub fn is_large_object(&self) -> bool {
        matches!(self, NativeType::Clob)
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ddl())
    }
}

/// Handle to large-object content owned by the driver.
pub trait LargeObject: Send + Sync + fmt::Debug {
    fn read_to_string(&self) -> io::Result<String>;
}

/// Large object whose content is already materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryLob(pub String);

impl LargeObject for InMemoryLob {
    fn read_to_string(&self) -> io::Result<String> {
        Ok(self.0.clone())
    }
}

/// A raw column value as returned by a database driver.
#[derive(Debug, Clone)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    /// Exact numeric (NUMERIC, DECIMAL, Oracle NUMBER).
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Json(serde_json::Value),
    Lob(Arc<dyn LargeObject>),
}

impl NativeValue {
    pub fn lob(content: impl Into<String>) -> Self {
        NativeValue::Lob(Arc::new(InMemoryLob(content.into())))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NativeValue::Null => "null",
            NativeValue::Bool(_) => "bool",
            NativeValue::Integer(_) => "integer",
            NativeValue::Float(_) => "float",
            NativeValue::Decimal(_) => "decimal",
            NativeValue::Text(_) => "text",
            NativeValue::Bytes(_) => "bytes",
            NativeValue::Uuid(_) => "uuid",
            NativeValue::Date(_) => "date",
            NativeValue::Timestamp(_) => "timestamp",
            NativeValue::Json(_) => "json",
            NativeValue::Lob(_) => "large object",
        }
    }

    /// Exact view of a numeric value. Floats keep their binary value, so
    /// later rounding sees the same midpoints the float does.
    pub fn as_decimal(&self) -> Result<Option<Decimal>> {
        match self {
            NativeValue::Null => Ok(None),
            NativeValue::Integer(i) => Ok(Some(Decimal::from(*i))),
            NativeValue::Float(f) => Decimal::from_f64_retain(*f)
                .map(Some)
                .ok_or_else(|| SqlportError::Decode(format!("numeric value {f} out of range"))),
            NativeValue::Decimal(d) => Ok(Some(*d)),
            NativeValue::Text(s) => {
                let trimmed = s.trim();
                Decimal::from_str(trimmed)
                    .or_else(|_| Decimal::from_scientific(trimmed))
                    .map(Some)
                    .map_err(|e| SqlportError::Decode(format!("numeric value {s:?}: {e}")))
            }
            other => Err(SqlportError::Decode(format!(
                "expected numeric value, got {}",
                other.kind()
            ))),
        }
    }

    pub fn as_f64(&self) -> Result<Option<f64>> {
        match self {
            NativeValue::Float(f) => Ok(Some(*f)),
            other => Ok(other.as_decimal()?.and_then(|d| d.to_f64())),
        }
    }

    /// Integer view; exact numerics with a zero fraction are accepted.
    pub fn as_i64(&self) -> Result<Option<i64>> {
        if let NativeValue::Integer(i) = self {
            return Ok(Some(*i));
        }
        let Some(value) = self.as_decimal()? else {
            return Ok(None);
        };
        if !value.fract().is_zero() {
            return Err(SqlportError::Decode(format!(
                "expected integer value, got {value}"
            )));
        }
        value
            .to_i64()
            .map(Some)
            .ok_or_else(|| SqlportError::Decode(format!("integer value {value} out of range")))
    }

    pub fn as_date(&self) -> Result<Option<NaiveDate>> {
        match self {
            NativeValue::Null => Ok(None),
            NativeValue::Date(d) => Ok(Some(*d)),
            NativeValue::Timestamp(ts) => Ok(Some(ts.date())),
            NativeValue::Text(s) => {
                let head = s.get(..10).unwrap_or(s.as_str());
                NaiveDate::parse_from_str(head, "%Y-%m-%d")
                    .map(Some)
                    .map_err(|e| SqlportError::Decode(format!("date value {s:?}: {e}")))
            }
            other => Err(SqlportError::Decode(format!(
                "expected date value, got {}",
                other.kind()
            ))),
        }
    }
}

/// What the engine hands back for a value it was given as a bind parameter.
impl From<BindValue> for NativeValue {
    fn from(value: BindValue) -> Self {
        match value {
            BindValue::Null => NativeValue::Null,
            BindValue::Text(s) => NativeValue::Text(s),
            BindValue::Integer(i) => NativeValue::Integer(i),
            BindValue::Float(f) => NativeValue::Float(f),
            BindValue::Bytes(b) => NativeValue::Bytes(b),
            BindValue::Uuid(u) => NativeValue::Uuid(u),
            BindValue::Timestamp(ts) => NativeValue::Timestamp(ts.naive_utc()),
        }
    }
}

/// Encode/decode rules for one logical column type.
pub trait ColumnCodec {
    type Value;

    fn logical_type(&self) -> LogicalType;

    fn native_type(&self, dialect: Dialect) -> NativeType {
        DialectRegistry::global().native_type(dialect, self.logical_type())
    }

    /// `None` is SQL NULL and always passes through.
    fn encode(&self, value: Option<&Self::Value>, dialect: Dialect) -> Result<BindValue>;

    fn decode(&self, native: &NativeValue, dialect: Dialect) -> Result<Option<Self::Value>>;
}

/// A decoded column in its canonical application form.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Null,
    Identifier(String),
    Json(serde_json::Value),
    Text(String),
}

pub fn decode_column(
    logical: LogicalType,
    native: &NativeValue,
    dialect: Dialect,
) -> Result<DecodedValue> {
    let decoded = match logical {
        LogicalType::Identifier => IdentifierCodec
            .decode(native, dialect)?
            .map(DecodedValue::Identifier),
        LogicalType::Json => JsonCodec.decode(native, dialect)?.map(DecodedValue::Json),
        LogicalType::LongText => LongTextCodec
            .decode(native, dialect)?
            .map(DecodedValue::Text),
    };
    Ok(decoded.unwrap_or(DecodedValue::Null))
}

/// Read a large object fully, mapping driver I/O failures to decode errors.
pub(crate) fn materialize(lob: &dyn LargeObject) -> Result<String> {
    lob.read_to_string()
        .map_err(|e| SqlportError::Decode(format!("unreadable large object: {e}")))
}
