use serde_json::Value;

use crate::dialect::Dialect;
use crate::error::{Result, SqlportError};
use crate::params::BindValue;

use super::{materialize, ColumnCodec, LogicalType, NativeValue};

/// Arbitrary JSON trees. `JSONB` on PostgreSQL, `JSON` on MySQL and a
/// `CLOB` on Oracle, whose locator is read in full before parsing.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

fn parse(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| SqlportError::Decode(format!("invalid json: {e}")))
}

impl ColumnCodec for JsonCodec {
    type Value = Value;

    fn logical_type(&self) -> LogicalType {
        LogicalType::Json
    }

    fn encode(&self, value: Option<&Value>, _dialect: Dialect) -> Result<BindValue> {
        match value {
            None => Ok(BindValue::Null),
            Some(value) => Ok(BindValue::Text(serde_json::to_string(value)?)),
        }
    }

    fn decode(&self, native: &NativeValue, _dialect: Dialect) -> Result<Option<Value>> {
        match native {
            NativeValue::Null => Ok(None),
            NativeValue::Json(value) => Ok(Some(value.clone())),
            NativeValue::Text(text) => parse(text).map(Some),
            NativeValue::Lob(lob) => parse(&materialize(lob.as_ref())?).map(Some),
            NativeValue::Bytes(bytes) => serde_json::from_slice(bytes)
                .map(Some)
                .map_err(|e| SqlportError::Decode(format!("invalid json: {e}"))),
            other => Err(SqlportError::Decode(format!(
                "cannot read json from {}",
                other.kind()
            ))),
        }
    }
}
