use crate::dialect::Dialect;
use crate::error::{Result, SqlportError};
use crate::params::BindValue;

use super::{materialize, ColumnCodec, LogicalType, NativeValue};

/// Unbounded text. Only the native column type differs per engine:
/// `TEXT`, `LONGTEXT` or `CLOB`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LongTextCodec;

impl ColumnCodec for LongTextCodec {
    type Value = String;

    fn logical_type(&self) -> LogicalType {
        LogicalType::LongText
    }

    fn encode(&self, value: Option<&String>, _dialect: Dialect) -> Result<BindValue> {
        Ok(value.map_or(BindValue::Null, |v| BindValue::Text(v.clone())))
    }

    fn decode(&self, native: &NativeValue, _dialect: Dialect) -> Result<Option<String>> {
        match native {
            NativeValue::Null => Ok(None),
            NativeValue::Text(text) => Ok(Some(text.clone())),
            NativeValue::Lob(lob) => materialize(lob.as_ref()).map(Some),
            NativeValue::Bytes(bytes) => String::from_utf8(bytes.clone())
                .map(Some)
                .map_err(|e| SqlportError::Decode(format!("text is not utf-8: {e}"))),
            other => Err(SqlportError::Decode(format!(
                "cannot read text from {}",
                other.kind()
            ))),
        }
    }
}
