use uuid::Uuid;

use crate::dialect::Dialect;
use crate::error::{Result, SqlportError};
use crate::params::BindValue;

use super::{ColumnCodec, LogicalType, NativeValue};

/// 128-bit identifiers, canonically the lowercase hyphenated string.
///
/// PostgreSQL stores a native `UUID`, Oracle a `RAW(16)` and MySQL a
/// `CHAR(32)` of bare hex digits.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentifierCodec;

/// Only the 32-hex and hyphenated forms; braced and `urn:uuid:` input is
/// not an identifier here.
fn parse_plain(text: &str) -> std::result::Result<Uuid, String> {
    let text = text.trim();
    match text.len() {
        32 | 36 => Uuid::try_parse(text).map_err(|e| e.to_string()),
        len => Err(format!("expected 32 or 36 characters, found {len}")),
    }
}

impl IdentifierCodec {
    pub fn parse(value: &str) -> Result<Uuid> {
        parse_plain(value).map_err(|e| SqlportError::InvalidIdentifier(format!("{value:?}: {e}")))
    }

    pub fn canonical(value: &str) -> Result<String> {
        Ok(Self::parse(value)?.hyphenated().to_string())
    }

    pub fn encode_str(&self, value: Option<&str>, dialect: Dialect) -> Result<BindValue> {
        let Some(value) = value else {
            return Ok(BindValue::Null);
        };
        let id = Self::parse(value)?;
        Ok(match dialect {
            Dialect::PostgreSql => BindValue::Uuid(id),
            Dialect::Oracle => BindValue::Bytes(id.as_bytes().to_vec()),
            Dialect::MySql => BindValue::Text(id.simple().to_string()),
        })
    }
}

fn decode_text(text: &str) -> Result<Uuid> {
    parse_plain(text).map_err(|e| SqlportError::Decode(format!("identifier {text:?}: {e}")))
}

fn decode_bytes(bytes: &[u8]) -> Result<Uuid> {
    if bytes.len() == 16 {
        return Uuid::from_slice(bytes).map_err(|e| SqlportError::Decode(e.to_string()));
    }
    // CHAR columns under a binary collation come back as raw bytes.
    let text = std::str::from_utf8(bytes)
        .map_err(|_| SqlportError::Decode(format!("identifier of {} bytes", bytes.len())))?;
    decode_text(text)
}

impl ColumnCodec for IdentifierCodec {
    type Value = String;

    fn logical_type(&self) -> LogicalType {
        LogicalType::Identifier
    }

    fn encode(&self, value: Option<&String>, dialect: Dialect) -> Result<BindValue> {
        self.encode_str(value.map(String::as_str), dialect)
    }

    fn decode(&self, native: &NativeValue, dialect: Dialect) -> Result<Option<String>> {
        let id = match (dialect, native) {
            (_, NativeValue::Null) => return Ok(None),
            (_, NativeValue::Uuid(id)) => *id,
            (Dialect::Oracle, NativeValue::Bytes(bytes)) if bytes.len() != 16 => {
                return Err(SqlportError::Decode(format!(
                    "RAW(16) identifier of {} bytes",
                    bytes.len()
                )))
            }
            (_, NativeValue::Bytes(bytes)) => decode_bytes(bytes)?,
            (_, NativeValue::Text(text)) => decode_text(text)?,
            (_, other) => {
                return Err(SqlportError::Decode(format!(
                    "cannot read identifier from {}",
                    other.kind()
                )))
            }
        };
        Ok(Some(id.hyphenated().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "123e4567-e89b-12d3-a456-426614174000";

    #[test]
    fn oracle_stores_sixteen_bytes() {
        let encoded = IdentifierCodec.encode_str(Some(ID), Dialect::Oracle).unwrap();
        let BindValue::Bytes(bytes) = &encoded else {
            panic!("expected bytes, got {encoded:?}");
        };
        assert_eq!(bytes.len(), 16);
        let decoded = IdentifierCodec
            .decode(&NativeValue::from(encoded), Dialect::Oracle)
            .unwrap();
        assert_eq!(decoded.as_deref(), Some(ID));
    }

    #[test]
    fn mysql_stores_bare_hex() {
        let encoded = IdentifierCodec.encode_str(Some(ID), Dialect::MySql).unwrap();
        assert_eq!(
            encoded,
            BindValue::Text("123e4567e89b12d3a456426614174000".into())
        );
    }

    #[test]
    fn postgres_stores_native_uuid() {
        let encoded = IdentifierCodec
            .encode_str(Some(ID), Dialect::PostgreSql)
            .unwrap();
        assert!(matches!(encoded, BindValue::Uuid(id) if id.to_string() == ID));
    }

    #[test]
    fn null_passes_through() {
        for dialect in Dialect::ALL {
            assert_eq!(IdentifierCodec.encode(None, dialect).unwrap(), BindValue::Null);
            assert_eq!(IdentifierCodec.decode(&NativeValue::Null, dialect).unwrap(), None);
        }
    }

    #[test]
    fn malformed_input_is_rejected() {
        let err = IdentifierCodec
            .encode_str(Some("not-a-uuid"), Dialect::MySql)
            .unwrap_err();
        assert!(matches!(err, SqlportError::InvalidIdentifier(_)));
    }

    #[test]
    fn braced_and_urn_forms_are_rejected() {
        let braced = format!("{{{ID}}}");
        let urn = format!("urn:uuid:{ID}");
        for input in [&braced, &urn] {
            let err = IdentifierCodec::parse(input).unwrap_err();
            assert!(matches!(err, SqlportError::InvalidIdentifier(_)), "{input}");
            let err = IdentifierCodec
                .decode(&NativeValue::Text(input.clone()), Dialect::Oracle)
                .unwrap_err();
            assert!(matches!(err, SqlportError::Decode(_)), "{input}");
        }
        assert!(IdentifierCodec::parse(&format!(" {ID} ")).is_ok());
    }

    #[test]
    fn decoding_normalizes_case() {
        let decoded = IdentifierCodec
            .decode(
                &NativeValue::Text("123E4567E89B12D3A456426614174000".into()),
                Dialect::MySql,
            )
            .unwrap();
        assert_eq!(decoded.as_deref(), Some(ID));
    }

    #[test]
    fn oracle_rejects_short_raw() {
        let err = IdentifierCodec
            .decode(&NativeValue::Bytes(vec![1, 2, 3]), Dialect::Oracle)
            .unwrap_err();
        assert!(matches!(err, SqlportError::Decode(_)));
    }

    #[test]
    fn oracle_accepts_textual_identifier() {
        let decoded = IdentifierCodec
            .decode(&NativeValue::Text(ID.to_uppercase()), Dialect::Oracle)
            .unwrap();
        assert_eq!(decoded.as_deref(), Some(ID));
    }
}
