//! Oracle dialect implementation.
//!
//! Oracle has no `DATE()` function and cannot group by a select alias, so
//! both hooks are overridden here. `DATE` is a reserved word and must be
//! quoted when used as an alias.

use crate::codec::{LogicalType, NativeType};

use super::{Dialect, SqlDialect, TZ_PARAM};

const RESERVED_ALIASES: &[&str] = &[
    "date", "level", "size", "number", "comment", "uid", "user", "session", "rowid", "order",
    "group", "mode", "access", "file",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct OracleDialect;

impl SqlDialect for OracleDialect {
    fn tag(&self) -> Dialect {
        Dialect::Oracle
    }

    fn render_alias(&self, alias: &str) -> String {
        if RESERVED_ALIASES.contains(&alias.to_ascii_lowercase().as_str()) {
            self.quote_ident(alias)
        } else {
            alias.to_string()
        }
    }

    fn bucket_expression(&self, field: &str) -> String {
        format!(
            "TRUNC(FROM_TZ(CAST({field} AS TIMESTAMP), 'UTC') AT TIME ZONE {})",
            self.placeholder(TZ_PARAM)
        )
    }

    fn date_cast(&self, expr: &str) -> String {
        format!("CAST({expr} AS DATE)")
    }

    fn supports_group_by_alias(&self) -> bool {
        false
    }

    fn native_type(&self, logical: LogicalType) -> NativeType {
        match logical {
            LogicalType::Identifier => NativeType::Raw(16),
            LogicalType::Json => NativeType::Clob,
            LogicalType::LongText => NativeType::Clob,
        }
    }
}
