//! MySQL dialect implementation.

use crate::codec::{LogicalType, NativeType};

use super::{Dialect, SqlDialect, TZ_PARAM};

#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn tag(&self) -> Dialect {
        Dialect::MySql
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    // Named zones require the server's time zone tables to be loaded.
    fn bucket_expression(&self, field: &str) -> String {
        format!("CONVERT_TZ({field}, 'UTC', {})", self.placeholder(TZ_PARAM))
    }

    fn native_type(&self, logical: LogicalType) -> NativeType {
        match logical {
            LogicalType::Identifier => NativeType::Char(32),
            LogicalType::Json => NativeType::Json,
            LogicalType::LongText => NativeType::LongText,
        }
    }
}
