//! PostgreSQL dialect implementation.

use crate::codec::{LogicalType, NativeType};

use super::{Dialect, SqlDialect, TZ_PARAM};

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn tag(&self) -> Dialect {
        Dialect::PostgreSql
    }

    fn bucket_expression(&self, field: &str) -> String {
        // Interpret the naive column as UTC, then reinterpret in the caller's zone.
        format!(
            "DATE_TRUNC('day', {field} AT TIME ZONE 'UTC' AT TIME ZONE {})",
            self.placeholder(TZ_PARAM)
        )
    }

    fn native_type(&self, logical: LogicalType) -> NativeType {
        match logical {
            LogicalType::Identifier => NativeType::Uuid,
            LogicalType::Json => NativeType::Jsonb,
            LogicalType::LongText => NativeType::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_converts_twice_then_truncates() {
        assert_eq!(
            PostgresDialect.bucket_expression("created_at"),
            "DATE_TRUNC('day', created_at AT TIME ZONE 'UTC' AT TIME ZONE :tz)"
        );
    }
}
