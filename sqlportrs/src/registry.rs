use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::codec::{LogicalType, NativeType};
use crate::dialect::{Dialect, SqlDialect};
use crate::error::{Result, SqlportError};

static GLOBAL: Lazy<DialectRegistry> = Lazy::new(DialectRegistry::builtin);

/// Process-wide, read-only lookup from dialect names to their rendering
/// rules and native type descriptors. Built once on first use.
#[derive(Debug)]
pub struct DialectRegistry {
    names: HashMap<&'static str, Dialect>,
}

impl DialectRegistry {
    fn builtin() -> Self {
        let mut names = HashMap::new();
        for dialect in Dialect::ALL {
            names.insert(dialect.name(), dialect);
        }
        names.insert("postgres", Dialect::PostgreSql);
        names.insert("pg", Dialect::PostgreSql);
        Self { names }
    }

    pub fn global() -> &'static DialectRegistry {
        &GLOBAL
    }

    /// Resolve a configured engine name to its dialect tag.
    pub fn resolve(&self, name: &str) -> Result<Dialect> {
        let key = name.trim().to_ascii_lowercase();
        self.names
            .get(key.as_str())
            .copied()
            .ok_or_else(|| SqlportError::UnsupportedDialect(name.to_string()))
    }

    pub fn get(&self, dialect: Dialect) -> &'static dyn SqlDialect {
        dialect.sql()
    }

    pub fn dialects(&self) -> &'static [Dialect] {
        &Dialect::ALL
    }

    /// Date-truncated, timezone-converted expression for `field`.
    pub fn bucket_expression(&self, dialect: Dialect, field: &str) -> String {
        self.get(dialect).bucket_expression(field)
    }

    pub fn native_type(&self, dialect: Dialect, logical: LogicalType) -> NativeType {
        self.get(dialect).native_type(logical)
    }

    /// Native type lookup keyed by engine name, for schema tooling that only
    /// knows the configured string.
    pub fn native_type_by_name(&self, name: &str, logical: LogicalType) -> Result<NativeType> {
        let dialect = self.resolve(name)?;
        Ok(self.native_type(dialect, logical))
    }
}
