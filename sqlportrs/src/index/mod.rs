//! Secondary indexes over JSON columns.
//!
//! PostgreSQL gets a GIN index, Oracle a function-based index over
//! `json_value`, and MySQL nothing at all: the engine cannot index a JSON
//! column directly, so both create and drop are no-ops there. Strategies
//! are plain values chosen per dialect and handed to the caller.

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{Result, SqlportError};
use crate::executor::StatementExecutor;
use crate::naming::NamingConvention;

mod manifest;

pub use manifest::JsonIndexManifest;

/// JSON path projected by the Oracle function-based index.
pub const DEFAULT_JSON_PATH: &str = "$";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JsonIndex {
    #[serde(default)]
    pub name: Option<String>,
    pub table: String,
    pub column: String,
    #[serde(default)]
    pub path: Option<String>,
}

impl JsonIndex {
    pub fn new(name: &str, table: &str, column: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            table: table.to_string(),
            column: column.to_string(),
            path: None,
        }
    }

    /// Explicit name, or the one derived from the naming convention.
    pub fn resolved_name(&self, naming: &NamingConvention) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| naming.index_name(&self.table, &self.column))
    }
}

fn check_ident(ident: &str) -> Result<()> {
    let mut chars = ident.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(SqlportError::InvalidColumn(ident.to_string()))
    }
}

pub trait JsonIndexStrategy: Send + Sync {
    /// DDL creating the index; empty when the engine has no JSON indexes.
    fn create_statements(&self, name: &str, table: &str, column: &str, path: &str)
        -> Vec<String>;

    fn drop_statements(&self, name: &str) -> Vec<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GinIndexStrategy;

impl JsonIndexStrategy for GinIndexStrategy {
    fn create_statements(&self, name: &str, table: &str, column: &str, _path: &str) -> Vec<String> {
        vec![format!("CREATE INDEX {name} ON {table} USING gin ({column})")]
    }

    fn drop_statements(&self, name: &str) -> Vec<String> {
        vec![format!("DROP INDEX {name}")]
    }
}

/// Function-based index; malformed JSON fails index maintenance
/// (`ERROR ON ERROR`) instead of silently indexing NULL.
#[derive(Debug, Default, Clone, Copy)]
pub struct OracleJsonValueIndexStrategy;

impl JsonIndexStrategy for OracleJsonValueIndexStrategy {
    fn create_statements(&self, name: &str, table: &str, column: &str, path: &str) -> Vec<String> {
        let path = path.replace('\'', "''");
        vec![format!(
            "CREATE INDEX {name} ON {table} (json_value({column}, '{path}' RETURNING VARCHAR2(4000) ERROR ON ERROR))"
        )]
    }

    fn drop_statements(&self, name: &str) -> Vec<String> {
        vec![format!("DROP INDEX {name}")]
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndexStrategy;

impl JsonIndexStrategy for NoopIndexStrategy {
    fn create_statements(&self, _: &str, _: &str, _: &str, _: &str) -> Vec<String> {
        Vec::new()
    }

    fn drop_statements(&self, _: &str) -> Vec<String> {
        Vec::new()
    }
}

pub fn index_strategy_for(dialect: Dialect) -> &'static dyn JsonIndexStrategy {
    match dialect {
        Dialect::PostgreSql => &GinIndexStrategy,
        Dialect::Oracle => &OracleJsonValueIndexStrategy,
        Dialect::MySql => &NoopIndexStrategy,
    }
}

/// DDL creating a JSON index on `dialect`. Empty on MySQL, which is success.
pub fn provision_json_index(
    index_name: &str,
    table: &str,
    column: &str,
    dialect: Dialect,
) -> Result<Vec<String>> {
    plan_create(
        index_strategy_for(dialect),
        &JsonIndex::new(index_name, table, column),
        &NamingConvention::default(),
    )
}

/// DDL dropping a JSON index on `dialect`. Empty on MySQL, which is success.
pub fn drop_json_index(index_name: &str, dialect: Dialect) -> Result<Vec<String>> {
    check_ident(index_name)?;
    Ok(index_strategy_for(dialect).drop_statements(index_name))
}

pub fn plan_create(
    strategy: &dyn JsonIndexStrategy,
    index: &JsonIndex,
    naming: &NamingConvention,
) -> Result<Vec<String>> {
    let name = index.resolved_name(naming);
    check_ident(&name)?;
    check_ident(&index.table)?;
    check_ident(&index.column)?;
    let path = index.path.as_deref().unwrap_or(DEFAULT_JSON_PATH);
    let statements = strategy.create_statements(&name, &index.table, &index.column, path);
    tracing::debug!(
        index = %name,
        table = %index.table,
        statements = statements.len(),
        "planned json index"
    );
    Ok(statements)
}

/// Run the create DDL for every index through `executor`, returning the
/// number of statements executed.
pub async fn apply_json_indexes(
    executor: &dyn StatementExecutor,
    indexes: &[JsonIndex],
    dialect: Dialect,
    naming: &NamingConvention,
) -> Result<usize> {
    let strategy = index_strategy_for(dialect);
    let mut executed = 0;
    for index in indexes {
        for statement in plan_create(strategy, index, naming)? {
            tracing::trace!(sql = %statement, "executing ddl");
            executor.execute(&statement).await?;
            executed += 1;
        }
    }
    tracing::info!(dialect = %dialect, executed, "json indexes provisioned");
    Ok(executed)
}
