use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::codec::NativeValue;
use crate::error::{Result, SqlportError};
use crate::params::BindParams;

#[derive(Debug, Clone)]
pub struct ColumnMeta {
    pub name: String,
}

/// One result row keyed by column name. Lookups ignore case, since Oracle
/// reports unquoted names upper-cased.
#[derive(Debug, Clone, Default)]
pub struct ResultRow {
    values: BTreeMap<String, NativeValue>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: &str, value: NativeValue) {
        self.values.insert(column.to_ascii_lowercase(), value);
    }

    pub fn with(mut self, column: &str, value: NativeValue) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&NativeValue> {
        self.values.get(&column.to_ascii_lowercase())
    }

    pub fn require(&self, column: &str) -> Result<&NativeValue> {
        self.get(column)
            .ok_or_else(|| SqlportError::Decode(format!("missing column {column}")))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, NativeValue)> for ResultRow {
    fn from_iter<I: IntoIterator<Item = (S, NativeValue)>>(iter: I) -> Self {
        let mut row = ResultRow::new();
        for (column, value) in iter {
            row.insert(column.as_ref(), value);
        }
        row
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<ResultRow>,
}

/// Database driver seam. Implementations own connections, transactions,
/// timeouts and retries; this crate only supplies SQL and bind values.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Run a query whose placeholders are named (`:name`).
    async fn query(&self, sql: &str, params: &BindParams) -> Result<QueryResult>;

    /// Run a statement without parameters or result rows (DDL).
    async fn execute(&self, sql: &str) -> Result<()>;
}
