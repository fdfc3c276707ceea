//! SQL dialect abstractions for the supported engines.
//!
//! `Dialect` is the closed tag callers pass around; each tag maps to exactly
//! one `SqlDialect` implementation living in its own file.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::{LogicalType, NativeType};
use crate::error::{Result, SqlportError};
use crate::sql_ast::Aggregation;

mod mysql;
mod oracle;
mod postgres;

pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;

/// Name of the bind parameter carrying the caller's IANA timezone.
pub const TZ_PARAM: &str = "tz";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dialect {
    MySql,
    PostgreSql,
    Oracle,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::MySql, Dialect::PostgreSql, Dialect::Oracle];

    pub fn name(self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::PostgreSql => "postgresql",
            Dialect::Oracle => "oracle",
        }
    }

    /// The SQL rendering rules for this engine.
    pub fn sql(self) -> &'static dyn SqlDialect {
        match self {
            Dialect::MySql => &MySqlDialect,
            Dialect::PostgreSql => &PostgresDialect,
            Dialect::Oracle => &OracleDialect,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = SqlportError;

    fn from_str(s: &str) -> Result<Self> {
        crate::registry::DialectRegistry::global().resolve(s)
    }
}

impl Serialize for Dialect {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Dialect {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Dialects render identifiers and the engine-specific pieces of a
/// statistics query. Clause assembly lives in the query builder; the
/// dialect only maps logical constructs to SQL fragments.
pub trait SqlDialect: Send + Sync {
    fn tag(&self) -> Dialect;

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Render a column alias. Most engines accept bare aliases.
    fn render_alias(&self, alias: &str) -> String {
        alias.to_string()
    }

    fn placeholder(&self, name: &str) -> String {
        format!(":{name}")
    }

    /// Convert a stored UTC timestamp column into the caller's zone,
    /// truncated to the day. Bound to the `tz` parameter.
    fn bucket_expression(&self, field: &str) -> String;

    /// Cast a bucket expression to a calendar date.
    fn date_cast(&self, expr: &str) -> String {
        format!("DATE({expr})")
    }

    fn supports_group_by_alias(&self) -> bool {
        true
    }

    fn render_aggregation(&self, agg: &Aggregation, expr: &str) -> String {
        match agg {
            Aggregation::Count => format!("COUNT({expr})"),
            Aggregation::CountDistinct => format!("COUNT(DISTINCT {expr})"),
            Aggregation::Sum => format!("SUM({expr})"),
            Aggregation::Avg => format!("AVG({expr})"),
        }
    }

    /// Native column type backing a logical application type.
    fn native_type(&self, logical: LogicalType) -> NativeType;
}
