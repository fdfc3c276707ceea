#[cfg(feature = "postgres")]
pub mod backends;
pub mod codec;
pub mod config;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod index;
pub mod naming;
pub mod params;
pub mod query_builder;
pub mod registry;
pub mod runtime;
pub mod sql_ast;
pub mod statistics;
pub mod timezone;

pub use codec::{
    decode_column, ColumnCodec, DecodedValue, IdentifierCodec, JsonCodec, LogicalType,
    LongTextCodec, NativeType, NativeValue,
};
pub use config::SqlportConfig;
pub use dialect::{Dialect, SqlDialect};
pub use error::{Result, SqlportError};
pub use executor::{QueryResult, ResultRow, StatementExecutor};
pub use index::{drop_json_index, provision_json_index, JsonIndex, JsonIndexManifest};
pub use params::{BindParams, BindValue};
pub use query_builder::{
    build_statistic_query, BuiltQuery, MetricKind, ScopeFilter, StatisticBuilder,
    StatisticQuery, TimeRange,
};
pub use registry::DialectRegistry;
pub use runtime::{run_statistic, run_statistics, StatisticsService};
pub use statistics::{StatisticPoint, StatisticValue};
pub use timezone::TimeZoneContext;
