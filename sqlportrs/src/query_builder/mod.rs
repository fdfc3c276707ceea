use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StatisticsConfig;
use crate::dialect::{Dialect, TZ_PARAM};
use crate::error::{Result, SqlportError};
use crate::params::{BindParams, BindValue};
use crate::sql_ast::{SqlBinaryOperator, SqlExpr, SqlRenderer};
use crate::timezone::parse_timezone;

mod filters;
mod metrics;

pub use filters::{END_PARAM, START_PARAM};
pub use metrics::RATING_PARAM;

/// Alias of the bucketed date column in every statistics query.
pub const DATE_ALIAS: &str = "date";

/// Bucketing zone when neither the query nor its datasource names one.
pub const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    DailyMessageCount,
    DailyConversationCount,
    DailyEndUserCount,
    TokenCosts,
    AverageSessionInteractions,
    UserSatisfactionRate,
    AverageResponseTime,
    TokensPerSecond,
}

impl MetricKind {
    pub const ALL: [MetricKind; 8] = [
        MetricKind::DailyMessageCount,
        MetricKind::DailyConversationCount,
        MetricKind::DailyEndUserCount,
        MetricKind::TokenCosts,
        MetricKind::AverageSessionInteractions,
        MetricKind::UserSatisfactionRate,
        MetricKind::AverageResponseTime,
        MetricKind::TokensPerSecond,
    ];

    /// URL slug the statistics endpoints are published under.
    pub fn slug(self) -> &'static str {
        match self {
            MetricKind::DailyMessageCount => "daily-messages",
            MetricKind::DailyConversationCount => "daily-conversations",
            MetricKind::DailyEndUserCount => "daily-end-users",
            MetricKind::TokenCosts => "token-costs",
            MetricKind::AverageSessionInteractions => "average-session-interactions",
            MetricKind::UserSatisfactionRate => "user-satisfaction-rate",
            MetricKind::AverageResponseTime => "average-response-time",
            MetricKind::TokensPerSecond => "tokens-per-second",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for MetricKind {
    type Err = SqlportError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace('_', "-").to_ascii_lowercase();
        MetricKind::ALL
            .into_iter()
            .find(|m| m.slug() == wanted)
            .ok_or_else(|| SqlportError::Config(format!("unknown metric {s}")))
    }
}

/// Half-open UTC interval: `start` inclusive, `end` exclusive. A missing
/// side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => Err(SqlportError::InvalidRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            }),
            _ => Ok(()),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| instant >= start)
            && self.end.map_or(true, |end| instant < end)
    }
}

/// Equality filter scoping a statistic to one owner, e.g. `app_id = :app_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeFilter {
    pub column: String,
    pub value: BindValue,
}

impl ScopeFilter {
    pub fn new(column: impl Into<String>, value: impl Into<BindValue>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Grouping {
    #[default]
    Date,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticQuery {
    pub metric: MetricKind,
    /// UTC timestamp column used for bucketing and range filtering.
    pub time_field: String,
    pub scope: ScopeFilter,
    pub range: TimeRange,
    /// IANA zone the daily buckets are cut in; the datasource's zone when unset.
    pub timezone: Option<String>,
    pub group_by: Grouping,
}

impl StatisticQuery {
    pub fn new(metric: MetricKind, scope: ScopeFilter) -> Self {
        Self {
            metric,
            time_field: "created_at".to_string(),
            scope,
            range: TimeRange::unbounded(),
            timezone: None,
            group_by: Grouping::Date,
        }
    }

    pub fn with_time_field(mut self, field: impl Into<String>) -> Self {
        self.time_field = field.into();
        self
    }

    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn timezone(&self) -> &str {
        self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE)
    }

    pub fn validate(&self) -> Result<()> {
        self.range.validate()?;
        parse_timezone(self.timezone())?;
        Ok(())
    }
}

/// Rendered statement plus the values for its named placeholders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: BindParams,
}

pub struct StatisticBuilder {
    feedback_rating: String,
}

impl Default for StatisticBuilder {
    fn default() -> Self {
        Self::from_config(&StatisticsConfig::default())
    }
}

impl StatisticBuilder {
    pub fn from_config(config: &StatisticsConfig) -> Self {
        Self {
            feedback_rating: config.feedback_rating.clone(),
        }
    }

    /// Build the daily statistic query for `dialect`.
    ///
    /// Every metric shares the same bucketing, scope filter, half-open time
    /// range and `GROUP BY date ORDER BY date` tail; metrics only contribute
    /// their aggregates and source relation.
    pub fn build(&self, query: &StatisticQuery, dialect: Dialect) -> Result<BuiltQuery> {
        query.validate()?;

        let alias = metrics::filter_alias(query.metric);
        let time_column = column_ref(&query.time_field, alias)?;
        let scope_column = column_ref(&query.scope.column, alias)?;
        let scope_param = scope_param_name(&query.scope.column)?;

        let mut params = BindParams::new();
        params.insert(TZ_PARAM, query.timezone());
        params.insert(scope_param.clone(), query.scope.value.clone());

        let mut filters = vec![SqlExpr::binary(
            SqlBinaryOperator::Eq,
            scope_column,
            SqlExpr::Param(scope_param),
        )];
        filters::push_time_range(&mut filters, &mut params, &time_column, &query.range);

        let mut select = metrics::assemble(
            query.metric,
            time_column,
            filters,
            &mut params,
            &self.feedback_rating,
        );
        match query.group_by {
            Grouping::Date => {
                select
                    .group_by
                    .push(SqlExpr::SelectAlias(DATE_ALIAS.to_string()));
                select
                    .order_by
                    .push(SqlExpr::SelectAlias(DATE_ALIAS.to_string()));
            }
        }

        let sql = SqlRenderer::new(dialect.sql()).render_select(&select);
        tracing::debug!(
            metric = %query.metric,
            dialect = %dialect,
            sql_len = sql.len(),
            params = ?params.names().collect::<Vec<_>>(),
            "built statistic query"
        );
        tracing::trace!(sql = %sql, "statistic sql");

        Ok(BuiltQuery { sql, params })
    }
}

fn is_plain_ident(part: &str) -> bool {
    let mut chars = part.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a caller-supplied column into a column expression, qualifying
/// bare names with the metric's filtered relation alias.
pub(crate) fn column_ref(raw: &str, default_table: Option<&str>) -> Result<SqlExpr> {
    let parts: Vec<&str> = raw.split('.').collect();
    if !parts.iter().all(|p| is_plain_ident(p)) {
        return Err(SqlportError::InvalidColumn(raw.to_string()));
    }
    match parts.as_slice() {
        [table, name] => Ok(SqlExpr::column(Some(*table), name)),
        [name] => Ok(SqlExpr::column(default_table, name)),
        _ => Err(SqlportError::InvalidColumn(raw.to_string())),
    }
}

fn scope_param_name(column: &str) -> Result<String> {
    let name = column.rsplit('.').next().unwrap_or(column);
    if [TZ_PARAM, START_PARAM, END_PARAM, RATING_PARAM].contains(&name) {
        return Err(SqlportError::InvalidColumn(format!(
            "{column} collides with a reserved parameter name"
        )));
    }
    Ok(name.to_string())
}

/// Build a statistic query with default settings.
pub fn build_statistic_query(query: &StatisticQuery, dialect: Dialect) -> Result<BuiltQuery> {
    StatisticBuilder::default().build(query, dialect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_injected_columns() {
        for bad in ["created_at; DROP TABLE x", "a.b.c", "1abc", "", "m."] {
            assert!(
                matches!(column_ref(bad, None), Err(SqlportError::InvalidColumn(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn qualifies_bare_columns() {
        assert_eq!(
            column_ref("created_at", Some("m")).unwrap(),
            SqlExpr::column(Some("m"), "created_at")
        );
        assert_eq!(
            column_ref("c.created_at", Some("m")).unwrap(),
            SqlExpr::column(Some("c"), "created_at")
        );
    }

    #[test]
    fn scope_column_cannot_shadow_reserved_params() {
        assert!(scope_param_name("m.tz").is_err());
        assert_eq!(scope_param_name("m.app_id").unwrap(), "app_id");
    }

    #[test]
    fn metric_names_parse_from_slug_or_snake_case() {
        assert_eq!(
            "token-costs".parse::<MetricKind>().unwrap(),
            MetricKind::TokenCosts
        );
        assert_eq!(
            "tokens_per_second".parse::<MetricKind>().unwrap(),
            MetricKind::TokensPerSecond
        );
        assert!("weekly".parse::<MetricKind>().is_err());
    }

    #[test]
    fn range_is_half_open() {
        let start = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let end = DateTime::parse_from_rfc3339("2024-01-02T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let range = TimeRange::new(Some(start), Some(end)).unwrap();
        assert!(range.contains(start));
        assert!(!range.contains(end));
        assert!(TimeRange::unbounded().contains(end));
    }
}
