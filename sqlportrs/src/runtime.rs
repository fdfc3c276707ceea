use std::borrow::Cow;
use std::time::Instant;

use futures::future::try_join_all;

use crate::config::{ResolvedDatasourceConfig, SqlportConfig};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::executor::StatementExecutor;
use crate::query_builder::{StatisticBuilder, StatisticQuery, DEFAULT_TIMEZONE};
use crate::statistics::{StatisticFinalizer, StatisticPoint};

/// Builds, executes and finalizes statistic queries against one datasource.
pub struct StatisticsService<'a> {
    executor: &'a dyn StatementExecutor,
    dialect: Dialect,
    /// Applied to queries that leave their timezone unset.
    timezone: String,
    builder: StatisticBuilder,
    finalizer: StatisticFinalizer,
}

impl<'a> StatisticsService<'a> {
    pub fn new(executor: &'a dyn StatementExecutor, dialect: Dialect) -> Self {
        Self {
            executor,
            dialect,
            timezone: DEFAULT_TIMEZONE.to_string(),
            builder: StatisticBuilder::default(),
            finalizer: StatisticFinalizer::default(),
        }
    }

    /// Service for the named datasource, with its dialect, timezone and
    /// statistics settings taken from `config`.
    pub fn from_config(
        executor: &'a dyn StatementExecutor,
        config: &SqlportConfig,
        datasource: &str,
    ) -> Self {
        let ResolvedDatasourceConfig {
            dialect, timezone, ..
        } = config.for_datasource(datasource);
        Self {
            executor,
            dialect,
            timezone,
            builder: StatisticBuilder::from_config(&config.statistics),
            finalizer: StatisticFinalizer::from_config(&config.statistics),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub async fn run(&self, query: &StatisticQuery) -> Result<Vec<StatisticPoint>> {
        let query = match query.timezone {
            Some(_) => Cow::Borrowed(query),
            None => Cow::Owned(query.clone().with_timezone(self.timezone.as_str())),
        };
        let built = self.builder.build(&query, self.dialect)?;
        let started = Instant::now();
        let result = self.executor.query(&built.sql, &built.params).await?;
        tracing::debug!(
            metric = %query.metric,
            dialect = %self.dialect,
            rows = result.rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "statistic query executed"
        );
        self.finalizer.finalize(query.metric, &result.rows)
    }

    /// Run several statistics concurrently; the first failure aborts the batch.
    pub async fn run_all(&self, queries: &[StatisticQuery]) -> Result<Vec<Vec<StatisticPoint>>> {
        try_join_all(queries.iter().map(|query| self.run(query))).await
    }
}

/// Build, execute and finalize one statistic with default settings.
pub async fn run_statistic(
    executor: &dyn StatementExecutor,
    query: &StatisticQuery,
    dialect: Dialect,
) -> Result<Vec<StatisticPoint>> {
    StatisticsService::new(executor, dialect).run(query).await
}

/// Run several statistics concurrently with default settings.
pub async fn run_statistics(
    executor: &dyn StatementExecutor,
    queries: &[StatisticQuery],
    dialect: Dialect,
) -> Result<Vec<Vec<StatisticPoint>>> {
    StatisticsService::new(executor, dialect)
        .run_all(queries)
        .await
}
