//! Integration tests for the statistic query builder.
//!
//! These tests exercise the public API: StatisticBuilder, StatisticQuery, Dialect.

use chrono::{DateTime, Utc};
use sqlport::config::StatisticsConfig;
use sqlport::query_builder::{END_PARAM, RATING_PARAM, START_PARAM};
use sqlport::timezone::TimeZoneContext;
use sqlport::{
    build_statistic_query, BindValue, Dialect, MetricKind, ScopeFilter, SqlportError,
    StatisticBuilder, StatisticQuery, TimeRange,
};

// ============================================================================
// Test fixtures
// ============================================================================

fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn app_query(metric: MetricKind) -> StatisticQuery {
    StatisticQuery::new(metric, ScopeFilter::new("app_id", "abc"))
}

fn week() -> TimeRange {
    TimeRange::new(
        Some(utc("2024-01-01T00:00:00Z")),
        Some(utc("2024-01-08T00:00:00Z")),
    )
    .unwrap()
}

// ============================================================================
// Daily counts
// ============================================================================

#[test]
fn postgres_daily_messages_without_range() {
    let built = build_statistic_query(&app_query(MetricKind::DailyMessageCount), Dialect::PostgreSql)
        .unwrap();

    assert_eq!(
        built.sql,
        "SELECT DATE(DATE_TRUNC('day', created_at AT TIME ZONE 'UTC' AT TIME ZONE :tz)) AS date, \
         COUNT(*) AS message_count FROM messages WHERE (app_id = :app_id) \
         GROUP BY date ORDER BY date ASC"
    );
    assert_eq!(built.params.get("app_id"), Some(&BindValue::Text("abc".into())));
    assert_eq!(built.params.get("tz"), Some(&BindValue::Text("UTC".into())));
    assert!(!built.params.contains_key(START_PARAM));
    assert!(!built.params.contains_key(END_PARAM));
    assert_eq!(built.params.len(), 2);
}

#[test]
fn mysql_buckets_with_convert_tz() {
    let query = app_query(MetricKind::DailyConversationCount).with_timezone("Asia/Shanghai");
    let built = build_statistic_query(&query, Dialect::MySql).unwrap();

    assert!(built
        .sql
        .starts_with("SELECT DATE(CONVERT_TZ(created_at, 'UTC', :tz)) AS date"));
    assert!(built
        .sql
        .contains("COUNT(DISTINCT messages.conversation_id) AS conversation_count"));
    assert_eq!(
        built.params.get("tz"),
        Some(&BindValue::Text("Asia/Shanghai".into()))
    );
}

#[test]
fn oracle_repeats_bucket_in_group_by() {
    let built =
        build_statistic_query(&app_query(MetricKind::DailyEndUserCount), Dialect::Oracle).unwrap();
    let bucket = "CAST(TRUNC(FROM_TZ(CAST(created_at AS TIMESTAMP), 'UTC') AT TIME ZONE :tz) AS DATE)";

    assert!(built.sql.starts_with(&format!("SELECT {bucket} AS \"date\"")));
    assert!(built.sql.contains(&format!("GROUP BY {bucket} ORDER BY \"date\" ASC")));
    assert!(built
        .sql
        .contains("COUNT(DISTINCT messages.from_end_user_id) AS terminal_count"));
}

// ============================================================================
// Time range
// ============================================================================

#[test]
fn range_is_half_open_on_every_dialect() {
    for dialect in Dialect::ALL {
        let built =
            build_statistic_query(&app_query(MetricKind::TokenCosts).with_range(week()), dialect)
                .unwrap();

        assert!(
            built.sql.contains("(created_at >= :start) AND (created_at < :end)"),
            "{dialect}: {}",
            built.sql
        );
        assert_eq!(
            built.params.get(START_PARAM),
            Some(&BindValue::Timestamp(utc("2024-01-01T00:00:00Z")))
        );
        assert_eq!(
            built.params.get(END_PARAM),
            Some(&BindValue::Timestamp(utc("2024-01-08T00:00:00Z")))
        );
    }
}

#[test]
fn open_ended_range_binds_one_side() {
    let range = TimeRange::new(Some(utc("2024-01-01T00:00:00Z")), None).unwrap();
    let built = build_statistic_query(
        &app_query(MetricKind::DailyMessageCount).with_range(range),
        Dialect::MySql,
    )
    .unwrap();
    assert!(built.sql.contains("(created_at >= :start)"));
    assert!(!built.sql.contains(":end"));
    assert!(!built.params.contains_key(END_PARAM));
}

#[test]
fn local_boundaries_are_converted_before_binding() {
    let ctx = TimeZoneContext::new("Asia/Shanghai").unwrap();
    let range = ctx
        .range(Some("2024-01-01 08:00"), Some("2024-01-02 08:00"))
        .unwrap();
    let built = build_statistic_query(
        &app_query(MetricKind::DailyMessageCount)
            .with_timezone("Asia/Shanghai")
            .with_range(range),
        Dialect::PostgreSql,
    )
    .unwrap();
    assert_eq!(
        built.params.get(START_PARAM),
        Some(&BindValue::Timestamp(utc("2024-01-01T00:00:00Z")))
    );
    assert_eq!(
        built.params.get(END_PARAM),
        Some(&BindValue::Timestamp(utc("2024-01-02T00:00:00Z")))
    );
}

#[test]
fn inverted_range_is_rejected() {
    let query = StatisticQuery {
        range: TimeRange {
            start: Some(utc("2024-01-02T00:00:00Z")),
            end: Some(utc("2024-01-01T00:00:00Z")),
        },
        ..app_query(MetricKind::DailyMessageCount)
    };
    assert!(matches!(
        build_statistic_query(&query, Dialect::PostgreSql),
        Err(SqlportError::InvalidRange { .. })
    ));
}

// ============================================================================
// Metric-specific shapes
// ============================================================================

#[test]
fn token_costs_sum_both_token_columns() {
    let built =
        build_statistic_query(&app_query(MetricKind::TokenCosts), Dialect::PostgreSql).unwrap();
    assert!(built.sql.contains(
        "(SUM(messages.message_tokens) + SUM(messages.answer_tokens)) AS token_count"
    ));
    assert!(built.sql.contains("SUM(total_price) AS total_price"));
}

#[test]
fn tokens_per_second_guards_zero_latency() {
    let built =
        build_statistic_query(&app_query(MetricKind::TokensPerSecond), Dialect::Oracle).unwrap();
    assert!(built.sql.contains(
        "CASE WHEN (SUM(provider_response_latency) = 0) THEN 0 \
         ELSE (SUM(answer_tokens) / SUM(provider_response_latency)) END AS tokens_per_second"
    ));
}

#[test]
fn satisfaction_binds_rating_and_filters_messages() {
    let config = StatisticsConfig {
        feedback_rating: "thumbs_up".into(),
        ..Default::default()
    };
    let built = StatisticBuilder::from_config(&config)
        .build(
            &app_query(MetricKind::UserSatisfactionRate).with_range(week()),
            Dialect::MySql,
        )
        .unwrap();

    assert!(built.sql.contains(
        "FROM messages m LEFT JOIN message_feedbacks mf \
         ON (mf.message_id = m.id) AND (mf.rating = :rating)"
    ));
    assert!(built.sql.contains("WHERE (m.app_id = :app_id) AND (m.created_at >= :start)"));
    assert!(!built.sql.contains("thumbs_up"));
    assert_eq!(
        built.params.get(RATING_PARAM),
        Some(&BindValue::Text("thumbs_up".into()))
    );
}

#[test]
fn sessions_exclude_overridden_conversations_everywhere() {
    let inner = "SELECT m.conversation_id, COUNT(m.id) AS message_count \
                 FROM conversations c JOIN messages m ON (c.id = m.conversation_id) \
                 WHERE c.override_model_configs IS NULL AND (c.app_id = :app_id) \
                 GROUP BY m.conversation_id";
    for dialect in Dialect::ALL {
        let built =
            build_statistic_query(&app_query(MetricKind::AverageSessionInteractions), dialect)
                .unwrap();
        assert!(built.sql.contains(inner), "{dialect}: {}", built.sql);
        assert!(built.sql.contains(&format!(
            "FROM ({inner}) subquery LEFT JOIN conversations c ON (c.id = subquery.conversation_id)"
        )));
        assert!(built.sql.contains("AVG(subquery.message_count) AS interactions"));
    }
}

// ============================================================================
// Input validation
// ============================================================================

#[test]
fn caller_columns_are_validated() {
    let query = app_query(MetricKind::DailyMessageCount).with_time_field("created_at) OR (1=1");
    assert!(matches!(
        build_statistic_query(&query, Dialect::PostgreSql),
        Err(SqlportError::InvalidColumn(_))
    ));

    let query = StatisticQuery::new(
        MetricKind::DailyMessageCount,
        ScopeFilter::new("app_id; --", "abc"),
    );
    assert!(matches!(
        build_statistic_query(&query, Dialect::MySql),
        Err(SqlportError::InvalidColumn(_))
    ));
}

#[test]
fn scope_values_are_never_interpolated() {
    let query = StatisticQuery::new(
        MetricKind::DailyMessageCount,
        ScopeFilter::new("app_id", "x' OR '1'='1"),
    );
    for dialect in Dialect::ALL {
        let built = build_statistic_query(&query, dialect).unwrap();
        assert!(!built.sql.contains("OR '1'"));
        assert_eq!(
            built.params.get("app_id"),
            Some(&BindValue::Text("x' OR '1'='1".into()))
        );
    }
}

#[test]
fn unknown_timezone_is_rejected() {
    let query = app_query(MetricKind::DailyMessageCount).with_timezone("Mars/Olympus");
    assert!(matches!(
        build_statistic_query(&query, Dialect::PostgreSql),
        Err(SqlportError::InvalidTimezone(_))
    ));
}

#[test]
fn every_metric_builds_on_every_dialect() {
    for metric in MetricKind::ALL {
        for dialect in Dialect::ALL {
            let built = build_statistic_query(&app_query(metric).with_range(week()), dialect)
                .unwrap_or_else(|e| panic!("{metric} on {dialect}: {e}"));
            assert!(built.params.contains_key("tz"));
            assert!(built.sql.contains(":app_id"));
        }
    }
}
