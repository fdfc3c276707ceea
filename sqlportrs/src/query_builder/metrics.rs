//! Aggregates and source relations per metric.

use crate::params::BindParams;
use crate::query_builder::MetricKind;
use crate::query_builder::DATE_ALIAS;
use crate::sql_ast::{
    Aggregation, Join, SelectItem, SelectQuery, SqlBinaryOperator, SqlExpr, SqlJoinType, TableRef,
};

pub const RATING_PARAM: &str = "rating";

const MESSAGES: &str = "messages";
const CONVERSATIONS: &str = "conversations";
const FEEDBACKS: &str = "message_feedbacks";
const SUBQUERY: &str = "subquery";

/// Alias of the relation the scope and time-range filters apply to.
pub(crate) fn filter_alias(metric: MetricKind) -> Option<&'static str> {
    match metric {
        MetricKind::AverageSessionInteractions => Some("c"),
        MetricKind::UserSatisfactionRate => Some("m"),
        _ => None,
    }
}

fn col(table: &str, name: &str) -> SqlExpr {
    SqlExpr::column(Some(table), name)
}

fn bare(name: &str) -> SqlExpr {
    SqlExpr::column(None, name)
}

fn item(expr: SqlExpr, alias: &str) -> SelectItem {
    SelectItem {
        expr,
        alias: Some(alias.to_string()),
    }
}

fn eq(left: SqlExpr, right: SqlExpr) -> SqlExpr {
    SqlExpr::binary(SqlBinaryOperator::Eq, left, right)
}

fn sum(expr: SqlExpr) -> SqlExpr {
    SqlExpr::aggregate(Aggregation::Sum, expr)
}

/// Assemble the statement for `metric`. `filters` already holds the scope
/// and time-range predicates and is placed on the filtered relation.
pub(crate) fn assemble(
    metric: MetricKind,
    time_column: SqlExpr,
    filters: Vec<SqlExpr>,
    params: &mut BindParams,
    feedback_rating: &str,
) -> SelectQuery {
    let bucket = item(SqlExpr::DateBucket(Box::new(time_column)), DATE_ALIAS);
    let from_messages = TableRef::table(MESSAGES, None);

    match metric {
        MetricKind::DailyMessageCount => SelectQuery {
            select: vec![
                bucket,
                item(
                    SqlExpr::aggregate(Aggregation::Count, SqlExpr::Star),
                    "message_count",
                ),
            ],
            from: from_messages,
            filters,
            ..Default::default()
        },
        MetricKind::DailyConversationCount => SelectQuery {
            select: vec![
                bucket,
                item(
                    SqlExpr::aggregate(
                        Aggregation::CountDistinct,
                        col(MESSAGES, "conversation_id"),
                    ),
                    "conversation_count",
                ),
            ],
            from: from_messages,
            filters,
            ..Default::default()
        },
        MetricKind::DailyEndUserCount => SelectQuery {
            select: vec![
                bucket,
                item(
                    SqlExpr::aggregate(
                        Aggregation::CountDistinct,
                        col(MESSAGES, "from_end_user_id"),
                    ),
                    "terminal_count",
                ),
            ],
            from: from_messages,
            filters,
            ..Default::default()
        },
        MetricKind::TokenCosts => SelectQuery {
            select: vec![
                bucket,
                item(
                    SqlExpr::binary(
                        SqlBinaryOperator::Add,
                        sum(col(MESSAGES, "message_tokens")),
                        sum(col(MESSAGES, "answer_tokens")),
                    ),
                    "token_count",
                ),
                item(sum(bare("total_price")), "total_price"),
            ],
            from: from_messages,
            filters,
            ..Default::default()
        },
        MetricKind::AverageResponseTime => SelectQuery {
            select: vec![
                bucket,
                item(
                    SqlExpr::aggregate(Aggregation::Avg, bare("provider_response_latency")),
                    "latency",
                ),
            ],
            from: from_messages,
            filters,
            ..Default::default()
        },
        MetricKind::TokensPerSecond => {
            let latency = sum(bare("provider_response_latency"));
            // A day with no recorded latency reports zero throughput.
            let guarded = SqlExpr::Case {
                branches: vec![(eq(latency.clone(), SqlExpr::Number(0)), SqlExpr::Number(0))],
                else_expr: Box::new(SqlExpr::binary(
                    SqlBinaryOperator::Divide,
                    sum(bare("answer_tokens")),
                    latency,
                )),
            };
            SelectQuery {
                select: vec![bucket, item(guarded, "tokens_per_second")],
                from: from_messages,
                filters,
                ..Default::default()
            }
        }
        MetricKind::UserSatisfactionRate => {
            params.insert(RATING_PARAM, feedback_rating);
            SelectQuery {
                select: vec![
                    bucket,
                    item(
                        SqlExpr::aggregate(Aggregation::Count, col("m", "id")),
                        "message_count",
                    ),
                    item(
                        SqlExpr::aggregate(Aggregation::Count, col("mf", "id")),
                        "feedback_count",
                    ),
                ],
                from: TableRef::table(MESSAGES, Some("m")),
                joins: vec![Join {
                    join_type: SqlJoinType::Left,
                    table: TableRef::table(FEEDBACKS, Some("mf")),
                    on: vec![
                        eq(col("mf", "message_id"), col("m", "id")),
                        eq(col("mf", "rating"), SqlExpr::param(RATING_PARAM)),
                    ],
                }],
                filters,
                ..Default::default()
            }
        }
        MetricKind::AverageSessionInteractions => {
            // Conversations with a per-conversation model override are
            // excluded on every engine.
            let mut inner_filters = vec![SqlExpr::IsNull(Box::new(col(
                "c",
                "override_model_configs",
            )))];
            inner_filters.extend(filters);
            let per_conversation = SelectQuery {
                select: vec![
                    SelectItem {
                        expr: col("m", "conversation_id"),
                        alias: None,
                    },
                    item(
                        SqlExpr::aggregate(Aggregation::Count, col("m", "id")),
                        "message_count",
                    ),
                ],
                from: TableRef::table(CONVERSATIONS, Some("c")),
                joins: vec![Join {
                    join_type: SqlJoinType::Inner,
                    table: TableRef::table(MESSAGES, Some("m")),
                    on: vec![eq(col("c", "id"), col("m", "conversation_id"))],
                }],
                filters: inner_filters,
                group_by: vec![col("m", "conversation_id")],
                ..Default::default()
            };
            SelectQuery {
                select: vec![
                    bucket,
                    item(
                        SqlExpr::aggregate(Aggregation::Avg, col(SUBQUERY, "message_count")),
                        "interactions",
                    ),
                ],
                from: TableRef::subquery(per_conversation, SUBQUERY),
                joins: vec![Join {
                    join_type: SqlJoinType::Left,
                    table: TableRef::table(CONVERSATIONS, Some("c")),
                    on: vec![eq(col("c", "id"), col(SUBQUERY, "conversation_id"))],
                }],
                ..Default::default()
            }
        }
    }
}
