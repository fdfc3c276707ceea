//! Typed daily statistic points finalized from raw result rows.
//!
//! Ratios are rounded to 2 places, latency and throughput to 4, half to
//! even. A zero denominator yields 0 rather than an error.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::StatisticsConfig;
use crate::error::{Result, SqlportError};
use crate::executor::ResultRow;
use crate::query_builder::{MetricKind, DATE_ALIAS};

pub const INTERACTIONS_PRECISION: u32 = 2;
pub const SATISFACTION_PRECISION: u32 = 2;
pub const LATENCY_PRECISION: u32 = 4;
pub const TOKENS_PER_SECOND_PRECISION: u32 = 4;

/// Satisfaction is reported per thousand messages.
const SATISFACTION_SCALE: i64 = 1000;
const MILLIS_PER_SECOND: i64 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub enum StatisticValue {
    MessageCount(i64),
    ConversationCount(i64),
    TerminalCount(i64),
    TokenCosts {
        token_count: i64,
        total_price: f64,
        currency: String,
    },
    Interactions(f64),
    SatisfactionRate(f64),
    LatencyMs(f64),
    TokensPerSecond(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticPoint {
    pub date: NaiveDate,
    pub value: StatisticValue,
}

/// Flat `{"date": "...", <metric fields>}` objects.
impl Serialize for StatisticPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(DATE_ALIAS, &self.date.format("%Y-%m-%d").to_string())?;
        match &self.value {
            StatisticValue::MessageCount(n) => map.serialize_entry("message_count", n)?,
            StatisticValue::ConversationCount(n) => map.serialize_entry("conversation_count", n)?,
            StatisticValue::TerminalCount(n) => map.serialize_entry("terminal_count", n)?,
            StatisticValue::TokenCosts {
                token_count,
                total_price,
                currency,
            } => {
                map.serialize_entry("token_count", token_count)?;
                map.serialize_entry("total_price", total_price)?;
                map.serialize_entry("currency", currency)?;
            }
            StatisticValue::Interactions(v) => map.serialize_entry("interactions", v)?,
            StatisticValue::SatisfactionRate(v) => map.serialize_entry("rate", v)?,
            StatisticValue::LatencyMs(v) => map.serialize_entry("latency", v)?,
            StatisticValue::TokensPerSecond(v) => map.serialize_entry("tps", v)?,
        }
        map.end()
    }
}

fn to_float(value: Decimal) -> Result<f64> {
    value
        .to_f64()
        .ok_or_else(|| SqlportError::Decode(format!("{value} does not fit a float")))
}

/// Banker's rounding to `places`, reported as a float.
pub fn round_to(value: Decimal, places: u32) -> Result<f64> {
    to_float(value.round_dp(places))
}

fn count(row: &ResultRow, column: &str) -> Result<i64> {
    Ok(row.require(column)?.as_i64()?.unwrap_or(0))
}

fn number(row: &ResultRow, column: &str) -> Result<Decimal> {
    Ok(row.require(column)?.as_decimal()?.unwrap_or(Decimal::ZERO))
}

pub struct StatisticFinalizer {
    currency: String,
}

impl Default for StatisticFinalizer {
    fn default() -> Self {
        Self::from_config(&StatisticsConfig::default())
    }
}

impl StatisticFinalizer {
    pub fn from_config(config: &StatisticsConfig) -> Self {
        Self {
            currency: config.currency.clone(),
        }
    }

    pub fn finalize(&self, metric: MetricKind, rows: &[ResultRow]) -> Result<Vec<StatisticPoint>> {
        rows.iter().map(|row| self.finalize_row(metric, row)).collect()
    }

    pub fn finalize_row(&self, metric: MetricKind, row: &ResultRow) -> Result<StatisticPoint> {
        let date = row
            .require(DATE_ALIAS)?
            .as_date()?
            .ok_or_else(|| SqlportError::Decode("null date bucket".to_string()))?;

        let value = match metric {
            MetricKind::DailyMessageCount => {
                StatisticValue::MessageCount(count(row, "message_count")?)
            }
            MetricKind::DailyConversationCount => {
                StatisticValue::ConversationCount(count(row, "conversation_count")?)
            }
            MetricKind::DailyEndUserCount => {
                StatisticValue::TerminalCount(count(row, "terminal_count")?)
            }
            MetricKind::TokenCosts => StatisticValue::TokenCosts {
                token_count: count(row, "token_count")?,
                total_price: to_float(number(row, "total_price")?)?,
                currency: self.currency.clone(),
            },
            MetricKind::AverageSessionInteractions => StatisticValue::Interactions(round_to(
                number(row, "interactions")?,
                INTERACTIONS_PRECISION,
            )?),
            MetricKind::UserSatisfactionRate => {
                let messages = count(row, "message_count")?;
                let feedbacks = count(row, "feedback_count")?;
                let rate = if messages > 0 {
                    Decimal::from(feedbacks) * Decimal::from(SATISFACTION_SCALE)
                        / Decimal::from(messages)
                } else {
                    Decimal::ZERO
                };
                StatisticValue::SatisfactionRate(round_to(rate, SATISFACTION_PRECISION)?)
            }
            MetricKind::AverageResponseTime => StatisticValue::LatencyMs(round_to(
                number(row, "latency")? * Decimal::from(MILLIS_PER_SECOND),
                LATENCY_PRECISION,
            )?),
            MetricKind::TokensPerSecond => StatisticValue::TokensPerSecond(round_to(
                number(row, "tokens_per_second")?,
                TOKENS_PER_SECOND_PRECISION,
            )?),
        };

        Ok(StatisticPoint { date, value })
    }
}
