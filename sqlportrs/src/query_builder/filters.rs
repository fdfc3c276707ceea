use crate::params::{BindParams, BindValue};
use crate::query_builder::TimeRange;
use crate::sql_ast::{SqlBinaryOperator, SqlExpr};

pub const START_PARAM: &str = "start";
pub const END_PARAM: &str = "end";

/// Append the half-open range predicates: `>= :start` and `< :end`.
pub(crate) fn push_time_range(
    filters: &mut Vec<SqlExpr>,
    params: &mut BindParams,
    time_column: &SqlExpr,
    range: &TimeRange,
) {
    if let Some(start) = range.start {
        filters.push(SqlExpr::binary(
            SqlBinaryOperator::Gte,
            time_column.clone(),
            SqlExpr::param(START_PARAM),
        ));
        params.insert(START_PARAM, BindValue::Timestamp(start));
    }
    if let Some(end) = range.end {
        filters.push(SqlExpr::binary(
            SqlBinaryOperator::Lt,
            time_column.clone(),
            SqlExpr::param(END_PARAM),
        ));
        params.insert(END_PARAM, BindValue::Timestamp(end));
    }
}
