use crate::dialect::SqlDialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Count,
    CountDistinct,
    Sum,
    Avg,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    Column {
        table: Option<String>,
        name: String,
    },
    /// Named bind placeholder; the value travels in `BindParams`.
    Param(String),
    Number(i64),
    Star,
    /// Timezone-converted calendar date of a UTC timestamp column.
    DateBucket(Box<SqlExpr>),
    /// Reference to a select-list alias (GROUP BY / ORDER BY).
    SelectAlias(String),
    Aggregate {
        agg: Aggregation,
        expr: Box<SqlExpr>,
    },
    Case {
        branches: Vec<(SqlExpr, SqlExpr)>,
        else_expr: Box<SqlExpr>,
    },
    BinaryOp {
        op: SqlBinaryOperator,
        left: Box<SqlExpr>,
        right: Box<SqlExpr>,
    },
    IsNull(Box<SqlExpr>),
}

impl SqlExpr {
    pub fn column(table: Option<&str>, name: &str) -> Self {
        SqlExpr::Column {
            table: table.map(str::to_string),
            name: name.to_string(),
        }
    }

    pub fn param(name: &str) -> Self {
        SqlExpr::Param(name.to_string())
    }

    pub fn aggregate(agg: Aggregation, expr: SqlExpr) -> Self {
        SqlExpr::Aggregate {
            agg,
            expr: Box::new(expr),
        }
    }

    pub fn binary(op: SqlBinaryOperator, left: SqlExpr, right: SqlExpr) -> Self {
        SqlExpr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlBinaryOperator {
    Add,
    Divide,
    Eq,
    Gte,
    Lt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: SqlExpr,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
    pub subquery: Option<Box<SelectQuery>>,
}

impl TableRef {
    pub fn table(name: &str, alias: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            alias: alias.map(str::to_string),
            subquery: None,
        }
    }

    pub fn subquery(query: SelectQuery, alias: &str) -> Self {
        Self {
            name: String::new(),
            alias: Some(alias.to_string()),
            subquery: Some(Box::new(query)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlJoinType {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: SqlJoinType,
    pub table: TableRef,
    pub on: Vec<SqlExpr>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub select: Vec<SelectItem>,
    pub from: TableRef,
    pub joins: Vec<Join>,
    pub filters: Vec<SqlExpr>,
    pub group_by: Vec<SqlExpr>,
    /// Ascending sort keys.
    pub order_by: Vec<SqlExpr>,
}

pub struct SqlRenderer<'d> {
    dialect: &'d dyn SqlDialect,
}

impl<'d> SqlRenderer<'d> {
    pub fn new(dialect: &'d dyn SqlDialect) -> Self {
        Self { dialect }
    }

    pub fn render_select(&self, query: &SelectQuery) -> String {
        let select_items: Vec<String> = query
            .select
            .iter()
            .map(|item| {
                let expr_sql = self.render_expr(&item.expr);
                match &item.alias {
                    Some(alias) => format!("{expr_sql} AS {}", self.dialect.render_alias(alias)),
                    None => expr_sql,
                }
            })
            .collect();

        let mut sql = format!(
            "SELECT {} FROM {}",
            select_items.join(", "),
            self.render_table_ref(&query.from)
        );

        for join in &query.joins {
            let join_kw = match join.join_type {
                SqlJoinType::Inner => "JOIN",
                SqlJoinType::Left => "LEFT JOIN",
            };
            let on_clause: Vec<String> = join.on.iter().map(|e| self.render_expr(e)).collect();
            sql.push_str(&format!(
                " {join_kw} {} ON {}",
                self.render_table_ref(&join.table),
                on_clause.join(" AND ")
            ));
        }

        if !query.filters.is_empty() {
            let filters: Vec<String> = query.filters.iter().map(|f| self.render_expr(f)).collect();
            sql.push_str(&format!(" WHERE {}", filters.join(" AND ")));
        }

        if !query.group_by.is_empty() {
            let groups: Vec<String> = query
                .group_by
                .iter()
                .map(|g| self.render_group_target(g, query))
                .collect();
            sql.push_str(&format!(" GROUP BY {}", groups.join(", ")));
        }

        if !query.order_by.is_empty() {
            let orders: Vec<String> = query
                .order_by
                .iter()
                .map(|o| format!("{} ASC", self.render_expr(o)))
                .collect();
            sql.push_str(&format!(" ORDER BY {}", orders.join(", ")));
        }

        sql
    }

    /// Engines that cannot group by a select alias get the aliased
    /// expression repeated instead.
    fn render_group_target(&self, expr: &SqlExpr, query: &SelectQuery) -> String {
        if let SqlExpr::SelectAlias(alias) = expr {
            if !self.dialect.supports_group_by_alias() {
                if let Some(item) = query
                    .select
                    .iter()
                    .find(|item| item.alias.as_deref() == Some(alias.as_str()))
                {
                    return self.render_expr(&item.expr);
                }
            }
        }
        self.render_expr(expr)
    }

    fn render_table_ref(&self, table: &TableRef) -> String {
        // Oracle rejects `AS` before table aliases, so none of the engines get it.
        let base = match &table.subquery {
            Some(subquery) => format!("({})", self.render_select(subquery)),
            None => table.name.clone(),
        };
        match &table.alias {
            Some(alias) => format!("{base} {alias}"),
            None => base,
        }
    }

    fn render_expr(&self, expr: &SqlExpr) -> String {
        match expr {
            SqlExpr::Column { table, name } => match table {
                Some(t) => format!("{t}.{name}"),
                None => name.clone(),
            },
            SqlExpr::Param(name) => self.dialect.placeholder(name),
            SqlExpr::Number(n) => n.to_string(),
            SqlExpr::Star => "*".to_string(),
            SqlExpr::DateBucket(inner) => {
                let field = self.render_expr(inner);
                self.dialect
                    .date_cast(&self.dialect.bucket_expression(&field))
            }
            SqlExpr::SelectAlias(alias) => self.dialect.render_alias(alias),
            SqlExpr::Aggregate { agg, expr } => self
                .dialect
                .render_aggregation(agg, &self.render_expr(expr)),
            SqlExpr::Case {
                branches,
                else_expr,
            } => {
                let mut parts = Vec::new();
                parts.push("CASE".to_string());
                for (when, then) in branches {
                    parts.push(format!(
                        " WHEN {} THEN {}",
                        self.render_expr(when),
                        self.render_expr(then)
                    ));
                }
                parts.push(format!(" ELSE {} END", self.render_expr(else_expr)));
                parts.join("")
            }
            SqlExpr::BinaryOp { op, left, right } => {
                let op_sql = match op {
                    SqlBinaryOperator::Add => "+",
                    SqlBinaryOperator::Divide => "/",
                    SqlBinaryOperator::Eq => "=",
                    SqlBinaryOperator::Gte => ">=",
                    SqlBinaryOperator::Lt => "<",
                };
                format!(
                    "({} {} {})",
                    self.render_expr(left),
                    op_sql,
                    self.render_expr(right)
                )
            }
            SqlExpr::IsNull(expr) => format!("{} IS NULL", self.render_expr(expr)),
        }
    }
}
