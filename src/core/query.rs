//! Statements and a small table-query builder.
//!
//! A [`Statement`] is SQL text with `?` placeholders plus positional
//! [`Binding`]s. Date bounds always travel as bindings, never as literals in
//! the SQL text.
//!
//! [`TableQuery`] compiles a chain of `select`/`filter`/`group_by`/`agg`/
//! `sort` calls against one view into a single `SELECT`. Filters always land
//! in the `WHERE` clause of the base view regardless of call order.

use std::fmt;

use chrono::NaiveDate;

/// A positional bind value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Date(NaiveDate),
    Text(String),
}

impl Binding {
    /// SQL API type name.
    #[must_use]
    pub const fn sql_type(&self) -> &'static str {
        match self {
            Self::Date(_) => "DATE",
            Self::Text(_) => "TEXT",
        }
    }

    /// Value as sent on the wire.
    #[must_use]
    pub fn wire_value(&self) -> String {
        match self {
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Text(t) => t.clone(),
        }
    }
}

impl From<NaiveDate> for Binding {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// SQL text plus its positional bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub bindings: Vec<Binding>,
}

impl Statement {
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }

    /// Append the next positional binding.
    #[must_use]
    pub fn bind(mut self, value: impl Into<Binding>) -> Self {
        self.bindings.push(value.into());
        self
    }

    /// Number of `?` placeholders in the SQL text.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// A filter predicate over the base view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Inclusive `column BETWEEN low AND high`.
    Between {
        column: String,
        low: Binding,
        high: Binding,
    },
}

impl Predicate {
    #[must_use]
    pub fn between(
        column: impl Into<String>,
        low: impl Into<Binding>,
        high: impl Into<Binding>,
    ) -> Self {
        Self::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    fn render(&self, sql: &mut String, bindings: &mut Vec<Binding>) {
        match self {
            Self::Between { column, low, high } => {
                sql.push_str(column);
                sql.push_str(" BETWEEN ? AND ?");
                bindings.push(low.clone());
                bindings.push(high.clone());
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Sum,
    Avg,
    Count,
}

impl AggFunc {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Count => "COUNT",
        }
    }
}

/// An aggregate projection: `FUNC(expr)[::FLOAT] [AS alias]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agg {
    func: AggFunc,
    expr: String,
    cast_float: bool,
    alias: Option<String>,
}

impl Agg {
    #[must_use]
    pub fn sum(expr: impl Into<String>) -> Self {
        Self::new(AggFunc::Sum, expr)
    }

    #[must_use]
    pub fn avg(expr: impl Into<String>) -> Self {
        Self::new(AggFunc::Avg, expr)
    }

    #[must_use]
    pub fn count(expr: impl Into<String>) -> Self {
        Self::new(AggFunc::Count, expr)
    }

    fn new(func: AggFunc, expr: impl Into<String>) -> Self {
        Self {
            func,
            expr: expr.into(),
            cast_float: false,
            alias: None,
        }
    }

    #[must_use]
    pub const fn cast_float(mut self) -> Self {
        self.cast_float = true;
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    fn render(&self) -> String {
        let mut out = format!("{}({})", self.func.keyword(), self.expr);
        if self.cast_float {
            out.push_str("::FLOAT");
        }
        if let Some(alias) = &self.alias {
            out.push_str(" AS ");
            out.push_str(alias);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Builder for a single-view `SELECT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    table: String,
    columns: Vec<String>,
    aggregates: Vec<Agg>,
    filters: Vec<Predicate>,
    group_by: Vec<String>,
    order_by: Vec<(String, SortOrder)>,
}

impl TableQuery {
    /// Start a query over a fully qualified view name.
    #[must_use]
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            table: name.into(),
            columns: Vec::new(),
            aggregates: Vec::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
        }
    }

    #[must_use]
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Group by the given columns. Plain selected columns not in the group
    /// key are dropped from the projection, as a grouped frame would.
    #[must_use]
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn agg(mut self, agg: Agg) -> Self {
        self.aggregates.push(agg);
        self
    }

    #[must_use]
    pub fn sort(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    /// Compile to `SELECT COUNT(*) AS ROW_COUNT` over the filtered view.
    #[must_use]
    pub fn count(self) -> Statement {
        if !self.is_plain() {
            let inner = self.to_statement();
            return Statement {
                sql: format!("SELECT COUNT(*) AS ROW_COUNT FROM ({})", inner.sql),
                bindings: inner.bindings,
            };
        }

        let mut sql = format!("SELECT COUNT(*) AS ROW_COUNT FROM {}", self.table);
        let mut bindings = Vec::new();
        self.render_where(&mut sql, &mut bindings);
        Statement { sql, bindings }
    }

    /// Compile to a [`Statement`].
    #[must_use]
    pub fn to_statement(self) -> Statement {
        let projection = self.projection();
        let mut sql = format!("SELECT {} FROM {}", projection.join(", "), self.table);
        let mut bindings = Vec::new();
        self.render_where(&mut sql, &mut bindings);

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if !self.order_by.is_empty() {
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|(col, order)| match order {
                    SortOrder::Asc => format!("{col} ASC"),
                    SortOrder::Desc => format!("{col} DESC NULLS LAST"),
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        Statement { sql, bindings }
    }

    fn is_plain(&self) -> bool {
        self.columns.is_empty() && self.aggregates.is_empty() && self.group_by.is_empty()
    }

    fn projection(&self) -> Vec<String> {
        let mut out = if !self.group_by.is_empty() {
            self.group_by.clone()
        } else if self.aggregates.is_empty() {
            self.columns.clone()
        } else {
            Vec::new()
        };
        out.extend(self.aggregates.iter().map(Agg::render));
        if out.is_empty() {
            out.push("*".to_string());
        }
        out
    }

    fn render_where(&self, sql: &mut String, bindings: &mut Vec<Binding>) {
        for (idx, predicate) in self.filters.iter().enumerate() {
            sql.push_str(if idx == 0 { " WHERE " } else { " AND " });
            predicate.render(sql, bindings);
        }
    }
}
