//! Tabular statement results.
//!
//! The SQL API returns every value as a nullable string. [`ResultSet`] keeps
//! them that way and decodes on access, by column name.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SfcostError};

/// Column metadata from `resultSetMetaData.rowType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type", default)]
    pub sql_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

const fn default_nullable() -> bool {
    true
}

impl ColumnMeta {
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: true,
        }
    }
}

/// A fully fetched result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    columns: Vec<ColumnMeta>,
    rows: Vec<Vec<Option<String>>>,
}

impl ResultSet {
    #[must_use]
    pub const fn new(columns: Vec<ColumnMeta>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append rows from a later partition.
    pub fn extend_rows(&mut self, rows: impl IntoIterator<Item = Vec<Option<String>>>) {
        self.rows.extend(rows);
    }

    /// Column position by case-insensitive name.
    ///
    /// # Errors
    ///
    /// Returns [`SfcostError::MissingColumn`] if absent.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| SfcostError::MissingColumn(name.to_string()))
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row { set: self, values })
    }

    /// The first row of a single-value aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`SfcostError::EmptyResult`] naming `what` when there are no rows.
    pub fn first_row(&self, what: &str) -> Result<Row<'_>> {
        self.rows()
            .next()
            .ok_or_else(|| SfcostError::EmptyResult(what.to_string()))
    }
}

/// A borrowed row with typed accessors.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    set: &'a ResultSet,
    values: &'a [Option<String>],
}

impl<'a> Row<'a> {
    /// Raw value; `None` for SQL NULL.
    ///
    /// # Errors
    ///
    /// Returns [`SfcostError::MissingColumn`] if the column does not exist.
    pub fn raw(&self, column: &str) -> Result<Option<&'a str>> {
        let idx = self.set.column_index(column)?;
        Ok(self.values.get(idx).and_then(|v| v.as_deref()))
    }

    fn required(&self, column: &str) -> Result<&'a str> {
        self.raw(column)?
            .ok_or_else(|| SfcostError::NullValue(column.to_string()))
    }

    /// Required text value.
    ///
    /// # Errors
    ///
    /// NULL yields [`SfcostError::NullValue`].
    pub fn text(&self, column: &str) -> Result<String> {
        self.required(column).map(str::to_string)
    }

    /// Text value, NULL as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`SfcostError::MissingColumn`] if the column does not exist.
    pub fn opt_text(&self, column: &str) -> Result<Option<String>> {
        Ok(self.raw(column)?.map(str::to_string))
    }

    /// Required numeric value.
    ///
    /// # Errors
    ///
    /// NULL yields [`SfcostError::NullValue`]; non-numeric text yields
    /// [`SfcostError::ParseValue`].
    pub fn f64(&self, column: &str) -> Result<f64> {
        parse_f64(column, self.required(column)?)
    }

    /// Optional numeric value.
    ///
    /// # Errors
    ///
    /// Non-numeric text yields [`SfcostError::ParseValue`].
    pub fn opt_f64(&self, column: &str) -> Result<Option<f64>> {
        self.raw(column)?.map(|v| parse_f64(column, v)).transpose()
    }

    /// Required non-negative integer.
    ///
    /// # Errors
    ///
    /// NULL yields [`SfcostError::NullValue`]; anything but an unsigned
    /// integer yields [`SfcostError::ParseValue`].
    pub fn u64(&self, column: &str) -> Result<u64> {
        parse_u64(column, self.required(column)?)
    }

    /// Optional non-negative integer.
    ///
    /// # Errors
    ///
    /// See [`Row::u64`].
    pub fn opt_u64(&self, column: &str) -> Result<Option<u64>> {
        self.raw(column)?.map(|v| parse_u64(column, v)).transpose()
    }

    /// Optional timestamp, decoded from the SQL API wire form.
    ///
    /// # Errors
    ///
    /// Unrecognised text yields [`SfcostError::ParseValue`].
    pub fn opt_timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>> {
        self.raw(column)?
            .map(|v| {
                parse_timestamp(v).ok_or_else(|| SfcostError::ParseValue {
                    column: column.to_string(),
                    value: v.to_string(),
                    expected: "timestamp",
                })
            })
            .transpose()
    }

}

fn parse_f64(column: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| SfcostError::ParseValue {
            column: column.to_string(),
            value: value.to_string(),
            expected: "number",
        })
}

fn parse_u64(column: &str, value: &str) -> Result<u64> {
    let trimmed = value.trim();
    // FIXED columns may arrive as "12" or "12.000" depending on the expression
    let integral = match trimmed.split_once('.') {
        Some((int, frac)) if frac.chars().all(|c| c == '0') => int,
        _ => trimmed,
    };
    integral.parse::<u64>().map_err(|_| SfcostError::ParseValue {
        column: column.to_string(),
        value: value.to_string(),
        expected: "unsigned integer",
    })
}

/// Decode `seconds[.fraction][ offset]`.
///
/// `TIMESTAMP_TZ` values carry a trailing offset (minutes + 1440). The
/// leading number is always UTC seconds, so the offset does not move the
/// instant.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let mut parts = value.split_whitespace();
    let epoch = parts.next()?;
    if let Some(offset) = parts.next() {
        let minutes = offset.parse::<i32>().ok()?;
        FixedOffset::east_opt((minutes - 1440) * 60)?;
    }

    let (secs, frac) = epoch.split_once('.').unwrap_or((epoch, ""));
    let secs: i64 = secs.parse().ok()?;
    let nanos: u32 = if frac.is_empty() {
        0
    } else {
        let digits: String = frac.chars().chain(std::iter::repeat('0')).take(9).collect();
        digits.parse().ok()?
    };
    // "-1.5" means 1.5s before the epoch
    let (secs, nanos) = if epoch.starts_with('-') && nanos > 0 {
        (secs - 1, 1_000_000_000 - nanos)
    } else {
        (secs, nanos)
    };

    Utc.timestamp_opt(secs, nanos).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> ResultSet {
        ResultSet::new(
            columns.iter().map(|c| ColumnMeta::new(*c, "text")).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(|v| v.map(str::to_string)).collect())
                .collect(),
        )
    }

    #[test]
    fn typed_access_by_name() {
        let rs = set(&["CREDITS", "JOBS"], vec![vec![Some("12.5"), Some("42")]]);
        let row = rs.first_row("tile").unwrap();
        assert!((row.f64("credits").unwrap() - 12.5).abs() < f64::EPSILON);
        assert_eq!(row.u64("JOBS").unwrap(), 42);
    }

    #[test]
    fn empty_set_reports_what() {
        let rs = set(&["X"], vec![]);
        let err = rs.first_row("storage usage").unwrap_err();
        assert!(matches!(err, SfcostError::EmptyResult(ref w) if w == "storage usage"));
    }

    #[test]
    fn null_aggregate_is_null_value() {
        let rs = set(&["CREDITS"], vec![vec![None]]);
        let err = rs.first_row("credits").unwrap().f64("CREDITS").unwrap_err();
        assert!(matches!(err, SfcostError::NullValue(_)));
        assert_eq!(rs.first_row("c").unwrap().opt_f64("CREDITS").unwrap(), None);
    }

    #[test]
    fn missing_column() {
        let rs = set(&["A"], vec![vec![Some("1")]]);
        let err = rs.first_row("a").unwrap().f64("B").unwrap_err();
        assert!(matches!(err, SfcostError::MissingColumn(ref c) if c == "B"));
    }

    #[test]
    fn unparseable_number() {
        let rs = set(&["A"], vec![vec![Some("abc")]]);
        let err = rs.first_row("a").unwrap().f64("A").unwrap_err();
        assert!(matches!(err, SfcostError::ParseValue { expected: "number", .. }));
    }

    #[test]
    fn integer_with_zero_fraction() {
        let rs = set(&["N"], vec![vec![Some("17.000")]]);
        assert_eq!(rs.first_row("n").unwrap().u64("N").unwrap(), 17);
    }

    #[test]
    fn timestamp_forms() {
        let plain = parse_timestamp("1704067200.000000000").unwrap();
        assert_eq!(plain.to_rfc3339(), "2024-01-01T00:00:00+00:00");

        let frac = parse_timestamp("1704067200.5").unwrap();
        assert_eq!(frac.timestamp_subsec_millis(), 500);

        let tz = parse_timestamp("1704067200.000000000 1500").unwrap();
        assert_eq!(tz, plain);

        assert!(parse_timestamp("not-a-time").is_none());
    }

    #[test]
    fn partitions_extend_in_order() {
        let mut rs = set(&["A"], vec![vec![Some("1")]]);
        rs.extend_rows(vec![vec![Some("2".to_string())]]);
        let values: Vec<u64> = rs.rows().map(|r| r.u64("A").unwrap()).collect();
        assert_eq!(values, vec![1, 2]);
    }
}
