//! In-memory columnar tables.
//!
//! A [Table] is an ordered sequence of named columns of equal length. Row `i`
//! across all columns is one logical record. Tables are immutable once built;
//! every operation in the filter, aggregation and join engines produces a new
//! table rather than mutating in place.

use crate::coerce;

use time::Date;

/// A single typed column. Every cell is optional; a `None` cell is missing.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    /// Free-form strings.
    Text(Vec<Option<String>>),
    /// 64-bit floats.
    Number(Vec<Option<f64>>),
    /// 64-bit integers (years, counts).
    Integer(Vec<Option<i64>>),
    /// Day-granularity dates.
    Date(Vec<Option<Date>>),
    /// Raw strings for a column that was expected to hold dates but did not
    /// fully parse at load time.
    Unparsed(Vec<Option<String>>),
}

impl Column {
    /// Number of cells in the column.
    pub fn len(&self) -> usize {
        match self {
            Column::Text(values) | Column::Unparsed(values) => values.len(),
            Column::Number(values) => values.len(),
            Column::Integer(values) => values.len(),
            Column::Date(values) => values.len(),
        }
    }

    /// Whether the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short type name, as exposed by the debug endpoint.
    pub fn dtype(&self) -> &'static str {
        match self {
            Column::Text(_) => "text",
            Column::Number(_) => "number",
            Column::Integer(_) => "integer",
            Column::Date(_) => "date",
            Column::Unparsed(_) => "unparsed",
        }
    }

    /// Number of missing cells.
    pub fn null_count(&self) -> usize {
        match self {
            Column::Text(values) | Column::Unparsed(values) => {
                values.iter().filter(|v| v.is_none()).count()
            }
            Column::Number(values) => values.iter().filter(|v| v.is_none()).count(),
            Column::Integer(values) => values.iter().filter(|v| v.is_none()).count(),
            Column::Date(values) => values.iter().filter(|v| v.is_none()).count(),
        }
    }

    /// Build a new column from the cells at `indices`, in order.
    pub fn take(&self, indices: &[usize]) -> Column {
        fn pick<T: Clone>(values: &[Option<T>], indices: &[usize]) -> Vec<Option<T>> {
            indices.iter().map(|&i| values[i].clone()).collect()
        }
        match self {
            Column::Text(values) => Column::Text(pick(values, indices)),
            Column::Number(values) => Column::Number(pick(values, indices)),
            Column::Integer(values) => Column::Integer(pick(values, indices)),
            Column::Date(values) => Column::Date(pick(values, indices)),
            Column::Unparsed(values) => Column::Unparsed(pick(values, indices)),
        }
    }
}

/// An immutable columnar table with named, equal-length columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<(String, Column)>,
}

impl Table {
    /// Return a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows. An empty table has zero rows.
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, column)| column.len())
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has zero rows.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Column names in table order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, column)| column)
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Append a column. All columns in a table must have equal length.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) {
        debug_assert!(
            self.columns.is_empty() || column.len() == self.num_rows(),
            "column length mismatch"
        );
        self.columns.push((name.into(), column));
    }

    /// Return a copy with `column` appended, or replacing an existing column
    /// of the same name in place.
    pub fn with_column(&self, name: &str, column: Column) -> Table {
        debug_assert!(
            self.columns.is_empty() || column.len() == self.num_rows(),
            "column length mismatch"
        );
        let mut columns = self.columns.clone();
        match columns.iter_mut().find(|(candidate, _)| candidate == name) {
            Some((_, existing)) => *existing = column,
            None => columns.push((name.to_string(), column)),
        }
        Table { columns }
    }

    /// Return a copy containing the rows at `indices`, in order.
    pub fn take(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.take(indices)))
                .collect(),
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        let indices: Vec<usize> = (0..self.num_rows().min(n)).collect();
        self.take(&indices)
    }

    /// Last `n` rows.
    pub fn tail(&self, n: usize) -> Table {
        let rows = self.num_rows();
        let indices: Vec<usize> = (rows.saturating_sub(n)..rows).collect();
        self.take(&indices)
    }

    /// Keep only the named columns that exist, in the order given.
    ///
    /// Requested names that do not exist are ignored. If none exist the full
    /// table is retained; a projection never fails.
    pub fn select(&self, names: &[&str]) -> Table {
        let columns: Vec<(String, Column)> = names
            .iter()
            .filter_map(|name| {
                self.column(name)
                    .map(|column| (name.to_string(), column.clone()))
            })
            .collect();
        if columns.is_empty() {
            return self.clone();
        }
        Table { columns }
    }

    /// Cells of a column rendered as strings. Dates render as `YYYY-MM-DD`.
    pub fn string_values(&self, name: &str) -> Option<Vec<Option<String>>> {
        let column = self.column(name)?;
        let values = match column {
            Column::Text(values) | Column::Unparsed(values) => values.clone(),
            Column::Number(values) => values
                .iter()
                .map(|v| v.map(|v| format!("{}", v)))
                .collect(),
            Column::Integer(values) => values.iter().map(|v| v.map(|v| v.to_string())).collect(),
            Column::Date(values) => values.iter().map(|v| v.map(coerce::format_date)).collect(),
        };
        Some(values)
    }

    /// Cells of a column coerced to numbers.
    ///
    /// `Number` and `Integer` cells pass through; text cells go through the
    /// full coercion pipeline (see [coerce::parse_numeric]); date cells are
    /// missing.
    pub fn numeric_values(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let column = self.column(name)?;
        let values = match column {
            Column::Number(values) => values.clone(),
            Column::Integer(values) => values.iter().map(|v| v.map(|v| v as f64)).collect(),
            Column::Text(values) | Column::Unparsed(values) => values
                .iter()
                .map(|v| v.as_deref().and_then(coerce::parse_numeric))
                .collect(),
            Column::Date(values) => vec![None; values.len()],
        };
        Some(values)
    }

    /// Cells of a column as dates.
    ///
    /// A `Date` column passes through; text and unparsed cells are parsed
    /// row-wise, with failures becoming missing.
    pub fn date_values(&self, name: &str) -> Option<Vec<Option<Date>>> {
        let column = self.column(name)?;
        let values = match column {
            Column::Date(values) => values.clone(),
            Column::Text(values) | Column::Unparsed(values) => values
                .iter()
                .map(|v| v.as_deref().and_then(coerce::parse_date))
                .collect(),
            Column::Number(values) => vec![None; values.len()],
            Column::Integer(values) => vec![None; values.len()],
        };
        Some(values)
    }

    /// Iterate over `(name, column)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns
            .iter()
            .map(|(name, column)| (name.as_str(), column))
    }
}
