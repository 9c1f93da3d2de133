//! Group-by aggregation.
//!
//! Reducers operate on numerically coerced cells (see
//! [Table::numeric_values]); missing cells are skipped. Groups are emitted in
//! ascending key order and rows with a missing group key are dropped.

use crate::coerce;
use crate::table::{Column, Table};

use hashbrown::HashMap;
use strum_macros::Display;

/// A reduction over the numeric cells of one group.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum Reducer {
    Mean,
    Sum,
    Min,
    Max,
    Median,
    Std,
    Count,
}

impl Reducer {
    /// Reduce a slice of optional cells. Missing cells are skipped.
    ///
    /// `sum` of no values is zero and `count` counts the present cells; the
    /// remaining reducers are missing when no value is present. `std` is the
    /// sample standard deviation and needs at least two values.
    pub fn reduce(self, cells: &[Option<f64>]) -> Option<f64> {
        let values: Vec<f64> = cells.iter().flatten().copied().collect();
        match self {
            Reducer::Count => Some(values.len() as f64),
            Reducer::Sum => Some(values.iter().sum()),
            Reducer::Mean => {
                if values.is_empty() {
                    None
                } else {
                    Some(values.iter().sum::<f64>() / values.len() as f64)
                }
            }
            Reducer::Min => values.iter().copied().reduce(f64::min),
            Reducer::Max => values.iter().copied().reduce(f64::max),
            Reducer::Median => median(values),
            Reducer::Std => sample_std(&values),
        }
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// One aggregated column and the reducers applied to it.
pub struct AggSpec<'a> {
    pub column: &'a str,
    pub reducers: &'a [Reducer],
}

impl<'a> AggSpec<'a> {
    pub fn new(column: &'a str, reducers: &'a [Reducer]) -> Self {
        AggSpec { column, reducers }
    }
}

/// Group `table` by the string value of `key` and apply `specs`.
///
/// Specs naming a column the table does not have are skipped. Output column
/// names stay bare when every applied spec holds exactly one reducer; as soon
/// as any column requests several, every aggregate is named
/// `{column}_{reducer}`.
pub fn group_by(table: &Table, key: &str, specs: &[AggSpec]) -> Table {
    let mut result = Table::new();
    let Some(keys) = table.string_values(key) else {
        return result;
    };

    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, cell) in keys.iter().enumerate() {
        if let Some(cell) = cell.as_deref() {
            groups
                .entry(cell)
                .or_insert_with(|| {
                    order.push(cell);
                    Vec::new()
                })
                .push(index);
        }
    }
    order.sort_unstable();

    let specs: Vec<(&AggSpec, Vec<Option<f64>>)> = specs
        .iter()
        .filter_map(|spec| table.numeric_values(spec.column).map(|cells| (spec, cells)))
        .collect();
    let qualify = specs.iter().any(|(spec, _)| spec.reducers.len() > 1);

    result.push_column(
        key,
        Column::Text(order.iter().map(|k| Some(k.to_string())).collect()),
    );
    for (spec, cells) in &specs {
        for reducer in spec.reducers {
            let values: Vec<Option<f64>> = order
                .iter()
                .map(|group| {
                    let group_cells: Vec<Option<f64>> =
                        groups[group].iter().map(|&index| cells[index]).collect();
                    reducer.reduce(&group_cells)
                })
                .collect();
            let name = if qualify {
                format!("{}_{}", spec.column, reducer)
            } else {
                spec.column.to_string()
            };
            result.push_column(name, Column::Number(values));
        }
    }
    result
}

/// Append a `quarter` label column, dropping rows without a parseable date.
pub fn with_quarter_column(table: &Table, date_column: &str) -> Table {
    let Some(dates) = table.date_values(date_column) else {
        return table.clone();
    };
    let indices: Vec<usize> = dates
        .iter()
        .enumerate()
        .filter(|(_, date)| date.is_some())
        .map(|(index, _)| index)
        .collect();
    let quarters: Vec<Option<String>> = indices
        .iter()
        .map(|&index| dates[index].map(coerce::quarter_label))
        .collect();
    let mut result = table.take(&indices);
    result.push_column("quarter", Column::Text(quarters));
    result
}

/// Distinct years present in the date column, most recent first.
pub fn distinct_years(table: &Table, date_column: &str) -> Vec<i32> {
    let Some(dates) = table.date_values(date_column) else {
        return Vec::new();
    };
    let mut years: Vec<i32> = dates.iter().flatten().map(|date| date.year()).collect();
    years.sort_unstable();
    years.dedup();
    years.reverse();
    years
}

/// Distinct non-empty string values of a column, ascending.
pub fn distinct_strings(table: &Table, column: &str) -> Vec<String> {
    let Some(cells) = table.string_values(column) else {
        return Vec::new();
    };
    let mut values: Vec<String> = cells
        .into_iter()
        .flatten()
        .filter(|cell| !cell.is_empty())
        .collect();
    values.sort_unstable();
    values.dedup();
    values
}

/// Count of distinct non-empty values of a column.
pub fn distinct_count(table: &Table, column: &str) -> usize {
    distinct_strings(table, column).len()
}

/// Round every number column to two decimal places.
pub fn round_numbers(table: &Table) -> Table {
    let mut result = Table::new();
    for (name, column) in table.iter() {
        let column = match column {
            Column::Number(values) => {
                Column::Number(values.iter().map(|v| v.map(coerce::round2)).collect())
            }
            other => other.clone(),
        };
        result.push_column(name, column);
    }
    result
}

/// Sort rows descending by a number column, missing cells last. Stable.
pub fn sort_by_number_desc(table: &Table, column: &str) -> Table {
    let Some(values) = table.numeric_values(column) else {
        return table.clone();
    };
    let mut indices: Vec<usize> = (0..table.num_rows()).collect();
    indices.sort_by(|&a, &b| match (values[a], values[b]) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    table.take(&indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grouped() -> Table {
        let mut table = Table::new();
        table.push_column(
            "Municipio",
            Column::Text(vec![
                Some("A".to_string()),
                Some("A".to_string()),
                Some("B".to_string()),
                None,
            ]),
        );
        table.push_column(
            "value",
            Column::Number(vec![Some(10.0), Some(20.0), Some(5.0), Some(99.0)]),
        );
        table
    }

    #[test]
    fn reducers() {
        let cells = vec![Some(1.0), None, Some(2.0), Some(3.0)];
        assert_eq!(Some(2.0), Reducer::Mean.reduce(&cells));
        assert_eq!(Some(6.0), Reducer::Sum.reduce(&cells));
        assert_eq!(Some(1.0), Reducer::Min.reduce(&cells));
        assert_eq!(Some(3.0), Reducer::Max.reduce(&cells));
        assert_eq!(Some(2.0), Reducer::Median.reduce(&cells));
        assert_eq!(Some(1.0), Reducer::Std.reduce(&cells));
        assert_eq!(Some(3.0), Reducer::Count.reduce(&cells));
    }

    #[test]
    fn reducers_on_empty() {
        assert_eq!(None, Reducer::Mean.reduce(&[]));
        assert_eq!(Some(0.0), Reducer::Sum.reduce(&[]));
        assert_eq!(Some(0.0), Reducer::Count.reduce(&[None]));
        assert_eq!(None, Reducer::Std.reduce(&[Some(1.0)]));
    }

    #[test]
    fn median_of_even_count_averages_middles() {
        assert_eq!(
            Some(2.5),
            Reducer::Median.reduce(&[Some(1.0), Some(2.0), Some(3.0), Some(4.0)])
        );
    }

    #[test]
    fn group_mean() {
        // Missing group keys are dropped; keys come out ascending.
        let result = group_by(
            &grouped(),
            "Municipio",
            &[AggSpec::new("value", &[Reducer::Mean])],
        );
        assert_eq!(
            Some(vec![Some("A".to_string()), Some("B".to_string())]),
            result.string_values("Municipio")
        );
        assert_eq!(
            &Column::Number(vec![Some(15.0), Some(5.0)]),
            result.column("value").unwrap()
        );
    }

    #[test]
    fn single_reducers_keep_bare_names() {
        let result = group_by(
            &grouped(),
            "Municipio",
            &[AggSpec::new("value", &[Reducer::Sum])],
        );
        assert!(result.has_column("value"));
        assert!(!result.has_column("value_sum"));
    }

    #[test]
    fn any_multi_reducer_qualifies_all_names() {
        let table = grouped().with_column(
            "other",
            Column::Number(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
        );
        let result = group_by(
            &table,
            "Municipio",
            &[
                AggSpec::new("value", &[Reducer::Sum, Reducer::Mean]),
                AggSpec::new("other", &[Reducer::Max]),
            ],
        );
        let names: Vec<&str> = result.column_names().collect();
        assert_eq!(
            vec!["Municipio", "value_sum", "value_mean", "other_max"],
            names
        );
    }

    #[test]
    fn specs_for_unknown_columns_are_skipped() {
        let result = group_by(
            &grouped(),
            "Municipio",
            &[AggSpec::new("missing", &[Reducer::Mean])],
        );
        assert_eq!(1, result.num_columns());
        assert_eq!(2, result.num_rows());
    }

    #[test]
    fn quarter_column() {
        use time::macros::date;
        let mut table = Table::new();
        table.push_column(
            "Fecha",
            Column::Date(vec![Some(date!(2020 - 02 - 10)), None, Some(date!(2021 - 11 - 01))]),
        );
        let result = with_quarter_column(&table, "Fecha");
        assert_eq!(2, result.num_rows());
        assert_eq!(
            Some(vec![Some("2020Q1".to_string()), Some("2021Q4".to_string())]),
            result.string_values("quarter")
        );
    }

    #[test]
    fn years_descending() {
        use time::macros::date;
        let mut table = Table::new();
        table.push_column(
            "Fecha",
            Column::Date(vec![
                Some(date!(2020 - 02 - 10)),
                Some(date!(2021 - 11 - 01)),
                Some(date!(2020 - 06 - 01)),
                None,
            ]),
        );
        assert_eq!(vec![2021, 2020], distinct_years(&table, "Fecha"));
    }

    #[test]
    fn distinct_string_values() {
        let table = grouped();
        assert_eq!(vec!["A", "B"], distinct_strings(&table, "Municipio"));
        assert_eq!(2, distinct_count(&table, "Municipio"));
    }

    #[test]
    fn rounding_applies_to_number_columns_only() {
        let table = grouped().with_column("value", Column::Number(vec![Some(1.005), None, Some(2.5), None]));
        let rounded = round_numbers(&table);
        let values = rounded.numeric_values("value").unwrap();
        assert_eq!(Some(2.5), values[2]);
        assert_eq!("text", rounded.column("Municipio").unwrap().dtype());
    }

    #[test]
    fn ranking_sort_is_descending_with_missing_last() {
        let table = grouped();
        let sorted = sort_by_number_desc(&table, "value");
        assert_eq!(
            Some(vec![Some(99.0), Some(20.0), Some(10.0), Some(5.0)]),
            sorted.numeric_values("value")
        );
    }
}
