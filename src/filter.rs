//! Filter, projection, sort and limit operations.
//!
//! All operations are lenient: filtering on a column the table does not have
//! is a no-op, matching the source datasets' loosely enforced layout. Every
//! operation returns a new table.

use crate::coerce;
use crate::dataset::DatasetSchema;
use crate::error::RadiantError;
use crate::query::QueryParams;
use crate::table::Table;

use time::Date;

/// Whether a row limit keeps the first or the last N rows.
///
/// Listing endpoints keep the head; single-entity detail endpoints keep the
/// tail so that a limit means "most recent N records" after the date sort.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LimitMode {
    Head,
    Tail,
}

/// Keep rows whose key column equals `value`, case-insensitively.
pub fn filter_key_eq(table: &Table, column: &str, value: &str) -> Table {
    filter_key_any(table, column, &[value.to_string()])
}

/// Keep rows whose key column matches any of `values`, case-insensitively.
///
/// Rows with a missing key never match. A missing column is a no-op.
pub fn filter_key_any(table: &Table, column: &str, values: &[String]) -> Table {
    let Some(cells) = table.string_values(column) else {
        return table.clone();
    };
    let wanted: Vec<String> = values.iter().map(|v| v.to_lowercase()).collect();
    let indices: Vec<usize> = cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| {
            cell.as_deref()
                .is_some_and(|cell| wanted.contains(&cell.to_lowercase()))
        })
        .map(|(index, _)| index)
        .collect();
    table.take(&indices)
}

/// Keep rows whose date falls within the inclusive `[from, to]` range.
///
/// Rows without a parseable date are dropped when either bound is given.
pub fn filter_date_range(
    table: &Table,
    column: &str,
    from: Option<Date>,
    to: Option<Date>,
) -> Table {
    if from.is_none() && to.is_none() {
        return table.clone();
    }
    let Some(dates) = table.date_values(column) else {
        return table.clone();
    };
    let indices: Vec<usize> = dates
        .iter()
        .enumerate()
        .filter(|(_, date)| {
            date.is_some_and(|date| {
                from.map_or(true, |from| date >= from) && to.map_or(true, |to| date <= to)
            })
        })
        .map(|(index, _)| index)
        .collect();
    table.take(&indices)
}

/// Keep rows whose date falls in `year`. Unparseable dates never match.
pub fn filter_year(table: &Table, column: &str, year: i32) -> Table {
    let Some(dates) = table.date_values(column) else {
        return table.clone();
    };
    let indices: Vec<usize> = dates
        .iter()
        .enumerate()
        .filter(|(_, date)| date.is_some_and(|date| date.year() == year))
        .map(|(index, _)| index)
        .collect();
    table.take(&indices)
}

/// Sort rows ascending by the date column; rows without a parseable date sort
/// last. The sort is stable. A missing column is a no-op.
pub fn sort_by_date(table: &Table, column: &str) -> Table {
    let Some(dates) = table.date_values(column) else {
        return table.clone();
    };
    let mut indices: Vec<usize> = (0..table.num_rows()).collect();
    indices.sort_by_key(|&index| match dates[index] {
        Some(date) => (0, Some(date)),
        None => (1, None),
    });
    table.take(&indices)
}

/// Apply a comma-separated column projection. See [Table::select] for the
/// lenient no-match policy.
pub fn project(table: &Table, columns: &str) -> Table {
    let names: Vec<&str> = columns
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();
    table.select(&names)
}

/// Apply a positive row limit with head or tail semantics.
pub fn limit(table: &Table, limit: Option<usize>, mode: LimitMode) -> Table {
    match (limit, mode) {
        (Some(n), LimitMode::Head) => table.head(n),
        (Some(n), LimitMode::Tail) => table.tail(n),
        (None, _) => table.clone(),
    }
}

/// Parse a date request parameter, failing the request when malformed.
pub fn parse_date_param(value: &Option<String>) -> Result<Option<Date>, RadiantError> {
    match value {
        None => Ok(None),
        Some(raw) => coerce::parse_date(raw)
            .map(Some)
            .ok_or_else(|| RadiantError::InvalidDate { value: raw.clone() }),
    }
}

/// The full listing pipeline: municipality/entity filters, date range, year,
/// date sort, projection, then the limit.
pub fn apply_listing(
    table: &Table,
    schema: &DatasetSchema,
    params: &QueryParams,
    mode: LimitMode,
) -> Result<Table, RadiantError> {
    let mut result = if !params.municipios.is_empty() {
        filter_key_any(table, schema.key_column, &params.municipios)
    } else if let Some(municipio) = &params.municipio {
        filter_key_eq(table, schema.key_column, municipio)
    } else {
        table.clone()
    };

    if let (Some(entity_column), Some(entidad)) = (schema.entity_column, &params.entidad) {
        result = filter_key_eq(&result, entity_column, entidad);
    }

    let from = parse_date_param(&params.from)?;
    let to = parse_date_param(&params.to)?;
    result = filter_date_range(&result, schema.date_column, from, to);

    if let Some(year) = params.year {
        result = filter_year(&result, schema.date_column, year);
    }

    result = sort_by_date(&result, schema.date_column);

    if let Some(columns) = &params.columns {
        result = project(&result, columns);
    }

    Ok(limit(&result, params.effective_limit(), mode))
}
