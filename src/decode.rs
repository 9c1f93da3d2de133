//! CSV decoding into typed [Table]s.
//!
//! Column types are decided per column at load time, never re-probed later:
//!
//! * the dataset's date column becomes [Column::Date] only if every non-empty
//!   cell parses, otherwise the raw strings are kept as [Column::Unparsed];
//! * any other column becomes [Column::Integer] or [Column::Number] when all
//!   of its non-empty cells parse as such — columns known to use a comma
//!   decimal separator get a second attempt after normalization;
//! * everything else is [Column::Text].
//!
//! Empty cells are missing in every variant.

use crate::coerce;
use crate::dataset::DatasetSchema;
use crate::error::RadiantError;
use crate::table::{Column, Table};

/// Decode CSV bytes into a [Table] using the dataset's column layout.
pub fn decode(bytes: &[u8], schema: &DatasetSchema) -> Result<Table, RadiantError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (index, cell) in record.iter().enumerate() {
            if index < raw_columns.len() {
                let cell = cell.trim();
                raw_columns[index].push(if cell.is_empty() {
                    None
                } else {
                    Some(cell.to_string())
                });
            }
        }
    }

    let mut table = Table::new();
    for (name, raw) in headers.into_iter().zip(raw_columns) {
        let column = type_column(&name, raw, schema);
        table.push_column(name, column);
    }
    Ok(table)
}

/// Decide the type of one column from its raw cells.
fn type_column(name: &str, raw: Vec<Option<String>>, schema: &DatasetSchema) -> Column {
    if name == schema.date_column {
        return type_date_column(raw);
    }
    if all_non_empty_parse(&raw, |cell| coerce::parse_integer(cell).is_some()) {
        return Column::Integer(
            raw.iter()
                .map(|cell| cell.as_deref().and_then(coerce::parse_integer))
                .collect(),
        );
    }
    if all_non_empty_parse(&raw, |cell| coerce::parse_numeric_strict(cell).is_some()) {
        return Column::Number(
            raw.iter()
                .map(|cell| cell.as_deref().and_then(coerce::parse_numeric_strict))
                .collect(),
        );
    }
    if schema.locale_numeric_columns.contains(&name)
        && all_non_empty_parse(&raw, |cell| coerce::parse_numeric_locale(cell).is_some())
    {
        return Column::Number(
            raw.iter()
                .map(|cell| cell.as_deref().and_then(coerce::parse_numeric_locale))
                .collect(),
        );
    }
    Column::Text(raw)
}

/// The date column only becomes typed when it parses wholesale.
fn type_date_column(raw: Vec<Option<String>>) -> Column {
    if all_non_empty_parse(&raw, |cell| coerce::parse_date(cell).is_some()) {
        Column::Date(
            raw.iter()
                .map(|cell| cell.as_deref().and_then(coerce::parse_date))
                .collect(),
        )
    } else {
        Column::Unparsed(raw)
    }
}

fn all_non_empty_parse(raw: &[Option<String>], parses: impl Fn(&str) -> bool) -> bool {
    raw.iter().flatten().all(|cell| parses(cell))
}
