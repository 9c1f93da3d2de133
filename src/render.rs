//! Rendering tables onto the wire.
//!
//! JSON endpoints emit one object per row. Missing cells render as an empty
//! string on record endpoints and as zero on the quarterly trend endpoint;
//! non-finite numbers are never emitted as-is.

use crate::coerce;
use crate::error::RadiantError;
use crate::table::{Column, Table};

use serde_json::{Map, Value};

/// UTF-8 byte-order mark, prepended to CSV downloads for spreadsheet tools.
pub const UTF8_BOM: &[u8] = &[0xef, 0xbb, 0xbf];

/// How a missing cell renders in JSON.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MissingPolicy {
    /// Missing renders as `""`, non-finite numbers as `null`.
    EmptyString,
    /// Missing and non-finite numbers both render as `0`.
    Zero,
}

impl MissingPolicy {
    fn missing(self) -> Value {
        match self {
            MissingPolicy::EmptyString => Value::String(String::new()),
            MissingPolicy::Zero => Value::from(0),
        }
    }

    fn non_finite(self) -> Value {
        match self {
            MissingPolicy::EmptyString => Value::Null,
            MissingPolicy::Zero => Value::from(0),
        }
    }

    fn number(self, value: f64) -> Value {
        match serde_json::Number::from_f64(value) {
            Some(number) => Value::Number(number),
            None => self.non_finite(),
        }
    }
}

/// Render a table as JSON records, one object per row in column order.
pub fn to_json_records(table: &Table, policy: MissingPolicy) -> Vec<Value> {
    let mut records = vec![Map::new(); table.num_rows()];
    for (name, column) in table.iter() {
        for (row, record) in records.iter_mut().enumerate() {
            let value = match column {
                Column::Text(values) | Column::Unparsed(values) => values[row]
                    .as_ref()
                    .map(|v| Value::String(v.clone()))
                    .unwrap_or_else(|| policy.missing()),
                Column::Number(values) => values[row]
                    .map(|v| policy.number(v))
                    .unwrap_or_else(|| policy.missing()),
                Column::Integer(values) => values[row]
                    .map(Value::from)
                    .unwrap_or_else(|| policy.missing()),
                Column::Date(values) => values[row]
                    .map(|v| Value::String(coerce::format_date(v)))
                    .unwrap_or_else(|| policy.missing()),
            };
            record.insert(name.to_string(), value);
        }
    }
    records.into_iter().map(Value::Object).collect()
}

/// Encode a table as CSV with a UTF-8 BOM.
///
/// Missing cells and non-finite numbers render as empty fields; dates render
/// as `YYYY-MM-DD`.
pub fn to_csv(table: &Table) -> Result<Vec<u8>, RadiantError> {
    let mut buffer = UTF8_BOM.to_vec();
    if table.num_columns() == 0 {
        return Ok(buffer);
    }
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(table.column_names())?;
        for row in 0..table.num_rows() {
            let record: Vec<String> = table
                .iter()
                .map(|(_, column)| csv_cell(column, row))
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush().map_err(csv::Error::from)?;
    }
    Ok(buffer)
}

fn csv_cell(column: &Column, row: usize) -> String {
    match column {
        Column::Text(values) | Column::Unparsed(values) => {
            values[row].clone().unwrap_or_default()
        }
        Column::Number(values) => values[row]
            .filter(|v| v.is_finite())
            .map(|v| format!("{}", v))
            .unwrap_or_default(),
        Column::Integer(values) => values[row].map(|v| v.to_string()).unwrap_or_default(),
        Column::Date(values) => values[row].map(coerce::format_date).unwrap_or_default(),
    }
}

/// Derive the attachment filename for a filtered download.
///
/// A municipality list contributes its length, a single municipality its
/// name with spaces replaced, and a year filter its year.
pub fn download_filename(
    prefix: &str,
    municipios: &[String],
    municipio: Option<&str>,
    year: Option<i32>,
) -> String {
    let mut filename = prefix.to_string();
    if !municipios.is_empty() {
        filename.push_str(&format!("_{}_municipios", municipios.len()));
    } else if let Some(municipio) = municipio {
        filename.push_str(&format!("_{}", municipio.replace(' ', "_")));
    }
    if let Some(year) = year {
        filename.push_str(&format!("_{}", year));
    }
    filename.push_str(".csv");
    filename
}
