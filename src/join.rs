//! Joining the radiance and GDP datasets.
//!
//! The two datasets rarely line up day-for-day, so the combined view first
//! tries an exact (municipality, date) join and falls back to joining each
//! radiance row against per-municipality mean GDP figures when the exact join
//! is too sparse to be useful.

use crate::aggregate::{self, AggSpec, Reducer};
use crate::dataset::{DatasetId, GDP_NUMERIC_COLUMNS};
use crate::filter;
use crate::table::{Column, Table};

use hashbrown::HashMap;
use strum_macros::Display;

/// Minimum exact-join row count below which the municipality fallback runs.
pub const MIN_EXACT_JOIN_ROWS: usize = 100;

/// Which join strategy produced the combined view.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum JoinMode {
    /// Rows matched on (municipality, date).
    Exact,
    /// Rows matched on municipality against mean GDP figures.
    MunicipalityMean,
}

/// Composite join key separator; never appears in the data.
const KEY_SEP: char = '\u{1f}';

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Per-row municipality keys, lowercased and trimmed.
fn municipality_keys(table: &Table, column: &str) -> Vec<Option<String>> {
    match table.string_values(column) {
        Some(cells) => cells
            .into_iter()
            .map(|cell| cell.as_deref().map(normalize))
            .collect(),
        None => vec![None; table.num_rows()],
    }
}

/// Per-row (municipality, date) keys. Rows missing either part have no key.
fn exact_keys(table: &Table, key_column: &str, date_column: &str) -> Vec<Option<String>> {
    let municipalities = municipality_keys(table, key_column);
    let dates = table
        .date_values(date_column)
        .unwrap_or_else(|| vec![None; table.num_rows()]);
    municipalities
        .into_iter()
        .zip(dates)
        .map(|(municipality, date)| match (municipality, date) {
            (Some(municipality), Some(date)) => {
                Some(format!("{}{}{}", municipality, KEY_SEP, date))
            }
            _ => None,
        })
        .collect()
}

/// Inner join on precomputed per-row keys.
///
/// Rows without a key never match. Multiple matches multiply, row order
/// follows the left side. Column name collisions get the `suffixes` pair.
pub fn inner_join(
    left: &Table,
    right: &Table,
    left_keys: &[Option<String>],
    right_keys: &[Option<String>],
    suffixes: (&str, &str),
) -> Table {
    debug_assert_eq!(left.num_rows(), left_keys.len());
    debug_assert_eq!(right.num_rows(), right_keys.len());

    let mut right_index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, key) in right_keys.iter().enumerate() {
        if let Some(key) = key.as_deref() {
            right_index.entry(key).or_default().push(index);
        }
    }

    let mut left_rows = Vec::new();
    let mut right_rows = Vec::new();
    for (index, key) in left_keys.iter().enumerate() {
        let Some(key) = key.as_deref() else { continue };
        if let Some(matches) = right_index.get(key) {
            for &matched in matches {
                left_rows.push(index);
                right_rows.push(matched);
            }
        }
    }

    let collisions: Vec<String> = left
        .column_names()
        .filter(|name| right.has_column(name))
        .map(str::to_string)
        .collect();

    let mut result = Table::new();
    for (name, column) in left.take(&left_rows).iter() {
        let name = if collisions.iter().any(|c| c == name) {
            format!("{}{}", name, suffixes.0)
        } else {
            name.to_string()
        };
        result.push_column(name, column.clone());
    }
    for (name, column) in right.take(&right_rows).iter() {
        let name = if collisions.iter().any(|c| c == name) {
            format!("{}{}", name, suffixes.1)
        } else {
            name.to_string()
        };
        result.push_column(name, column.clone());
    }
    result
}

/// Columns of the combined view, in wire order.
const COMBINED_COLUMNS: &[&str] = &[
    "Municipio",
    "municipio",
    "Media_de_radianza",
    "pib_mun",
    "pibe",
    "porc_pob",
    "Fecha",
    "fecha",
];

/// The combined radiance and GDP view.
///
/// `municipios`, when non-empty, filters both sides first. The exact join is
/// used when it yields at least `min_rows` rows; otherwise each radiance row
/// joins against its municipality's mean GDP figures.
fn combined_with_threshold(
    radiance: &Table,
    gdp: &Table,
    municipios: &[String],
    min_rows: usize,
) -> (Table, JoinMode) {
    let radiance_schema = DatasetId::Radiance.schema();
    let gdp_schema = DatasetId::Gdp.schema();

    let radiance = if municipios.is_empty() {
        radiance.clone()
    } else {
        filter::filter_key_any(radiance, radiance_schema.key_column, municipios)
    };
    let gdp = if municipios.is_empty() {
        gdp.clone()
    } else {
        filter::filter_key_any(gdp, gdp_schema.key_column, municipios)
    };

    let gdp_figures = gdp.select(GDP_NUMERIC_COLUMNS);
    let exact = inner_join(
        &radiance,
        &gdp_figures,
        &exact_keys(&radiance, radiance_schema.key_column, radiance_schema.date_column),
        &exact_keys(&gdp, gdp_schema.key_column, gdp_schema.date_column),
        ("_luz", "_pib"),
    );

    let (joined, mode) = if exact.num_rows() >= min_rows {
        (exact, JoinMode::Exact)
    } else {
        let keyed = gdp.with_column(
            "municipio_key",
            Column::Text(municipality_keys(&gdp, gdp_schema.key_column)),
        );
        let means = aggregate::group_by(
            &keyed,
            "municipio_key",
            &[
                AggSpec::new("pib_mun", &[Reducer::Mean]),
                AggSpec::new("pibe", &[Reducer::Mean]),
                AggSpec::new("porc_pob", &[Reducer::Mean]),
            ],
        );
        let fallback = inner_join(
            &radiance,
            &means,
            &municipality_keys(&radiance, radiance_schema.key_column),
            &means
                .string_values("municipio_key")
                .unwrap_or_default(),
            ("_luz", "_pib"),
        );
        (fallback, JoinMode::MunicipalityMean)
    };

    (joined.select(COMBINED_COLUMNS), mode)
}

/// See [combined_with_threshold]; uses the production sparsity threshold.
pub fn combined(radiance: &Table, gdp: &Table, municipios: &[String]) -> (Table, JoinMode) {
    combined_with_threshold(radiance, gdp, municipios, MIN_EXACT_JOIN_ROWS)
}

/// Quarterly trend view: both datasets aggregated per quarter label, then
/// inner-joined on the label.
pub fn quarterly(radiance: &Table, gdp: &Table, municipios: &[String]) -> Table {
    let radiance_schema = DatasetId::Radiance.schema();
    let gdp_schema = DatasetId::Gdp.schema();

    let radiance = if municipios.is_empty() {
        radiance.clone()
    } else {
        filter::filter_key_any(radiance, radiance_schema.key_column, municipios)
    };
    let gdp = if municipios.is_empty() {
        gdp.clone()
    } else {
        filter::filter_key_any(gdp, gdp_schema.key_column, municipios)
    };

    let radiance = aggregate::with_quarter_column(&radiance, radiance_schema.date_column);
    let gdp = aggregate::with_quarter_column(&gdp, gdp_schema.date_column);

    // The primary pixel-count column wins over the legacy total.
    let pixel_column = if radiance.has_column("Cantidad_de_pixeles") {
        "Cantidad_de_pixeles"
    } else {
        "total_pixeles"
    };
    let radiance_trend = aggregate::group_by(
        &radiance,
        "quarter",
        &[
            AggSpec::new(pixel_column, &[Reducer::Median]),
            AggSpec::new(
                "Suma_de_radianza",
                &[Reducer::Sum, Reducer::Median, Reducer::Std, Reducer::Mean],
            ),
            AggSpec::new("Media_de_radianza", &[Reducer::Mean]),
            AggSpec::new("Desviacion_estandar_de_radianza", &[Reducer::Mean]),
            AggSpec::new("Maximo_de_radianza", &[Reducer::Max]),
            AggSpec::new("Minimo_de_radianza", &[Reducer::Min]),
            AggSpec::new("Percentil_25_de_radianza", &[Reducer::Mean]),
            AggSpec::new("Percentil_50_de_radianza", &[Reducer::Mean]),
            AggSpec::new("Percentil_75_de_radianza", &[Reducer::Mean]),
        ],
    );
    let gdp_trend = aggregate::group_by(
        &gdp,
        "quarter",
        &[
            AggSpec::new(
                "pib_mun",
                &[Reducer::Mean, Reducer::Median, Reducer::Sum, Reducer::Std],
            ),
            AggSpec::new("pibe", &[Reducer::Mean, Reducer::Median]),
            AggSpec::new("porc_pob", &[Reducer::Mean]),
        ],
    );

    let gdp_labels = gdp_trend.string_values("quarter").unwrap_or_default();
    let gdp_figures = {
        // Drop the right-hand label column so it is not duplicated.
        let names: Vec<&str> = gdp_trend
            .column_names()
            .filter(|name| *name != "quarter")
            .collect();
        gdp_trend.select(&names)
    };
    inner_join(
        &radiance_trend,
        &gdp_figures,
        &radiance_trend.string_values("quarter").unwrap_or_default(),
        &gdp_labels,
        ("_luz", "_pib"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn exact_join_matches_municipality_and_date() {
        let radiance = test_utils::radiance_table();
        let gdp = test_utils::gdp_table();
        let (joined, mode) = combined_with_threshold(&radiance, &gdp, &[], 1);
        assert_eq!(JoinMode::Exact, mode);
        // Two radiance rows share a (municipality, day) with a GDP row.
        assert_eq!(2, joined.num_rows());
        assert!(joined.has_column("pib_mun"));
        assert!(joined.has_column("Media_de_radianza"));
    }

    #[test]
    fn exact_join_normalizes_case_and_whitespace() {
        let radiance = test_utils::radiance_table();
        let gdp = test_utils::gdp_table();
        let (joined, _) = combined_with_threshold(&radiance, &gdp, &[], 1);
        // "MERIDA " in the GDP data still matches "Merida".
        let municipios = joined.string_values("Municipio").unwrap();
        assert!(municipios.contains(&Some("Merida".to_string())));
    }

    #[test]
    fn sparse_exact_join_falls_back_to_municipality_means() {
        let radiance = test_utils::radiance_table();
        let gdp = test_utils::gdp_table();
        // Well below 100 exact matches, so the production threshold falls
        // back to per-municipality means.
        let (joined, mode) = combined(&radiance, &gdp, &[]);
        assert_eq!(JoinMode::MunicipalityMean, mode);
        // Every radiance row with a GDP municipality joins.
        assert_eq!(5, joined.num_rows());
    }

    #[test]
    fn municipios_filter_applies_to_both_sides() {
        let radiance = test_utils::radiance_table();
        let gdp = test_utils::gdp_table();
        let (joined, _) = combined(&radiance, &gdp, &["kanasin".to_string()]);
        let municipios = joined.string_values("Municipio").unwrap();
        assert!(municipios.iter().flatten().all(|m| m == "Kanasin"));
    }

    #[test]
    fn join_with_empty_side_is_empty() {
        let radiance = test_utils::radiance_table();
        let (joined, _) = combined(&radiance, &Table::new(), &[]);
        assert!(joined.is_empty());
    }

    #[test]
    fn quarterly_joins_on_quarter_label() {
        let radiance = test_utils::radiance_table();
        let gdp = test_utils::gdp_table();
        let trend = quarterly(&radiance, &gdp, &[]);
        assert!(trend.has_column("quarter"));
        assert!(trend.has_column("Media_de_radianza_mean"));
        assert!(trend.has_column("pib_mun_mean"));
        // Only quarters present on both sides survive.
        let quarters: Vec<String> = trend
            .string_values("quarter")
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert!(!quarters.is_empty());
        let mut sorted = quarters.clone();
        sorted.sort();
        assert_eq!(sorted, quarters);
    }

    #[test]
    fn duplicate_right_keys_multiply_rows() {
        // Each right-side match contributes a row, so a joined table can hold
        // more rows than the left side when the right side repeats a key.
        let mut left = Table::new();
        left.push_column("key", Column::Text(vec![Some("a".to_string())]));
        let mut right = Table::new();
        right.push_column("value", Column::Number(vec![Some(1.0), Some(2.0)]));
        let left_keys = vec![Some("a".to_string())];
        let right_keys = vec![Some("a".to_string()), Some("a".to_string())];
        let joined = inner_join(&left, &right, &left_keys, &right_keys, ("_luz", "_pib"));
        assert_eq!(2, joined.num_rows());
        assert_eq!(
            Some(vec![Some(1.0), Some(2.0)]),
            joined.numeric_values("value")
        );
    }

    #[test]
    fn unique_right_keys_never_add_rows() {
        let radiance = test_utils::radiance_table();
        let gdp = test_utils::gdp_table();
        let (joined, mode) = combined_with_threshold(&radiance, &gdp, &[], 1);
        assert_eq!(JoinMode::Exact, mode);
        assert!(joined.num_rows() <= radiance.num_rows());
    }

    #[test]
    fn collision_suffixes() {
        let mut left = Table::new();
        left.push_column("key", Column::Text(vec![Some("a".to_string())]));
        left.push_column("value", Column::Number(vec![Some(1.0)]));
        let mut right = Table::new();
        right.push_column("value", Column::Number(vec![Some(2.0)]));
        let keys = vec![Some("a".to_string())];
        let joined = inner_join(&left, &right, &keys, &keys, ("_luz", "_pib"));
        let names: Vec<&str> = joined.column_names().collect();
        assert_eq!(vec!["key", "value_luz", "value_pib"], names);
    }
}
