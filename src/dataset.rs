//! Dataset identities and their column layout.
//!
//! Wire-level column names keep the spelling used by the source CSV files:
//! the radiance dataset capitalizes its columns (`Municipio`, `Fecha`) while
//! the GDP dataset is lowercase (`municipio`, `fecha`).

use strum_macros::Display;

/// Logical dataset identifier. One cache entry exists per variant.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum DatasetId {
    /// Night-time radiance statistics per (municipality, date).
    Radiance,
    /// Municipal GDP figures per (municipality, date).
    Gdp,
}

/// The columns an endpoint needs to know about for a dataset.
pub struct DatasetSchema {
    /// Categorical municipality key.
    pub key_column: &'static str,
    /// Day-granularity date column.
    pub date_column: &'static str,
    /// Federal entity column, where the dataset has one.
    pub entity_column: Option<&'static str>,
    /// Columns stored with a comma decimal separator; normalized at decode.
    pub locale_numeric_columns: &'static [&'static str],
}

const RADIANCE_SCHEMA: DatasetSchema = DatasetSchema {
    key_column: "Municipio",
    date_column: "Fecha",
    entity_column: None,
    locale_numeric_columns: &[],
};

const GDP_SCHEMA: DatasetSchema = DatasetSchema {
    key_column: "municipio",
    date_column: "fecha",
    entity_column: Some("entidad_federativa"),
    locale_numeric_columns: GDP_NUMERIC_COLUMNS,
};

/// Radiance statistics columns aggregated by the quarterly endpoint.
pub const RADIANCE_NUMERIC_COLUMNS: &[&str] = &[
    "Cantidad_de_pixeles",
    "total_pixeles",
    "Suma_de_radianza",
    "Media_de_radianza",
    "Desviacion_estandar_de_radianza",
    "Maximo_de_radianza",
    "Minimo_de_radianza",
    "Percentil_25_de_radianza",
    "Percentil_50_de_radianza",
    "Percentil_75_de_radianza",
];

/// GDP numeric columns; these use a comma decimal separator in the source.
pub const GDP_NUMERIC_COLUMNS: &[&str] = &["porc_pob", "pibe", "pib_mun"];

impl DatasetId {
    /// Column layout for this dataset.
    pub fn schema(self) -> &'static DatasetSchema {
        match self {
            DatasetId::Radiance => &RADIANCE_SCHEMA,
            DatasetId::Gdp => &GDP_SCHEMA,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names() {
        assert_eq!("radiance", DatasetId::Radiance.to_string());
        assert_eq!("gdp", DatasetId::Gdp.to_string());
    }

    #[test]
    fn schemas() {
        assert_eq!("Municipio", DatasetId::Radiance.schema().key_column);
        assert_eq!(
            Some("entidad_federativa"),
            DatasetId::Gdp.schema().entity_column
        );
        assert!(DatasetId::Gdp
            .schema()
            .locale_numeric_columns
            .contains(&"pib_mun"));
    }
}
