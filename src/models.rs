//! Response envelope types.
//!
//! Every JSON endpoint responds with a `success` flag alongside its payload;
//! error envelopes are built in [crate::error]. Field names are part of the
//! wire contract and keep the original Spanish spellings.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Tabular rows plus their count.
#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub success: bool,
    pub data: Vec<Value>,
    pub total_records: usize,
}

impl RecordsResponse {
    pub fn new(data: Vec<Value>) -> Self {
        let total_records = data.len();
        RecordsResponse {
            success: true,
            data,
            total_records,
        }
    }
}

/// Rows for a single municipality, echoing the decoded name.
#[derive(Debug, Serialize)]
pub struct MunicipioResponse {
    pub success: bool,
    pub data: Vec<Value>,
    pub municipio: String,
}

impl MunicipioResponse {
    pub fn new(data: Vec<Value>, municipio: String) -> Self {
        MunicipioResponse {
            success: true,
            data,
            municipio,
        }
    }
}

/// The combined radiance and GDP view, disclosing the join strategy used.
#[derive(Debug, Serialize)]
pub struct CombinedResponse {
    pub success: bool,
    pub data: Vec<Value>,
    pub total_records: usize,
    pub join_mode: String,
}

impl CombinedResponse {
    pub fn new(data: Vec<Value>, join_mode: String) -> Self {
        let total_records = data.len();
        CombinedResponse {
            success: true,
            data,
            total_records,
            join_mode,
        }
    }
}

/// Distinct years, most recent first.
#[derive(Debug, Serialize)]
pub struct YearsResponse {
    pub success: bool,
    pub years: Vec<i32>,
}

impl YearsResponse {
    pub fn new(years: Vec<i32>) -> Self {
        YearsResponse {
            success: true,
            years,
        }
    }
}

/// Distinct municipality names, ascending.
#[derive(Debug, Serialize)]
pub struct MunicipiosResponse {
    pub success: bool,
    pub municipios: Vec<String>,
}

impl MunicipiosResponse {
    pub fn new(municipios: Vec<String>) -> Self {
        MunicipiosResponse {
            success: true,
            municipios,
        }
    }
}

/// Distinct federal entity names, ascending.
#[derive(Debug, Serialize)]
pub struct EntidadesResponse {
    pub success: bool,
    pub entidades: Vec<String>,
}

impl EntidadesResponse {
    pub fn new(entidades: Vec<String>) -> Self {
        EntidadesResponse {
            success: true,
            entidades,
        }
    }
}

/// Dataset-wide radiance statistics.
#[derive(Debug, Serialize)]
pub struct RadianceGeneralStats {
    pub total_records: usize,
    pub total_municipios: usize,
    pub fecha_min: String,
    pub fecha_max: String,
    pub radianza_promedio: f64,
    pub radianza_maxima: f64,
    pub radianza_minima: f64,
}

/// Radiance statistics envelope: general figures plus a per-municipality
/// aggregation keyed by municipality name.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub general: RadianceGeneralStats,
    pub by_municipio: BTreeMap<String, Value>,
}

impl StatsResponse {
    pub fn new(general: RadianceGeneralStats, by_municipio: BTreeMap<String, Value>) -> Self {
        StatsResponse {
            success: true,
            general,
            by_municipio,
        }
    }
}

/// Dataset-wide GDP statistics.
#[derive(Debug, Serialize)]
pub struct GdpGeneralStats {
    pub total_records: usize,
    pub total_municipios: usize,
    pub total_entidades: usize,
    pub fecha_min: String,
    pub fecha_max: String,
    pub pib_mun_promedio: f64,
    pub pib_mun_maximo: f64,
    pub pib_mun_minimo: f64,
    pub pibe_promedio: f64,
}

/// GDP statistics envelope.
#[derive(Debug, Serialize)]
pub struct GdpStatsResponse {
    pub success: bool,
    pub general: GdpGeneralStats,
}

impl GdpStatsResponse {
    pub fn new(general: GdpGeneralStats) -> Self {
        GdpStatsResponse {
            success: true,
            general,
        }
    }
}

/// Ranking of municipalities by an aggregated metric.
#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub success: bool,
    pub data: Vec<Value>,
}

impl ComparisonResponse {
    pub fn new(data: Vec<Value>) -> Self {
        ComparisonResponse {
            success: true,
            data,
        }
    }
}

/// Liveness probe payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

impl HealthResponse {
    pub fn new() -> Self {
        HealthResponse {
            status: "healthy",
            service: "radiant",
        }
    }
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Dataset introspection payload.
#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub success: bool,
    pub columns: Vec<String>,
    pub shape: (usize, usize),
    pub dtypes: BTreeMap<String, String>,
    pub sample_data: Vec<Value>,
    pub null_counts: BTreeMap<String, usize>,
}

/// A CSV attachment download. Rendered with its Content-Disposition header
/// in [crate::app].
#[derive(Debug)]
pub struct CsvAttachment {
    pub filename: String,
    pub body: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_envelope() {
        let response = RecordsResponse::new(vec![Value::Null, Value::Null]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(true, json["success"]);
        assert_eq!(2, json["total_records"]);
    }

    #[test]
    fn municipio_envelope_has_no_record_count() {
        let response = MunicipioResponse::new(vec![], "Mérida".to_string());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!("Mérida", json["municipio"]);
        assert!(json.get("total_records").is_none());
    }

    #[test]
    fn combined_envelope_discloses_join_mode() {
        let response = CombinedResponse::new(vec![], "exact".to_string());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!("exact", json["join_mode"]);
        assert_eq!(0, json["total_records"]);
    }

    #[test]
    fn health_payload() {
        let json = serde_json::to_value(HealthResponse::new()).unwrap();
        assert_eq!("healthy", json["status"]);
        assert_eq!("radiant", json["service"]);
    }
}
