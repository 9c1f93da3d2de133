//! HTTP API.
//!
//! All routes live under `/api`. Read endpoints share the [QueryParams]
//! extractor and the filter pipeline in [crate::filter]; the handlers here
//! only sequence cache reads, table operations and envelope construction.

use crate::aggregate::{self, AggSpec, Reducer};
use crate::app_state::{AppState, SharedAppState};
use crate::cli::CommandLineArgs;
use crate::coerce;
use crate::dataset::DatasetId;
use crate::error::{self, RadiantError};
use crate::filter::{self, LimitMode};
use crate::join;
use crate::models;
use crate::query::QueryParams;
use crate::render::{self, MissingPolicy};
use crate::table::Table;

use axum::{
    extract::{Path, State},
    http::header,
    http::HeaderValue,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::layer::Layer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

impl IntoResponse for models::CsvAttachment {
    fn into_response(self) -> Response {
        (
            [
                (
                    &header::CONTENT_TYPE,
                    "text/csv; charset=utf-8".to_string(),
                ),
                (
                    &header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", self.filename),
                ),
            ],
            self.body,
        )
            .into_response()
    }
}

/// The service type served by [crate::server].
pub type Service = NormalizePath<Router>;

/// Build the service: the router behind trailing-slash normalization.
pub fn service(args: &CommandLineArgs) -> Service {
    error::set_debug(args.debug);
    let state = Arc::new(AppState::new(args));
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Build the API router over shared state.
pub fn router(state: SharedAppState) -> Router {
    let cors = cors_layer(&state.args.cors_origins);
    Router::new()
        .route("/api/health", get(health))
        .route("/api/data", get(data))
        .route("/api/years", get(years))
        .route("/api/municipios", get(municipios))
        .route("/api/municipio/:municipio", get(municipio_detail))
        .route("/api/stats", get(stats))
        .route("/api/comparison", get(comparison))
        .route("/api/download", get(download))
        .route("/api/pib/data", get(pib_data))
        .route("/api/pib/municipios", get(pib_municipios))
        .route("/api/pib/entidades", get(pib_entidades))
        .route("/api/pib/years", get(pib_years))
        .route("/api/pib/municipio/:municipio", get(pib_municipio_detail))
        .route("/api/pib/stats", get(pib_stats))
        .route("/api/pib/download", get(pib_download))
        .route("/api/eda/combined", get(eda_combined))
        .route("/api/eda/quarterly", get(eda_quarterly))
        .route("/api/debug", get(debug_info))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Fail with a [RadiantError::SchemaMismatch] naming the first absent column.
fn require_columns(table: &Table, columns: &[&str]) -> Result<(), RadiantError> {
    for column in columns {
        if !table.has_column(column) {
            return Err(RadiantError::SchemaMismatch {
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

async fn health() -> Json<models::HealthResponse> {
    Json(models::HealthResponse::new())
}

async fn data(
    State(state): State<SharedAppState>,
    params: QueryParams,
) -> Result<Json<models::RecordsResponse>, RadiantError> {
    let table = state.cache.get(DatasetId::Radiance).await?;
    let schema = DatasetId::Radiance.schema();
    let filtered = filter::apply_listing(&table, schema, &params, LimitMode::Head)?;
    let records = render::to_json_records(&filtered, MissingPolicy::EmptyString);
    Ok(Json(models::RecordsResponse::new(records)))
}

async fn years(
    State(state): State<SharedAppState>,
) -> Result<Json<models::YearsResponse>, RadiantError> {
    let table = state.cache.get(DatasetId::Radiance).await?;
    let schema = DatasetId::Radiance.schema();
    require_columns(&table, &[schema.date_column])?;
    Ok(Json(models::YearsResponse::new(aggregate::distinct_years(
        &table,
        schema.date_column,
    ))))
}

async fn municipios(
    State(state): State<SharedAppState>,
) -> Result<Json<models::MunicipiosResponse>, RadiantError> {
    let table = state.cache.get(DatasetId::Radiance).await?;
    let schema = DatasetId::Radiance.schema();
    require_columns(&table, &[schema.key_column])?;
    Ok(Json(models::MunicipiosResponse::new(
        aggregate::distinct_strings(&table, schema.key_column),
    )))
}

/// Shared by the radiance and GDP detail endpoints.
async fn municipio_rows(
    state: &AppState,
    dataset: DatasetId,
    municipio: String,
    params: QueryParams,
) -> Result<(Table, String), RadiantError> {
    let table = state.cache.get(dataset).await?;
    let schema = dataset.schema();
    require_columns(&table, &[schema.key_column])?;
    // Path segments arrive percent-decoded; legacy callers also encode
    // spaces as '+'.
    let decoded = municipio.replace('+', " ");
    let params = QueryParams {
        municipio: Some(decoded.clone()),
        municipios: Vec::new(),
        entidad: None,
        columns: None,
        ..params
    };
    let filtered = filter::apply_listing(&table, schema, &params, LimitMode::Tail)?;
    if filtered.is_empty() {
        return Err(RadiantError::NotFound { name: decoded });
    }
    Ok((filtered, decoded))
}

async fn municipio_detail(
    State(state): State<SharedAppState>,
    Path(municipio): Path<String>,
    params: QueryParams,
) -> Result<Json<models::MunicipioResponse>, RadiantError> {
    let (rows, decoded) = municipio_rows(&state, DatasetId::Radiance, municipio, params).await?;
    let records = render::to_json_records(&rows, MissingPolicy::EmptyString);
    Ok(Json(models::MunicipioResponse::new(records, decoded)))
}

/// The dataset-wide value of one reducer over a column, defaulting to zero.
fn column_stat(table: &Table, column: &str, reducer: Reducer) -> f64 {
    table
        .numeric_values(column)
        .and_then(|values| reducer.reduce(&values))
        .unwrap_or(0.0)
}

/// Minimum and maximum of the date column as wire strings.
fn date_bounds(table: &Table, column: &str) -> (String, String) {
    let bounds = table.date_values(column).and_then(|dates| {
        let mut dates = dates.into_iter().flatten();
        let first = dates.next()?;
        let (min, max) = dates.fold((first, first), |(min, max), date| {
            (min.min(date), max.max(date))
        });
        Some((coerce::format_date(min), coerce::format_date(max)))
    });
    bounds.unwrap_or_else(|| ("N/A".to_string(), "N/A".to_string()))
}

async fn stats(
    State(state): State<SharedAppState>,
) -> Result<Json<models::StatsResponse>, RadiantError> {
    let table = state.cache.get(DatasetId::Radiance).await?;
    let schema = DatasetId::Radiance.schema();
    require_columns(
        &table,
        &[
            schema.key_column,
            "Media_de_radianza",
            "Maximo_de_radianza",
            "Minimo_de_radianza",
        ],
    )?;

    let aggregated = aggregate::group_by(
        &table,
        schema.key_column,
        &[
            AggSpec::new(
                "Media_de_radianza",
                &[Reducer::Mean, Reducer::Max, Reducer::Min],
            ),
            AggSpec::new("Suma_de_radianza", &[Reducer::Sum]),
            AggSpec::new("Cantidad_de_pixeles", &[Reducer::Sum]),
        ],
    );
    let aggregated = aggregate::round_numbers(&aggregated);

    let mut by_municipio = BTreeMap::new();
    if let Some(keys) = aggregated.string_values(schema.key_column) {
        for (row, key) in keys.into_iter().enumerate() {
            let Some(key) = key else { continue };
            let mut entry = Map::new();
            for (name, _) in aggregated.iter().skip(1) {
                let value = aggregated
                    .numeric_values(name)
                    .and_then(|values| values[row])
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null);
                entry.insert(name.to_string(), value);
            }
            by_municipio.insert(key, Value::Object(entry));
        }
    }

    let (fecha_min, fecha_max) = date_bounds(&table, schema.date_column);
    let general = models::RadianceGeneralStats {
        total_records: table.num_rows(),
        total_municipios: aggregate::distinct_count(&table, schema.key_column),
        fecha_min,
        fecha_max,
        radianza_promedio: column_stat(&table, "Media_de_radianza", Reducer::Mean),
        radianza_maxima: column_stat(&table, "Maximo_de_radianza", Reducer::Max),
        radianza_minima: column_stat(&table, "Minimo_de_radianza", Reducer::Min),
    };
    Ok(Json(models::StatsResponse::new(general, by_municipio)))
}

async fn comparison(
    State(state): State<SharedAppState>,
    params: QueryParams,
) -> Result<Json<models::ComparisonResponse>, RadiantError> {
    let table = state.cache.get(DatasetId::Radiance).await?;
    let schema = DatasetId::Radiance.schema();
    let metric = params.metric.as_deref().unwrap_or("Media_de_radianza");
    require_columns(&table, &[schema.key_column, metric])?;
    let top = params.top.filter(|top| *top > 0).unwrap_or(10) as usize;

    let table = match params.year {
        Some(year) => filter::filter_year(&table, schema.date_column, year),
        None => (*table).clone(),
    };
    let aggregated = aggregate::group_by(
        &table,
        schema.key_column,
        &[AggSpec::new(metric, &[Reducer::Mean])],
    );
    // The single aggregate goes on the wire as `promedio`.
    let mut ranking = Table::new();
    if let (Some(keys), Some(means)) = (
        aggregated.column(schema.key_column),
        aggregated.column(metric),
    ) {
        ranking.push_column(schema.key_column, keys.clone());
        ranking.push_column("promedio", means.clone());
    }
    let ranking = aggregate::sort_by_number_desc(&ranking, "promedio").head(top);
    let ranking = aggregate::round_numbers(&ranking);
    let records = render::to_json_records(&ranking, MissingPolicy::EmptyString);
    Ok(Json(models::ComparisonResponse::new(records)))
}

async fn download(
    State(state): State<SharedAppState>,
    params: QueryParams,
) -> Result<models::CsvAttachment, RadiantError> {
    let table = state.cache.get(DatasetId::Radiance).await?;
    let schema = DatasetId::Radiance.schema();
    let unlimited = QueryParams {
        limit: None,
        ..params.clone()
    };
    let filtered = filter::apply_listing(&table, schema, &unlimited, LimitMode::Head)?;
    let filename = render::download_filename(
        "datos_radianza",
        &params.municipios,
        params.municipio.as_deref(),
        params.year,
    );
    Ok(models::CsvAttachment {
        filename,
        body: render::to_csv(&filtered)?,
    })
}

async fn pib_data(
    State(state): State<SharedAppState>,
    params: QueryParams,
) -> Result<Json<models::RecordsResponse>, RadiantError> {
    let table = state.cache.get(DatasetId::Gdp).await?;
    let schema = DatasetId::Gdp.schema();
    let filtered = filter::apply_listing(&table, schema, &params, LimitMode::Head)?;
    let records = render::to_json_records(&filtered, MissingPolicy::EmptyString);
    Ok(Json(models::RecordsResponse::new(records)))
}

async fn pib_municipios(
    State(state): State<SharedAppState>,
) -> Result<Json<models::MunicipiosResponse>, RadiantError> {
    let table = state.cache.get(DatasetId::Gdp).await?;
    let schema = DatasetId::Gdp.schema();
    require_columns(&table, &[schema.key_column])?;
    Ok(Json(models::MunicipiosResponse::new(
        aggregate::distinct_strings(&table, schema.key_column),
    )))
}

async fn pib_entidades(
    State(state): State<SharedAppState>,
) -> Result<Json<models::EntidadesResponse>, RadiantError> {
    let table = state.cache.get(DatasetId::Gdp).await?;
    require_columns(&table, &["entidad_federativa"])?;
    Ok(Json(models::EntidadesResponse::new(
        aggregate::distinct_strings(&table, "entidad_federativa"),
    )))
}

async fn pib_years(
    State(state): State<SharedAppState>,
) -> Result<Json<models::YearsResponse>, RadiantError> {
    let table = state.cache.get(DatasetId::Gdp).await?;
    let schema = DatasetId::Gdp.schema();
    require_columns(&table, &[schema.date_column])?;
    Ok(Json(models::YearsResponse::new(aggregate::distinct_years(
        &table,
        schema.date_column,
    ))))
}

async fn pib_municipio_detail(
    State(state): State<SharedAppState>,
    Path(municipio): Path<String>,
    params: QueryParams,
) -> Result<Json<models::MunicipioResponse>, RadiantError> {
    let (rows, decoded) = municipio_rows(&state, DatasetId::Gdp, municipio, params).await?;
    let records = render::to_json_records(&rows, MissingPolicy::EmptyString);
    Ok(Json(models::MunicipioResponse::new(records, decoded)))
}

async fn pib_stats(
    State(state): State<SharedAppState>,
) -> Result<Json<models::GdpStatsResponse>, RadiantError> {
    let table = state.cache.get(DatasetId::Gdp).await?;
    let schema = DatasetId::Gdp.schema();
    let (fecha_min, fecha_max) = date_bounds(&table, schema.date_column);
    let general = models::GdpGeneralStats {
        total_records: table.num_rows(),
        total_municipios: aggregate::distinct_count(&table, schema.key_column),
        total_entidades: aggregate::distinct_count(&table, "entidad_federativa"),
        fecha_min,
        fecha_max,
        pib_mun_promedio: column_stat(&table, "pib_mun", Reducer::Mean),
        pib_mun_maximo: column_stat(&table, "pib_mun", Reducer::Max),
        pib_mun_minimo: column_stat(&table, "pib_mun", Reducer::Min),
        pibe_promedio: column_stat(&table, "pibe", Reducer::Mean),
    };
    Ok(Json(models::GdpStatsResponse::new(general)))
}

/// Columns included in the GDP download, in wire order.
const PIB_DOWNLOAD_COLUMNS: &[&str] = &["fecha", "municipio", "entidad_federativa", "pib_mun"];

async fn pib_download(
    State(state): State<SharedAppState>,
    params: QueryParams,
) -> Result<models::CsvAttachment, RadiantError> {
    let table = state.cache.get(DatasetId::Gdp).await?;
    let schema = DatasetId::Gdp.schema();
    let unlimited = QueryParams {
        limit: None,
        year: None,
        columns: None,
        ..params.clone()
    };
    let filtered = filter::apply_listing(&table, schema, &unlimited, LimitMode::Head)?;
    let filtered = filtered.select(PIB_DOWNLOAD_COLUMNS);
    let filename = render::download_filename(
        "datos_pib",
        &params.municipios,
        params.municipio.as_deref(),
        None,
    );
    Ok(models::CsvAttachment {
        filename,
        body: render::to_csv(&filtered)?,
    })
}

async fn eda_combined(
    State(state): State<SharedAppState>,
    params: QueryParams,
) -> Result<Json<models::CombinedResponse>, RadiantError> {
    let radiance = state.cache.get(DatasetId::Radiance).await?;
    let gdp = state.cache.get(DatasetId::Gdp).await?;
    let (joined, mode) = join::combined(&radiance, &gdp, &params.municipios);
    let records = render::to_json_records(&joined, MissingPolicy::EmptyString);
    Ok(Json(models::CombinedResponse::new(
        records,
        mode.to_string(),
    )))
}

async fn eda_quarterly(
    State(state): State<SharedAppState>,
    params: QueryParams,
) -> Result<Json<models::RecordsResponse>, RadiantError> {
    let radiance = state.cache.get(DatasetId::Radiance).await?;
    let gdp = state.cache.get(DatasetId::Gdp).await?;
    let trend = join::quarterly(&radiance, &gdp, &params.municipios);
    let records = render::to_json_records(&trend, MissingPolicy::Zero);
    Ok(Json(models::RecordsResponse::new(records)))
}

async fn debug_info(
    State(state): State<SharedAppState>,
) -> Result<Json<models::DebugResponse>, RadiantError> {
    let table = state.cache.get(DatasetId::Radiance).await?;
    let columns: Vec<String> = table.column_names().map(str::to_string).collect();
    let dtypes = table
        .iter()
        .map(|(name, column)| (name.to_string(), column.dtype().to_string()))
        .collect();
    let null_counts = table
        .iter()
        .map(|(name, column)| (name.to_string(), column.null_count()))
        .collect();
    Ok(Json(models::DebugResponse {
        success: true,
        columns,
        shape: (table.num_rows(), table.num_columns()),
        dtypes,
        sample_data: render::to_json_records(&table.head(3), MissingPolicy::EmptyString),
        null_counts,
    }))
}
