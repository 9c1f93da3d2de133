//! Query-string parameters.
//!
//! Every read endpoint accepts a subset of the same parameters, so a single
//! [QueryParams] extractor parses the raw query string. Parsing is lenient by
//! design: repeated `municipios` keys accumulate, malformed numeric values
//! are ignored rather than rejected, and unknown keys are skipped.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

/// Filter, projection and limit parameters decoded from a query string.
///
/// Constructed per request and discarded afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryParams {
    /// Single municipality filter; ignored when `municipios` is non-empty.
    pub municipio: Option<String>,
    /// Repeatable municipality list filter.
    pub municipios: Vec<String>,
    /// Federal entity filter (GDP dataset only).
    pub entidad: Option<String>,
    /// Inclusive lower date bound, unparsed.
    pub from: Option<String>,
    /// Inclusive upper date bound, unparsed.
    pub to: Option<String>,
    /// Exact year filter.
    pub year: Option<i32>,
    /// Comma-separated column projection.
    pub columns: Option<String>,
    /// Row limit; non-positive values mean no limit.
    pub limit: Option<i64>,
    /// Ranking metric column (comparison endpoint).
    pub metric: Option<String>,
    /// Ranking size (comparison endpoint).
    pub top: Option<i64>,
}

impl QueryParams {
    /// Parse a raw query string.
    pub fn parse(query: &str) -> Self {
        let mut params = QueryParams::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.into_owned();
            match key.as_ref() {
                "municipio" => params.municipio = Some(value),
                "municipios" => params.municipios.push(value),
                "entidad" => params.entidad = Some(value),
                "from" => params.from = Some(value),
                "to" => params.to = Some(value),
                "year" => params.year = value.parse().ok(),
                "columns" => params.columns = Some(value),
                "limit" => params.limit = value.parse().ok(),
                "metric" => params.metric = Some(value),
                "top" => params.top = value.parse().ok(),
                _ => (),
            }
        }
        params
    }

    /// The effective row limit: only positive limits apply.
    pub fn effective_limit(&self) -> Option<usize> {
        match self.limit {
            Some(limit) if limit > 0 => Some(limit as usize),
            _ => None,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(QueryParams::parse(parts.uri.query().unwrap_or("")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query() {
        assert_eq!(QueryParams::default(), QueryParams::parse(""));
    }

    #[test]
    fn repeated_municipios() {
        let params = QueryParams::parse("municipios=Merida&municipios=Kanas%C3%ADn");
        assert_eq!(vec!["Merida", "Kanasín"], params.municipios);
    }

    #[test]
    fn plus_decodes_to_space() {
        let params = QueryParams::parse("municipio=San+Felipe");
        assert_eq!(Some("San Felipe".to_string()), params.municipio);
    }

    #[test]
    fn numeric_params() {
        let params = QueryParams::parse("year=2020&limit=25&top=5");
        assert_eq!(Some(2020), params.year);
        assert_eq!(Some(25), params.limit);
        assert_eq!(Some(5), params.top);
    }

    #[test]
    fn malformed_numbers_are_ignored() {
        let params = QueryParams::parse("year=abc&limit=xyz");
        assert_eq!(None, params.year);
        assert_eq!(None, params.limit);
    }

    #[test]
    fn negative_limit_means_no_limit() {
        assert_eq!(None, QueryParams::parse("limit=-5").effective_limit());
        assert_eq!(None, QueryParams::parse("limit=0").effective_limit());
        assert_eq!(Some(7), QueryParams::parse("limit=7").effective_limit());
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let params = QueryParams::parse("foo=bar&columns=Fecha,Municipio");
        assert_eq!(Some("Fecha,Municipio".to_string()), params.columns);
    }
}
