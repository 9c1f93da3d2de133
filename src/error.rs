//! Error handling.

use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_smithy_types::byte_stream::error::Error as ByteStreamError;
use axum::{
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{event, Level};

/// Whether error envelopes carry the diagnostic cause chain.
static DEBUG: AtomicBool = AtomicBool::new(false);

/// Enable or disable diagnostic detail in error envelopes.
///
/// Called once at startup from the `--debug` flag.
pub fn set_debug(enabled: bool) {
    DEBUG.store(enabled, Ordering::Relaxed);
}

/// Radiant server error type
///
/// This type encapsulates the various errors that may occur.
/// Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum RadiantError {
    /// Object storage credentials were not configured
    #[error("object storage credentials are not configured")]
    CredentialsMissing,

    /// Error while retrieving a dataset from object storage
    #[error("error retrieving dataset from object storage")]
    S3GetObject(#[from] Box<SdkError<GetObjectError>>),

    /// Error reading dataset bytes from object storage
    #[error("error receiving dataset from object storage")]
    S3ByteStream(#[from] ByteStreamError),

    /// Dataset payload failed to parse as tabular CSV, or CSV rendering
    /// failed
    #[error("failed to process CSV data")]
    Csv(#[from] csv::Error),

    /// A column an endpoint requires is absent from the dataset
    #[error("column '{column}' does not exist in the dataset")]
    SchemaMismatch { column: String },

    /// A requested municipality has no rows after filtering
    #[error("municipio '{name}' not found")]
    NotFound { name: String },

    /// A date request parameter failed to parse
    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },
}

impl From<SdkError<GetObjectError>> for RadiantError {
    fn from(error: SdkError<GetObjectError>) -> Self {
        RadiantError::S3GetObject(Box::new(error))
    }
}

impl IntoResponse for RadiantError {
    /// Convert from a `RadiantError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of an error response
///
/// Every error renders the `success: false` envelope. The `detail` cause
/// chain is only populated when the debug flag is set.
#[derive(Serialize)]
struct ErrorBody {
    /// Always `false`
    success: bool,

    /// Main error message
    error: String,

    /// Optional list of causes, gated by the debug flag
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<Vec<String>>,
}

impl ErrorBody {
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let mut detail = None;
        if DEBUG.load(Ordering::Relaxed) {
            let mut causes = Vec::new();
            let mut current = error.source();
            while let Some(source) = current {
                causes.push(source.to_string());
                current = source.source();
            }
            causes.dedup();
            if !causes.is_empty() {
                detail = Some(causes);
            }
        }
        ErrorBody {
            success: false,
            error: error.to_string(),
            detail,
        }
    }
}

/// A response to send in error cases
struct ErrorResponse {
    /// HTTP status of the response
    status: StatusCode,

    /// Response body
    body: ErrorBody,
}

impl ErrorResponse {
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            body: ErrorBody::new(error),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 401 unauthorised ErrorResponse
    fn unauthorised<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::UNAUTHORIZED, error)
    }

    /// Return a 404 not found ErrorResponse
    fn not_found<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<RadiantError> for ErrorResponse {
    /// Convert from a `RadiantError` into an `ErrorResponse`.
    fn from(error: RadiantError) -> Self {
        let response = match &error {
            // Bad request
            RadiantError::SchemaMismatch { column: _ }
            | RadiantError::InvalidDate { value: _ } => Self::bad_request(&error),

            // Not found
            RadiantError::NotFound { name: _ } => Self::not_found(&error),

            // Internal server error
            RadiantError::CredentialsMissing
            | RadiantError::S3ByteStream(_)
            | RadiantError::Csv(_) => Self::internal_server_error(&error),

            RadiantError::S3GetObject(sdk_error) => {
                // Tailor the response based on the specific SdkError variant.
                match sdk_error.as_ref() {
                    SdkError::ConstructionFailure(_)
                    | SdkError::DispatchFailure(_)
                    | SdkError::ResponseError(_)
                    | SdkError::TimeoutError(_) => Self::internal_server_error(&error),

                    SdkError::ServiceError(get_obj_error) => {
                        let get_obj_error = get_obj_error.err();
                        match get_obj_error {
                            GetObjectError::InvalidObjectState(_)
                            | GetObjectError::NoSuchKey(_) => Self::bad_request(&error),

                            // Quite a lot of error cases end up as unhandled. Attempt to determine
                            // the error from the code.
                            _ => {
                                match get_obj_error.code() {
                                    // Bad request
                                    Some("NoSuchBucket") => Self::bad_request(&error),

                                    // Unauthorised
                                    Some("InvalidAccessKeyId")
                                    | Some("SignatureDoesNotMatch")
                                    | Some("AccessDenied") => Self::unauthorised(&error),

                                    // Internal server error
                                    _ => Self::internal_server_error(&error),
                                }
                            }
                        }
                    }

                    // The enum is marked as non-exhaustive
                    _ => Self::internal_server_error(&error),
                }
            }
        };

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string(&self.body);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}
