use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;

use crate::models::shared::{ApiResponse, Empty};
use crate::package::RegistryError;

pub const MISSING_ZIP_FILE: &str = "Required request part 'zip-file' is not present";

/// Application-level error type.
///
/// Every variant renders as the `{status:"ERROR", message, data:null}`
/// envelope; only the HTTP status differs.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request body or path.
    Validation(String),
    /// The multipart `zip-file` part is absent or empty.
    MissingUploadPart,
    /// A recoverable registry failure, reported in-band with HTTP 200.
    Domain(String),
    Internal(String),
}

impl AppError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::MissingUploadPart => (StatusCode::BAD_REQUEST, MISSING_ZIP_FILE.into()),
            AppError::Domain(msg) => (StatusCode::OK, msg),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".into(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(ApiResponse::<Empty>::error(message))).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::PackageNotFound(_) | RegistryError::PluginNotFound(_) => {
                AppError::Domain(err.to_string())
            }
            RegistryError::PackageInUse { .. } | RegistryError::DuplicatePackage { .. } => {
                tracing::warn!("Registry request rejected: {err}");
                AppError::Domain(err.to_string())
            }
            RegistryError::InvalidArchive(_) | RegistryError::DescriptorParse { .. } => {
                tracing::warn!("Rejected package upload: {err}");
                AppError::Domain(err.to_string())
            }
            RegistryError::Upload(_) | RegistryError::Database(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}
