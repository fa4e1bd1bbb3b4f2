pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod package;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use common::storage::filesystem::FilesystemArtifactStore;
use common::storage::memory::MemoryArtifactStore;
use common::storage::s3::S3ArtifactStore;
use common::storage::{ArtifactStore, StorageError};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{CorsConfig, StorageBackend, StorageConfig, UploadConfig};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Plugin Package Registry API",
        version = "1.0.0",
        description = "Upload, inspect and remove versioned plugin packages"
    ),
    tags(
        (name = "Packages", description = "Package upload, listing and removal"),
        (name = "Package Resources", description = "Sub-resources declared by a package"),
        (name = "Plugins", description = "Plugin activation"),
    ),
)]
struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(routes::api_routes(&state.config))
        .split_for_parts();

    let cors = cors_layer(&state.config.server.cors);

    router
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
        .layer(cors)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age))
}

/// Construct the artifact store selected by `storage.backend`.
pub async fn build_artifact_store(
    storage: &StorageConfig,
    upload: &UploadConfig,
) -> Result<Arc<dyn ArtifactStore>, StorageError> {
    let store: Arc<dyn ArtifactStore> = match storage.backend {
        StorageBackend::S3 => {
            Arc::new(S3ArtifactStore::new(
                required(&storage.endpoint, "endpoint")?,
                &storage.region,
                required(&storage.access_key, "access_key")?,
                required(&storage.secret_key, "secret_key")?,
                storage.public_url.as_deref(),
            )?)
        }
        StorageBackend::Filesystem => {
            let public_url = storage
                .public_url
                .clone()
                .unwrap_or_else(|| format!("file://{}", storage.local_dir.display()));
            Arc::new(
                FilesystemArtifactStore::new(
                    storage.local_dir.clone(),
                    public_url,
                    upload.max_archive_size as u64,
                )
                .await?,
            )
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory artifact store; artifacts are lost on restart");
            Arc::new(MemoryArtifactStore::new("localhost"))
        }
    };
    Ok(store)
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, StorageError> {
    value
        .as_deref()
        .ok_or_else(|| StorageError::Backend(format!("storage.{key} is required")))
}
