use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use tracing::instrument;

use crate::error::AppError;
use crate::models::package::*;
use crate::models::plugin::PluginResponse;
use crate::models::shared::{ApiResponse, Empty};
use crate::state::AppState;

/// Multipart field carrying the package archive.
pub const ZIP_FILE_FIELD: &str = "zip-file";

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

#[utoipa::path(
    get,
    path = "/packages",
    tag = "Packages",
    operation_id = "listPackages",
    summary = "List plugin packages",
    description = "Returns every registered package version ordered by id.",
    responses(
        (status = 200, description = "Registered packages", body = ApiResponse<Vec<PackageResponse>>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_packages(State(state): State<AppState>) -> ApiResult<Vec<PackageResponse>> {
    let packages = state.registry.list().await?;
    Ok(Json(ApiResponse::okay(
        packages.into_iter().map(PackageResponse::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/packages",
    tag = "Packages",
    operation_id = "uploadPackage",
    summary = "Upload a plugin package",
    description = "Ingests a package archive sent as the multipart part `zip-file`. The archive must contain `package.toml`, `image.tar` and `ui.zip`; the image and UI bundle are stored in the artifact store and every declared sub-resource is registered atomically. Archive, descriptor and duplicate-version failures are reported with `status: ERROR`.",
    request_body(content_type = "multipart/form-data", description = "Package archive in the `zip-file` part"),
    responses(
        (status = 200, description = "Package registered, or rejected with status ERROR", body = ApiResponse<PackageResponse>),
        (status = 400, description = "Missing or empty `zip-file` part", body = ApiResponse<Empty>),
        (status = 500, description = "Artifact upload or database failure", body = ApiResponse<Empty>),
    ),
)]
#[instrument(skip(state, multipart), fields(file_name))]
pub async fn upload_package(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<PackageResponse> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Upload is not a usable multipart request: {e}");
        AppError::MissingUploadPart
    })?;

    let mut upload: Option<(Option<String>, Vec<u8>)> = None;
    // The loop stops at `zip-file`, so a stream error here means it was never seen.
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!("Multipart stream ended before the zip-file part: {e}");
        AppError::MissingUploadPart
    })? {
        if field.name() == Some(ZIP_FILE_FIELD) {
            let file_name = field.file_name().map(str::to_owned);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
            upload = Some((file_name, data.to_vec()));
            break;
        }
    }

    let (file_name, data) = match upload {
        Some((file_name, data)) if !data.is_empty() => (file_name, data),
        _ => return Err(AppError::MissingUploadPart),
    };
    if let Some(name) = &file_name {
        tracing::Span::current().record("file_name", name.as_str());
    }

    let package = state.registry.ingest(&data, file_name.as_deref()).await?;
    Ok(Json(ApiResponse::okay(PackageResponse::from(package))))
}

#[utoipa::path(
    get,
    path = "/packages/{id}",
    tag = "Packages",
    operation_id = "getPackage",
    summary = "Get a plugin package",
    params(("id" = i32, Path, description = "Package ID")),
    responses(
        (status = 200, description = "The package, or status ERROR if it does not exist", body = ApiResponse<PackageResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<PackageResponse> {
    let package = state.registry.get(id).await?;
    Ok(Json(ApiResponse::okay(PackageResponse::from(package))))
}

#[utoipa::path(
    delete,
    path = "/packages/{id}",
    tag = "Packages",
    operation_id = "deletePackage",
    summary = "Delete a plugin package",
    description = "Removes the package and all sub-resources it owns. Refused with status ERROR while any plugin sharing a name with one of this package's plugins is ONLINE, in any version.",
    params(("id" = i32, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Package deleted, or refused with status ERROR", body = ApiResponse<Empty>),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_package(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Empty> {
    state.registry.delete(id).await?;
    Ok(Json(ApiResponse::okay_empty()))
}

#[utoipa::path(
    get,
    path = "/packages/{id}/dependencies",
    tag = "Package Resources",
    operation_id = "getPackageDependencies",
    summary = "List a package's dependencies",
    params(("id" = i32, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Declared dependencies", body = ApiResponse<DependenciesResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn get_dependencies(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<DependenciesResponse> {
    let (package, dependencies) = state.registry.dependencies(id).await?;
    Ok(Json(ApiResponse::okay(DependenciesResponse {
        package_name: package.name,
        dependencies: dependencies.into_iter().map(Into::into).collect(),
    })))
}

#[utoipa::path(
    get,
    path = "/packages/{id}/menus",
    tag = "Package Resources",
    operation_id = "getPackageMenus",
    summary = "List a package's menus",
    params(("id" = i32, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Menus in declaration order", body = ApiResponse<Vec<MenuResponse>>),
    ),
)]
#[instrument(skip(state))]
pub async fn get_menus(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<MenuResponse>> {
    let menus = state.registry.menus(id).await?;
    Ok(Json(ApiResponse::okay(
        menus.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/packages/{id}/system_parameters",
    tag = "Package Resources",
    operation_id = "getPackageSystemParameters",
    summary = "List a package's system parameters",
    params(("id" = i32, Path, description = "Package ID")),
    responses(
        (status = 200, description = "System parameters in declaration order", body = ApiResponse<Vec<SystemParameterResponse>>),
    ),
)]
#[instrument(skip(state))]
pub async fn get_system_parameters(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<SystemParameterResponse>> {
    let params = state.registry.system_parameters(id).await?;
    Ok(Json(ApiResponse::okay(
        params.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/packages/{id}/authorities",
    tag = "Package Resources",
    operation_id = "getPackageAuthorities",
    summary = "List a package's role-to-menu grants",
    params(("id" = i32, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Authorities in declaration order", body = ApiResponse<Vec<AuthorityResponse>>),
    ),
)]
#[instrument(skip(state))]
pub async fn get_authorities(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<AuthorityResponse>> {
    let authorities = state.registry.authorities(id).await?;
    Ok(Json(ApiResponse::okay(
        authorities.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/packages/{id}/runtime_resources",
    tag = "Package Resources",
    operation_id = "getPackageRuntimeResources",
    summary = "List a package's runtime resources",
    params(("id" = i32, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Docker, MySQL and S3 resources", body = ApiResponse<RuntimeResourcesResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn get_runtime_resources(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<RuntimeResourcesResponse> {
    let resources = state.registry.runtime_resources(id).await?;
    Ok(Json(ApiResponse::okay(resources.into())))
}

#[utoipa::path(
    get,
    path = "/packages/{id}/plugins",
    tag = "Package Resources",
    operation_id = "getPackagePlugins",
    summary = "List a package's plugins",
    params(("id" = i32, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Plugins in declaration order", body = ApiResponse<Vec<PluginResponse>>),
    ),
)]
#[instrument(skip(state))]
pub async fn get_plugins(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<PluginResponse>> {
    let plugins = state.registry.plugins(id).await?;
    Ok(Json(ApiResponse::okay(
        plugins.into_iter().map(Into::into).collect(),
    )))
}

pub fn upload_body_limit(max_archive_size: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_archive_size)
}
