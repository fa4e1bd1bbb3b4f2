use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::error::AppError;
use crate::extractors::json::AppJson;
use crate::models::plugin::{EnablePluginRequest, PluginResponse};
use crate::models::shared::ApiResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/plugins/{id}/enable",
    tag = "Plugins",
    operation_id = "enablePlugin",
    summary = "Bring a plugin online",
    description = "Binds the plugin to a business entity and sets its status to ONLINE. While online, no package declaring a plugin of the same name can be deleted.",
    params(("id" = i32, Path, description = "Plugin ID")),
    request_body = EnablePluginRequest,
    responses(
        (status = 200, description = "Updated plugin, or status ERROR if it does not exist", body = ApiResponse<PluginResponse>),
        (status = 400, description = "Malformed request body", body = ApiResponse<crate::models::shared::Empty>),
    ),
)]
#[instrument(skip(state, payload), fields(entity_id = %payload.entity_id))]
pub async fn enable_plugin(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<EnablePluginRequest>,
) -> Result<Json<ApiResponse<PluginResponse>>, AppError> {
    let entity_id = payload.entity_id.trim();
    if entity_id.is_empty() {
        return Err(AppError::Validation("entityId must not be blank".into()));
    }

    let plugin = state.registry.enable_plugin(id, entity_id).await?;
    Ok(Json(ApiResponse::okay(PluginResponse::from(plugin))))
}

#[utoipa::path(
    post,
    path = "/plugins/{id}/disable",
    tag = "Plugins",
    operation_id = "disablePlugin",
    summary = "Take a plugin offline",
    description = "Sets an ONLINE plugin to OFFLINE, keeping its entity binding. A plugin that was never configured is returned unchanged.",
    params(("id" = i32, Path, description = "Plugin ID")),
    responses(
        (status = 200, description = "Updated plugin, or status ERROR if it does not exist", body = ApiResponse<PluginResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn disable_plugin(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PluginResponse>>, AppError> {
    let plugin = state.registry.disable_plugin(id).await?;
    Ok(Json(ApiResponse::okay(PluginResponse::from(plugin))))
}
