use common::PluginStatus;
use serde::{Deserialize, Serialize};

use crate::entity::plugin;

/// A plugin declared by a package.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PluginResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Vpc Management")]
    pub name: String,
    pub status: PluginStatus,
    #[schema(example = 1)]
    pub plugin_package_id: i32,
    /// Business entity the plugin is bound to; `null` until configured.
    pub entity_id: Option<String>,
}

impl From<plugin::Model> for PluginResponse {
    fn from(m: plugin::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            status: m.status,
            plugin_package_id: m.plugin_package_id,
            entity_id: m.entity_id,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnablePluginRequest {
    /// Business entity to bind the plugin to.
    #[schema(example = "vpc-0001")]
    pub entity_id: String,
}
