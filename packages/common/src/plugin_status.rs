#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Activation state of a plugin declared by a package.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PluginStatus {
    /// Registered by an upload but never bound to a business entity.
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "NOT_CONFIGURED"))]
    NotConfigured,
    /// Bound to an entity and serving traffic.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ONLINE"))]
    Online,
    /// Was bound to an entity, currently switched off.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "OFFLINE"))]
    Offline,
}

impl PluginStatus {
    /// Returns true if the plugin is actively in use and must not be removed.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Online)
    }

    pub const ALL: &'static [PluginStatus] = &[Self::NotConfigured, Self::Online, Self::Offline];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
        }
    }
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
