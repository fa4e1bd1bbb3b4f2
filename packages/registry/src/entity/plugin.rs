use common::PluginStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A plugin declared by a package.
///
/// `name` is the logical plugin identity shared by every version of a package
/// family, so the same name appears once per ingested package version.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plugin")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub plugin_package_id: i32,
    #[sea_orm(belongs_to, from = "plugin_package_id", to = "id")]
    pub plugin_package: HasOne<super::plugin_package::Entity>,

    pub name: String,

    /// Business entity the plugin is bound to. `None` while `NOT_CONFIGURED`.
    pub entity_id: Option<String>,

    pub status: PluginStatus,
}

impl ActiveModelBehavior for ActiveModel {}
