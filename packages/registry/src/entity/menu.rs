use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plugin_package_menu")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub plugin_package_id: i32,
    #[sea_orm(belongs_to, from = "plugin_package_id", to = "id")]
    pub plugin_package: HasOne<super::plugin_package::Entity>,

    pub code: String,
    pub category: String,
    pub display_name: String,
    pub path: String,
}

impl ActiveModelBehavior for ActiveModel {}
