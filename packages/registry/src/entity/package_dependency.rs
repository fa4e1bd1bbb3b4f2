use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plugin_package_dependency")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub plugin_package_id: i32,
    #[sea_orm(belongs_to, from = "plugin_package_id", to = "id")]
    pub plugin_package: HasOne<super::plugin_package::Entity>,

    /// Name of the required package. Not a foreign key, may be unresolved.
    pub dependency_package_name: String,
    pub dependency_package_version: String,
}

impl ActiveModelBehavior for ActiveModel {}
