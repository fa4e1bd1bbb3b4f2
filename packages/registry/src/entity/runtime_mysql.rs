use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plugin_package_runtime_mysql")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub plugin_package_id: i32,
    #[sea_orm(belongs_to, from = "plugin_package_id", to = "id")]
    pub plugin_package: HasOne<super::plugin_package::Entity>,

    pub schema_name: String,
    /// SQL script shipped in the archive, run when the schema is created.
    pub init_file_name: Option<String>,
    /// SQL script shipped in the archive, run when upgrading from an older version.
    pub upgrade_file_name: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
