use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A versioned package. `(name, version)` is unique; see `database::ensure_indexes`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plugin_package")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    pub version: String,

    /// Object-store URL of the deployable image, set once the upload completes.
    pub image_url: Option<String>,
    /// Object-store URL of the UI bundle.
    pub ui_url: Option<String>,

    pub uploaded_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
