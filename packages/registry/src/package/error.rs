use common::storage::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid package archive: {0}")]
    InvalidArchive(String),

    #[error("Invalid package descriptor at '{path}': {message}")]
    DescriptorParse { path: String, message: String },

    #[error("Failed to upload package artifact: {0}")]
    Upload(#[from] StorageError),

    #[error("Plugin package [{name}/{version}] already exists")]
    DuplicatePackage { name: String, version: String },

    #[error("Cannot find package by id: [{0}]")]
    PackageNotFound(i32),

    #[error("Cannot find plugin by id: [{0}]")]
    PluginNotFound(i32),

    #[error(
        "Failed to delete Plugin[{package_name}/{package_version}] due to [{plugin_name}] is still in used. Please decommission it and try again."
    )]
    PackageInUse {
        package_name: String,
        package_version: String,
        plugin_name: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RegistryError {
    pub(crate) fn descriptor(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DescriptorParse {
            path: path.into(),
            message: message.into(),
        }
    }
}
