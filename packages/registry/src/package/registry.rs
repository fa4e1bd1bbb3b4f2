use std::sync::Arc;

use chrono::Utc;
use common::PluginStatus;
use common::storage::ArtifactStore;
use sea_orm::*;
use tracing::{info, instrument, warn};

use super::archive::{self, IMAGE_ENTRY, UI_ENTRY};
use super::descriptor::{self, PackageCoordinates, PackageDescriptor};
use super::error::RegistryError;
use super::guard;
use crate::entity::{
    authority, menu, package_dependency, plugin, plugin_package, runtime_docker, runtime_mysql,
    runtime_s3, system_parameter,
};

/// Runtime resources owned by a package, grouped by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeResources {
    pub docker: Vec<runtime_docker::Model>,
    pub mysql: Vec<runtime_mysql::Model>,
    pub s3: Vec<runtime_s3::Model>,
}

/// Ingestion pipeline and query/delete surface over the package registry.
///
/// Every write runs in a single database transaction; artifacts are pushed to
/// the object store before that transaction opens.
pub struct PackageRegistry {
    db: DatabaseConnection,
    store: Arc<dyn ArtifactStore>,
    bucket: String,
}

/// Object key of an artifact belonging to a package version.
fn artifact_key(name: &str, version: &str, entry: &str) -> String {
    format!("{name}/{version}/{entry}")
}

impl PackageRegistry {
    pub fn new(
        db: DatabaseConnection,
        store: Arc<dyn ArtifactStore>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            db,
            store,
            bucket: bucket.into(),
        }
    }

    /// Extract, parse, upload and persist an uploaded package archive.
    ///
    /// `file_name` is the uploaded archive's name; it supplies the package
    /// name/version when the descriptor leaves them out.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn ingest(
        &self,
        data: &[u8],
        file_name: Option<&str>,
    ) -> Result<plugin_package::Model, RegistryError> {
        let archive = archive::extract(data)?;
        let fallback = file_name.and_then(PackageCoordinates::from_archive_name);
        let descriptor = descriptor::parse(&archive.descriptor, fallback.as_ref())?;
        descriptor.check_sql_scripts(|name| archive.has_sql_script(name))?;

        // Fail fast before uploading anything; re-checked inside the transaction.
        ensure_unique(&self.db, &descriptor.name, &descriptor.version).await?;

        let image_url = self
            .store
            .upload(
                &self.bucket,
                &artifact_key(&descriptor.name, &descriptor.version, IMAGE_ENTRY),
                &archive.image,
            )
            .await?;
        let ui_url = self
            .store
            .upload(
                &self.bucket,
                &artifact_key(&descriptor.name, &descriptor.version, UI_ENTRY),
                &archive.ui,
            )
            .await?;

        let txn = self.db.begin().await?;
        ensure_unique(&txn, &descriptor.name, &descriptor.version).await?;
        let package = persist(&txn, &descriptor, image_url, ui_url).await?;
        txn.commit().await.map_err(|e| duplicate_or(e, &descriptor))?;

        info!(
            package_id = package.id,
            name = %package.name,
            version = %package.version,
            plugins = descriptor.plugins.len(),
            "Ingested plugin package"
        );
        Ok(package)
    }

    /// All packages in insertion order.
    pub async fn list(&self) -> Result<Vec<plugin_package::Model>, RegistryError> {
        Ok(plugin_package::Entity::find()
            .order_by_asc(plugin_package::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<plugin_package::Model, RegistryError> {
        find_package(&self.db, id).await
    }

    /// The package together with its declared dependencies.
    pub async fn dependencies(
        &self,
        id: i32,
    ) -> Result<(plugin_package::Model, Vec<package_dependency::Model>), RegistryError> {
        let package = find_package(&self.db, id).await?;
        let dependencies = package_dependency::Entity::find()
            .filter(package_dependency::Column::PluginPackageId.eq(id))
            .order_by_asc(package_dependency::Column::Id)
            .all(&self.db)
            .await?;
        Ok((package, dependencies))
    }

    pub async fn menus(&self, id: i32) -> Result<Vec<menu::Model>, RegistryError> {
        self.owned::<menu::Entity>(id, menu::Column::PluginPackageId, menu::Column::Id)
            .await
    }

    pub async fn system_parameters(
        &self,
        id: i32,
    ) -> Result<Vec<system_parameter::Model>, RegistryError> {
        self.owned::<system_parameter::Entity>(
            id,
            system_parameter::Column::PluginPackageId,
            system_parameter::Column::Id,
        )
        .await
    }

    pub async fn authorities(&self, id: i32) -> Result<Vec<authority::Model>, RegistryError> {
        self.owned::<authority::Entity>(
            id,
            authority::Column::PluginPackageId,
            authority::Column::Id,
        )
        .await
    }

    pub async fn runtime_resources(&self, id: i32) -> Result<RuntimeResources, RegistryError> {
        find_package(&self.db, id).await?;
        let docker = runtime_docker::Entity::find()
            .filter(runtime_docker::Column::PluginPackageId.eq(id))
            .order_by_asc(runtime_docker::Column::Id)
            .all(&self.db)
            .await?;
        let mysql = runtime_mysql::Entity::find()
            .filter(runtime_mysql::Column::PluginPackageId.eq(id))
            .order_by_asc(runtime_mysql::Column::Id)
            .all(&self.db)
            .await?;
        let s3 = runtime_s3::Entity::find()
            .filter(runtime_s3::Column::PluginPackageId.eq(id))
            .order_by_asc(runtime_s3::Column::Id)
            .all(&self.db)
            .await?;
        Ok(RuntimeResources { docker, mysql, s3 })
    }

    pub async fn plugins(&self, id: i32) -> Result<Vec<plugin::Model>, RegistryError> {
        self.owned::<plugin::Entity>(id, plugin::Column::PluginPackageId, plugin::Column::Id)
            .await
    }

    /// Remove a package and everything it owns, unless one of its plugin
    /// names is online somewhere in the registry.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), RegistryError> {
        let txn = self.db.begin().await?;
        let package = find_package(&txn, id).await?;
        guard::ensure_deletable(&txn, &package).await?;

        plugin::Entity::delete_many()
            .filter(plugin::Column::PluginPackageId.eq(id))
            .exec(&txn)
            .await?;
        runtime_s3::Entity::delete_many()
            .filter(runtime_s3::Column::PluginPackageId.eq(id))
            .exec(&txn)
            .await?;
        runtime_mysql::Entity::delete_many()
            .filter(runtime_mysql::Column::PluginPackageId.eq(id))
            .exec(&txn)
            .await?;
        runtime_docker::Entity::delete_many()
            .filter(runtime_docker::Column::PluginPackageId.eq(id))
            .exec(&txn)
            .await?;
        authority::Entity::delete_many()
            .filter(authority::Column::PluginPackageId.eq(id))
            .exec(&txn)
            .await?;
        system_parameter::Entity::delete_many()
            .filter(system_parameter::Column::PluginPackageId.eq(id))
            .exec(&txn)
            .await?;
        menu::Entity::delete_many()
            .filter(menu::Column::PluginPackageId.eq(id))
            .exec(&txn)
            .await?;
        package_dependency::Entity::delete_many()
            .filter(package_dependency::Column::PluginPackageId.eq(id))
            .exec(&txn)
            .await?;
        plugin_package::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        info!(name = %package.name, version = %package.version, "Deleted plugin package");

        self.remove_artifacts(&package).await;
        Ok(())
    }

    /// Bind a plugin to a business entity and bring it online.
    #[instrument(skip(self))]
    pub async fn enable_plugin(
        &self,
        plugin_id: i32,
        entity_id: &str,
    ) -> Result<plugin::Model, RegistryError> {
        let txn = self.db.begin().await?;
        let existing = find_plugin(&txn, plugin_id).await?;

        let mut active: plugin::ActiveModel = existing.into();
        active.entity_id = Set(Some(entity_id.to_string()));
        active.status = Set(PluginStatus::Online);
        let model = active.update(&txn).await?;

        txn.commit().await?;
        info!(plugin = %model.name, entity_id, "Plugin online");
        Ok(model)
    }

    /// Take a plugin offline. Its entity binding is kept so it can be re-enabled.
    ///
    /// A plugin that was never configured stays `NOT_CONFIGURED`.
    #[instrument(skip(self))]
    pub async fn disable_plugin(&self, plugin_id: i32) -> Result<plugin::Model, RegistryError> {
        let txn = self.db.begin().await?;
        let existing = find_plugin(&txn, plugin_id).await?;
        if existing.status == PluginStatus::NotConfigured {
            return Ok(existing);
        }

        let mut active: plugin::ActiveModel = existing.into();
        active.status = Set(PluginStatus::Offline);
        let model = active.update(&txn).await?;

        txn.commit().await?;
        info!(plugin = %model.name, "Plugin offline");
        Ok(model)
    }

    /// Children of one kind owned by package `id`, in declaration order.
    async fn owned<E: EntityTrait>(
        &self,
        id: i32,
        owner: E::Column,
        order: E::Column,
    ) -> Result<Vec<E::Model>, RegistryError> {
        find_package(&self.db, id).await?;
        Ok(E::find()
            .filter(owner.eq(id))
            .order_by_asc(order)
            .all(&self.db)
            .await?)
    }

    async fn remove_artifacts(&self, package: &plugin_package::Model) {
        let artifacts = [
            (IMAGE_ENTRY, package.image_url.is_some()),
            (UI_ENTRY, package.ui_url.is_some()),
        ];
        for (entry, uploaded) in artifacts {
            if !uploaded {
                continue;
            }
            let key = artifact_key(&package.name, &package.version, entry);
            if let Err(e) = self.store.delete(&self.bucket, &key).await {
                warn!(bucket = %self.bucket, key = %key, "Failed to remove artifact: {e}");
            }
        }
    }
}

async fn find_package<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<plugin_package::Model, RegistryError> {
    plugin_package::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(RegistryError::PackageNotFound(id))
}

async fn find_plugin<C: ConnectionTrait>(db: &C, id: i32) -> Result<plugin::Model, RegistryError> {
    plugin::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(RegistryError::PluginNotFound(id))
}

async fn ensure_unique<C: ConnectionTrait>(
    db: &C,
    name: &str,
    version: &str,
) -> Result<(), RegistryError> {
    let existing = plugin_package::Entity::find()
        .filter(plugin_package::Column::Name.eq(name))
        .filter(plugin_package::Column::Version.eq(version))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(RegistryError::DuplicatePackage {
            name: name.to_string(),
            version: version.to_string(),
        });
    }
    Ok(())
}

/// A unique-index violation means another ingestion of the same version won the race.
fn duplicate_or(err: DbErr, descriptor: &PackageDescriptor) -> RegistryError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => RegistryError::DuplicatePackage {
            name: descriptor.name.clone(),
            version: descriptor.version.clone(),
        },
        _ => RegistryError::Database(err),
    }
}

/// Insert the package row and every declared sub-resource, in declaration order.
async fn persist(
    txn: &DatabaseTransaction,
    descriptor: &PackageDescriptor,
    image_url: String,
    ui_url: String,
) -> Result<plugin_package::Model, RegistryError> {
    let package = plugin_package::ActiveModel {
        name: Set(descriptor.name.clone()),
        version: Set(descriptor.version.clone()),
        image_url: Set(Some(image_url)),
        ui_url: Set(Some(ui_url)),
        uploaded_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(|e| duplicate_or(e, descriptor))?;
    let package_id = package.id;

    for dep in &descriptor.dependencies {
        package_dependency::ActiveModel {
            plugin_package_id: Set(package_id),
            dependency_package_name: Set(dep.package_name.clone()),
            dependency_package_version: Set(dep.version.clone()),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }

    for m in &descriptor.menus {
        menu::ActiveModel {
            plugin_package_id: Set(package_id),
            code: Set(m.code.clone()),
            category: Set(m.category.clone()),
            display_name: Set(m.display_name.clone()),
            path: Set(m.path.clone()),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }

    for param in &descriptor.system_parameters {
        system_parameter::ActiveModel {
            plugin_package_id: Set(package_id),
            name: Set(param.name.clone()),
            default_value: Set(param.default_value.clone()),
            scope_type: Set(param.scope_type),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }

    for auth in &descriptor.authorities {
        authority::ActiveModel {
            plugin_package_id: Set(package_id),
            role_name: Set(auth.role_name.clone()),
            menu_code: Set(auth.menu_code.clone()),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }

    let resources = &descriptor.runtime_resources;
    for docker in &resources.docker {
        runtime_docker::ActiveModel {
            plugin_package_id: Set(package_id),
            image_name: Set(docker.image_name.clone()),
            container_name: Set(docker.container_name.clone()),
            port_bindings: Set(docker.port_bindings.clone()),
            volume_bindings: Set(docker.volume_bindings.clone()),
            env_variables: Set(docker.env_variables.clone()),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    for mysql in &resources.mysql {
        runtime_mysql::ActiveModel {
            plugin_package_id: Set(package_id),
            schema_name: Set(mysql.schema.clone()),
            init_file_name: Set(mysql.init_file_name.clone()),
            upgrade_file_name: Set(mysql.upgrade_file_name.clone()),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    for s3 in &resources.s3 {
        runtime_s3::ActiveModel {
            plugin_package_id: Set(package_id),
            bucket_name: Set(s3.bucket_name.clone()),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }

    for p in &descriptor.plugins {
        plugin::ActiveModel {
            plugin_package_id: Set(package_id),
            name: Set(p.name.clone()),
            entity_id: Set(None),
            status: Set(PluginStatus::NotConfigured),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }

    Ok(package)
}
