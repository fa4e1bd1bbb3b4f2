//! Referential check run before a package is removed.
//!
//! Plugins are identified across package versions by name. While any plugin
//! with a given name is `ONLINE`, in whichever version, none of the packages
//! declaring that name may be deleted.

use std::collections::HashMap;

use common::PluginStatus;
use sea_orm::*;
use tracing::warn;

use super::error::RegistryError;
use crate::entity::{plugin, plugin_package};

/// Fail with [`RegistryError::PackageInUse`] if any plugin name declared by
/// `package` is online anywhere in the registry.
///
/// The first blocking name in declaration order is reported.
pub async fn ensure_deletable<C: ConnectionTrait>(
    db: &C,
    package: &plugin_package::Model,
) -> Result<(), RegistryError> {
    let names: Vec<String> = plugin::Entity::find()
        .filter(plugin::Column::PluginPackageId.eq(package.id))
        .order_by_asc(plugin::Column::Id)
        .select_only()
        .column(plugin::Column::Name)
        .into_tuple::<String>()
        .all(db)
        .await?;

    if names.is_empty() {
        return Ok(());
    }

    let active: Vec<PluginStatus> = PluginStatus::ALL
        .iter()
        .copied()
        .filter(PluginStatus::is_active)
        .collect();
    let online = plugin::Entity::find()
        .filter(plugin::Column::Name.is_in(names.clone()))
        .filter(plugin::Column::Status.is_in(active))
        .order_by_asc(plugin::Column::Id)
        .all(db)
        .await?;

    // name -> first package holding it online
    let mut holders: HashMap<&str, i32> = HashMap::new();
    for p in &online {
        holders.entry(p.name.as_str()).or_insert(p.plugin_package_id);
    }

    if let Some(name) = names.iter().find(|n| holders.contains_key(n.as_str())) {
        warn!(
            package_id = package.id,
            package = %package.name,
            version = %package.version,
            plugin = %name,
            holder_package_id = holders[name.as_str()],
            "Package deletion blocked by an online plugin"
        );
        return Err(RegistryError::PackageInUse {
            package_name: package.name.clone(),
            package_version: package.version.clone(),
            plugin_name: name.clone(),
        });
    }

    Ok(())
}
