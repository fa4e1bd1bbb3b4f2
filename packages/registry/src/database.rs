use std::time::Duration;

use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::entity::{plugin, plugin_package};

pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.to_owned());

    // Set connection pool options
    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(config.sqlx_logging);

    let db = Database::connect(opt).await?;
    sync_schema(&db).await?;

    Ok(db)
}

/// Create or update tables for every registered entity, then the indexes
/// schema-sync cannot express.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.get_schema_registry("plugin_registry::entity::*")
        .sync(db)
        .await?;
    ensure_indexes(db).await
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite indexes, so we create them
/// manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // One row per package version.
    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name("uq_plugin_package_name_version")
        .table(plugin_package::Entity)
        .col(plugin_package::Column::Name)
        .col(plugin_package::Column::Version)
        .to_owned();
    create_index(db, &stmt, "uq_plugin_package_name_version").await?;

    // Plugin names are unique within their package.
    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name("uq_plugin_package_plugin_name")
        .table(plugin::Entity)
        .col(plugin::Column::PluginPackageId)
        .col(plugin::Column::Name)
        .to_owned();
    create_index(db, &stmt, "uq_plugin_package_plugin_name").await?;

    // Deletion guard lookups:
    // SELECT ... FROM plugin WHERE name IN (...) AND status = 'ONLINE'
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_plugin_name_status")
        .table(plugin::Entity)
        .col(plugin::Column::Name)
        .col(plugin::Column::Status)
        .to_owned();
    create_index(db, &stmt, "idx_plugin_name_status").await?;

    Ok(())
}

async fn create_index(
    db: &DatabaseConnection,
    stmt: &IndexCreateStatement,
    name: &str,
) -> Result<(), DbErr> {
    let sql = match db.get_database_backend() {
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        _ => stmt.to_string(PostgresQueryBuilder),
    };

    db.execute_unprepared(&sql).await?;
    info!("Ensured index {} exists", name);
    Ok(())
}
