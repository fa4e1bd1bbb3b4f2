use ::common::PluginStatus;
use plugin_registry::package::RegistryError;

use crate::common::{TestApp, descriptor, package_zip};

const VPC: &str = "Vpc Management";

/// Ingest `cmdb` v1.0, v1.1 and v1.2, each declaring the same plugin.
async fn ingest_cmdb_family(app: &TestApp) -> Vec<i32> {
    let mut ids = Vec::new();
    for version in ["v1.0", "v1.1", "v1.2"] {
        let file_name = format!("cmdb-{version}.zip");
        let package = app
            .registry
            .ingest(
                &package_zip(&descriptor("cmdb", version, &[VPC])),
                Some(file_name.as_str()),
            )
            .await
            .expect("ingest cmdb");
        ids.push(package.id);
    }
    ids
}

async fn plugin_of(app: &TestApp, package_id: i32) -> i32 {
    app.registry
        .plugins(package_id)
        .await
        .expect("plugins")
        .first()
        .expect("package declares a plugin")
        .id
}

mod guard {
    use super::*;

    #[tokio::test]
    async fn online_plugin_in_another_version_blocks_deletion() {
        let app = TestApp::spawn().await;
        let ids = ingest_cmdb_family(&app).await;

        let listed: Vec<i32> = app
            .registry
            .list()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(listed, ids);

        // v1.0 and v1.1 online, v1.2 untouched.
        let p1 = plugin_of(&app, ids[0]).await;
        let p2 = plugin_of(&app, ids[1]).await;
        app.registry.enable_plugin(p1, "vpc-11").await.unwrap();
        app.registry.enable_plugin(p2, "vpc-21").await.unwrap();

        let err = app.registry.delete(ids[0]).await.unwrap_err();
        match &err {
            RegistryError::PackageInUse {
                package_name,
                package_version,
                plugin_name,
            } => {
                assert_eq!(package_name, "cmdb");
                assert_eq!(package_version, "v1.0");
                assert_eq!(plugin_name, VPC);
            }
            other => panic!("expected PackageInUse, got {other:?}"),
        }
        assert!(err.to_string().contains("is still in used"));

        // Taking v1.0 offline is not enough while v1.1 is online.
        app.registry.disable_plugin(p1).await.unwrap();
        let err = app.registry.delete(ids[0]).await.unwrap_err();
        assert!(matches!(err, RegistryError::PackageInUse { .. }));

        app.registry.disable_plugin(p2).await.unwrap();
        app.registry.delete(ids[0]).await.unwrap();
        assert_eq!(app.registry.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn version_with_only_unconfigured_references_is_deletable() {
        let app = TestApp::spawn().await;
        let ids = ingest_cmdb_family(&app).await;

        app.registry.delete(ids[2]).await.unwrap();

        let remaining: Vec<i32> = app
            .registry
            .list()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(remaining, vec![ids[0], ids[1]]);
    }

    #[tokio::test]
    async fn unrelated_online_plugin_does_not_block() {
        let app = TestApp::spawn().await;
        let cmdb = app
            .registry
            .ingest(&package_zip(&descriptor("cmdb", "v1.0", &[VPC])), None)
            .await
            .unwrap();
        let monitor = app
            .registry
            .ingest(
                &package_zip(&descriptor("monitor", "v0.1", &["Alerting"])),
                None,
            )
            .await
            .unwrap();
        let alerting = plugin_of(&app, monitor.id).await;
        app.registry.enable_plugin(alerting, "alert-1").await.unwrap();

        app.registry.delete(cmdb.id).await.unwrap();

        assert!(matches!(
            app.registry.get(cmdb.id).await,
            Err(RegistryError::PackageNotFound(id)) if id == cmdb.id
        ));
    }

    #[tokio::test]
    async fn first_blocking_plugin_in_declaration_order_is_reported() {
        let app = TestApp::spawn().await;
        let package = app
            .registry
            .ingest(
                &package_zip(&descriptor("suite", "v1.0", &["alpha", "beta", "gamma"])),
                None,
            )
            .await
            .unwrap();
        let plugins = app.registry.plugins(package.id).await.unwrap();
        app.registry
            .enable_plugin(plugins[2].id, "g")
            .await
            .unwrap();
        app.registry
            .enable_plugin(plugins[1].id, "b")
            .await
            .unwrap();

        let err = app.registry.delete(package.id).await.unwrap_err();

        assert!(
            matches!(
                err,
                RegistryError::PackageInUse { ref plugin_name, .. } if plugin_name == "beta"
            ),
            "{err}"
        );
    }
}

mod persistence {
    use super::*;

    #[tokio::test]
    async fn deletion_cascades_to_every_sub_resource() {
        let app = TestApp::spawn().await;
        let package = app
            .registry
            .ingest(&crate::common::service_management_zip(), None)
            .await
            .unwrap();
        let id = package.id;
        assert_eq!(app.registry.menus(id).await.unwrap().len(), 2);

        app.registry.delete(id).await.unwrap();

        for result in [
            app.registry.menus(id).await.map(|v| v.len()),
            app.registry.system_parameters(id).await.map(|v| v.len()),
            app.registry.authorities(id).await.map(|v| v.len()),
            app.registry.plugins(id).await.map(|v| v.len()),
        ] {
            assert!(matches!(result, Err(RegistryError::PackageNotFound(_))));
        }

        // Re-ingesting the same version works once the old one is gone.
        app.registry
            .ingest(&crate::common::service_management_zip(), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn enabled_plugin_records_entity_and_status() {
        let app = TestApp::spawn().await;
        let ids = ingest_cmdb_family(&app).await;
        let plugin_id = plugin_of(&app, ids[1]).await;

        let enabled = app.registry.enable_plugin(plugin_id, "vpc-21").await.unwrap();
        assert_eq!(enabled.status, PluginStatus::Online);
        assert_eq!(enabled.entity_id.as_deref(), Some("vpc-21"));

        let disabled = app.registry.disable_plugin(plugin_id).await.unwrap();
        assert_eq!(disabled.status, PluginStatus::Offline);
        assert_eq!(disabled.entity_id.as_deref(), Some("vpc-21"));
    }

    #[tokio::test]
    async fn rejected_descriptor_leaves_registry_unchanged() {
        let app = TestApp::spawn().await;
        let toml = r#"
[package]
name = "broken"
version = "v1.0"

[[menus]]
code = "A"
category = "JOBS"
display_name = "A"
path = "/a"

[[authorities]]
role_name = "admin"
menu_code = "MISSING"
"#;

        let err = app
            .registry
            .ingest(&package_zip(toml), None)
            .await
            .unwrap_err();

        assert!(
            matches!(
                err,
                RegistryError::DescriptorParse { ref path, .. } if path == "authorities[0].menu_code"
            ),
            "{err}"
        );
        assert!(app.registry.list().await.unwrap().is_empty());
        assert!(app.store.is_empty());
    }
}
