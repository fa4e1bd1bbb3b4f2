use serde_json::json;

use crate::common::{
    BUCKET, IMAGE, STORE_HOST, TestApp, UI, build_zip, descriptor, package_zip, routes,
    service_management_zip,
};

mod upload {
    use super::*;

    #[tokio::test]
    async fn sample_package_is_registered_with_artifact_urls() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("service-management-v0.1.zip", service_management_zip())
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "OK");
        assert_eq!(res.body["message"], "Success");
        let data = &res.body["data"];
        assert!(data["id"].as_i64().is_some());
        assert_eq!(data["name"], "service-management");
        assert_eq!(data["version"], "v0.1");
        assert_eq!(
            data["pluginPackageImageUrl"],
            format!("https://{STORE_HOST}/s3/{BUCKET}/service-management/v0.1/image.tar")
        );
        assert_eq!(
            data["uiPackageUrl"],
            format!("https://{STORE_HOST}/s3/{BUCKET}/service-management/v0.1/ui.zip")
        );
        assert!(data["uploadedAt"].is_string());

        assert_eq!(
            app.store
                .get(BUCKET, "service-management/v0.1/image.tar")
                .as_deref(),
            Some(IMAGE)
        );
        assert_eq!(
            app.store.get(BUCKET, "service-management/v0.1/ui.zip").as_deref(),
            Some(UI)
        );
    }

    #[tokio::test]
    async fn archive_wrapped_in_a_directory_is_accepted() {
        let app = TestApp::spawn().await;
        let toml = descriptor("wrapped", "v1.0", &["alpha"]);
        let data = build_zip(&[
            ("wrapped-v1.0/package.toml", toml.as_bytes()),
            ("wrapped-v1.0/image.tar", IMAGE),
            ("wrapped-v1.0/ui.zip", UI),
        ]);

        let res = app.upload("wrapped-v1.0.zip", data).await;

        assert_eq!(res.body["status"], "OK", "{}", res.text);
        assert_eq!(res.body["data"]["name"], "wrapped");
    }

    #[tokio::test]
    async fn coordinates_fall_back_to_the_archive_name() {
        let app = TestApp::spawn().await;
        let toml = "[[plugins]]\nname = \"Vpc Management\"\n";

        let res = app.upload("cmdb-v1.2.zip", package_zip(toml)).await;

        assert_eq!(res.body["status"], "OK", "{}", res.text);
        assert_eq!(res.body["data"]["name"], "cmdb");
        assert_eq!(res.body["data"]["version"], "v1.2");
    }

    #[tokio::test]
    async fn missing_zip_file_part_is_a_client_error() {
        let app = TestApp::spawn().await;
        let form = reqwest::multipart::Form::new().text("other", "value");

        let res = app.upload_form(form).await;

        assert_eq!(res.status, 400);
        res.assert_error("Required request part 'zip-file' is not present");
    }

    #[tokio::test]
    async fn empty_zip_file_part_is_a_client_error() {
        let app = TestApp::spawn().await;

        let res = app.upload("empty.zip", Vec::new()).await;

        assert_eq!(res.status, 400);
        res.assert_error("Required request part 'zip-file' is not present");
    }

    #[tokio::test]
    async fn non_multipart_request_is_a_client_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_raw(routes::PACKAGES, "application/json", "{}")
            .await;

        assert_eq!(res.status, 400);
        res.assert_error("Required request part 'zip-file' is not present");
    }

    #[tokio::test]
    async fn multipart_without_boundary_is_a_client_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_raw(routes::PACKAGES, "multipart/form-data", "")
            .await;

        assert_eq!(res.status, 400);
        res.assert_error("Required request part 'zip-file' is not present");
    }

    #[tokio::test]
    async fn multipart_with_empty_body_is_a_client_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_raw(routes::PACKAGES, "multipart/form-data; boundary=X", "")
            .await;

        assert_eq!(res.status, 400);
        res.assert_error("Required request part 'zip-file' is not present");
    }

    #[tokio::test]
    async fn non_zip_payload_is_rejected_without_side_effects() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("broken.zip", b"this is not an archive".to_vec())
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "ERROR");
        assert!(
            res.body["message"]
                .as_str()
                .unwrap()
                .starts_with("Invalid package archive"),
            "{}",
            res.text
        );
        assert!(app.store.is_empty());
        assert_eq!(app.get(routes::PACKAGES).await.body["data"], json!([]));
    }

    #[tokio::test]
    async fn archive_without_image_is_rejected() {
        let app = TestApp::spawn().await;
        let toml = descriptor("no-image", "v1.0", &[]);
        let data = build_zip(&[("package.toml", toml.as_bytes()), ("ui.zip", UI)]);

        let res = app.upload("no-image-v1.0.zip", data).await;

        assert_eq!(res.body["status"], "ERROR");
        assert!(res.body["message"].as_str().unwrap().contains("image.tar"));
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn invalid_scope_type_names_the_field() {
        let app = TestApp::spawn().await;
        let toml = r#"
[package]
name = "bad-scope"
version = "v1.0"

[[system_parameters]]
name = "p"
default_value = "v"
scope_type = "tenant"
"#;

        let res = app.upload("bad-scope.zip", package_zip(toml)).await;

        assert_eq!(res.body["status"], "ERROR");
        assert!(
            res.body["message"]
                .as_str()
                .unwrap()
                .contains("system_parameters[0].scope_type"),
            "{}",
            res.text
        );
        assert_eq!(app.get(routes::PACKAGES).await.body["data"], json!([]));
    }

    #[tokio::test]
    async fn missing_sql_script_is_rejected() {
        let app = TestApp::spawn().await;
        let toml = r#"
[package]
name = "db-package"
version = "v1.0"

[[runtime_resources.mysql]]
schema = "db_package"
init_file_name = "init.sql"
"#;

        let res = app.upload("db-package.zip", package_zip(toml)).await;

        assert_eq!(res.body["status"], "ERROR");
        assert!(
            res.body["message"]
                .as_str()
                .unwrap()
                .contains("runtime_resources.mysql[0].init_file_name"),
            "{}",
            res.text
        );
    }

    #[tokio::test]
    async fn duplicate_version_is_rejected() {
        let app = TestApp::spawn().await;
        app.ingest(&descriptor("cmdb", "v1.0", &["Vpc Management"]))
            .await;

        let res = app
            .upload(
                "cmdb-v1.0.zip",
                package_zip(&descriptor("cmdb", "v1.0", &["Vpc Management"])),
            )
            .await;

        res.assert_error("Plugin package [cmdb/v1.0] already exists");
        let list = app.get(routes::PACKAGES).await;
        assert_eq!(list.body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_artifact_upload_registers_nothing() {
        let app = TestApp::spawn().await;
        app.store.fail_uploads(true);

        let res = app.upload("sm.zip", service_management_zip()).await;

        assert_eq!(res.status, 500);
        res.assert_error("An unexpected error occurred");

        app.store.fail_uploads(false);
        assert_eq!(app.get(routes::PACKAGES).await.body["data"], json!([]));
        let res = app.upload("sm.zip", service_management_zip()).await;
        assert_eq!(res.body["status"], "OK", "{}", res.text);
    }
}

mod queries {
    use super::*;

    #[tokio::test]
    async fn packages_are_listed_in_id_order() {
        let app = TestApp::spawn().await;
        let first = app.ingest(&descriptor("cmdb", "v1.0", &[])).await;
        let second = app.ingest(&descriptor("cmdb", "v1.1", &[])).await;
        let third = app.ingest(&descriptor("monitor", "v0.3", &[])).await;

        let res = app.get(routes::PACKAGES).await;

        assert_eq!(res.body["status"], "OK");
        let ids: Vec<i64> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![first as i64, second as i64, third as i64]);
        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn single_package_can_be_fetched() {
        let app = TestApp::spawn().await;
        let id = app.ingest(&descriptor("cmdb", "v1.0", &[])).await;

        let res = app.get(&routes::package(id)).await;

        assert_eq!(res.body["status"], "OK");
        assert_eq!(res.body["data"]["id"], id);
        assert_eq!(res.body["data"]["name"], "cmdb");
    }

    #[tokio::test]
    async fn sample_sub_resources_are_returned_in_declaration_order() {
        let app = TestApp::spawn().await;
        let res = app.upload("sm.zip", service_management_zip()).await;
        let id = res.data_id();

        let deps = app.get(&routes::dependencies(id)).await;
        assert_eq!(deps.body["status"], "OK");
        assert_eq!(deps.body["data"]["packageName"], "service-management");
        assert_eq!(
            deps.body["data"]["dependencies"],
            json!([{"packageName": "cmdb", "version": "v1.0"}])
        );

        let menus = app.get(&routes::menus(id)).await;
        let menus = menus.body["data"].as_array().unwrap().clone();
        assert_eq!(menus.len(), 2);
        assert_eq!(menus[0]["code"], "JOBS_SERVICE_CATALOG_MANAGEMENT");
        assert_eq!(menus[0]["category"], "JOBS");
        assert_eq!(menus[0]["displayName"], "Servive Catalog Management");
        assert_eq!(menus[0]["path"], "/service-catalog");
        assert_eq!(menus[1]["code"], "JOBS_TASK_MANAGEMENT");

        let params = app.get(&routes::system_parameters(id)).await;
        let params = params.body["data"].as_array().unwrap().clone();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0]["name"], "xxx");
        assert_eq!(params[0]["defaultValue"], "xxxx");
        assert_eq!(params[0]["scopeType"], "global");
        assert_eq!(params[1]["scopeType"], "plugin-package");

        let authorities = app.get(&routes::authorities(id)).await;
        let authorities = authorities.body["data"].as_array().unwrap().clone();
        assert_eq!(authorities.len(), 2);
        assert_eq!(authorities[0]["roleName"], "admin");
        assert_eq!(authorities[0]["menuCode"], "JOBS_SERVICE_CATALOG_MANAGEMENT");
        assert_eq!(authorities[1]["menuCode"], "JOBS_TASK_MANAGEMENT");

        let resources = app.get(&routes::runtime_resources(id)).await;
        let data = &resources.body["data"];
        assert_eq!(data["docker"][0]["imageName"], "service_management");
        assert_eq!(data["docker"][0]["containerName"], "service_management");
        assert_eq!(data["docker"][0]["portBindings"], "20002:20002");
        assert!(data["docker"][0]["volumeBindings"].is_null());
        assert_eq!(data["mysql"][0]["schema"], "service_management");
        assert_eq!(data["mysql"][0]["initFileName"], "init.sql");
        assert_eq!(data["mysql"][0]["upgradeFileName"], "upgrade.sql");
        assert_eq!(data["s3"][0]["bucketName"], "service_management");

        let plugins = app.get(&routes::plugins(id)).await;
        let plugins = plugins.body["data"].as_array().unwrap().clone();
        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins[0]["name"], "service-catalog");
        assert_eq!(plugins[1]["name"], "task");
        for plugin in &plugins {
            assert_eq!(plugin["status"], "NOT_CONFIGURED");
            assert_eq!(plugin["pluginPackageId"], id);
            assert!(plugin["entityId"].is_null());
        }
    }

    #[tokio::test]
    async fn package_without_sub_resources_returns_empty_lists() {
        let app = TestApp::spawn().await;
        let id = app.ingest(&descriptor("bare", "v1.0", &[])).await;

        let deps = app.get(&routes::dependencies(id)).await;
        assert_eq!(deps.body["data"]["dependencies"], json!([]));
        assert_eq!(app.get(&routes::menus(id)).await.body["data"], json!([]));
        assert_eq!(
            app.get(&routes::runtime_resources(id)).await.body["data"],
            json!({"docker": [], "mysql": [], "s3": []})
        );
    }

    #[tokio::test]
    async fn unknown_package_yields_not_found_envelope_everywhere() {
        let app = TestApp::spawn().await;
        let message = "Cannot find package by id: [999]";

        for path in [
            routes::package(999),
            routes::dependencies(999),
            routes::menus(999),
            routes::system_parameters(999),
            routes::authorities(999),
            routes::runtime_resources(999),
            routes::plugins(999),
        ] {
            let res = app.get(&path).await;
            assert_eq!(res.status, 200, "{path}");
            res.assert_error(message);
        }

        app.delete(&routes::package(999)).await.assert_error(message);
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn deleting_a_package_removes_it_and_its_artifacts() {
        let app = TestApp::spawn().await;
        let id = app.upload("sm.zip", service_management_zip()).await.data_id();

        let res = app.delete(&routes::package(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "OK");
        assert_eq!(res.body["message"], "Success");
        assert!(res.body["data"].is_null());

        app.get(&routes::package(id))
            .await
            .assert_error(&format!("Cannot find package by id: [{id}]"));
        app.get(&routes::menus(id))
            .await
            .assert_error(&format!("Cannot find package by id: [{id}]"));
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn online_plugin_blocks_deletion() {
        let app = TestApp::spawn().await;
        let id = app
            .ingest(&descriptor("cmdb", "v1.0", &["Vpc Management"]))
            .await;
        let plugin_id = app.plugin_ids(id).await[0];
        app.enable_plugin(plugin_id, "vpc-0001").await;

        let res = app.delete(&routes::package(id)).await;

        assert_eq!(res.status, 200);
        res.assert_error(
            "Failed to delete Plugin[cmdb/v1.0] due to [Vpc Management] is still in used. \
             Please decommission it and try again.",
        );
        assert_eq!(app.get(&routes::package(id)).await.body["status"], "OK");
        assert_eq!(app.store.len(), 2);
    }

    #[tokio::test]
    async fn not_configured_plugins_do_not_block_deletion() {
        let app = TestApp::spawn().await;
        app.ingest(&descriptor("cmdb", "v1.0", &["Vpc Management"]))
            .await;
        let newer = app
            .ingest(&descriptor("cmdb", "v1.1", &["Vpc Management"]))
            .await;

        let res = app.delete(&routes::package(newer)).await;

        assert_eq!(res.body["status"], "OK", "{}", res.text);
    }
}
