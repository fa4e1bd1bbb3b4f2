use chrono::{DateTime, Utc};
use common::ScopeType;
use serde::Serialize;

use crate::entity::{
    authority, menu, package_dependency, plugin_package, runtime_docker, runtime_mysql, runtime_s3,
    system_parameter,
};
use crate::package::RuntimeResources;

/// A registered plugin package version.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "service-management")]
    pub name: String,
    #[schema(example = "v0.1")]
    pub version: String,
    /// Object-store URL of the deployable image.
    #[schema(example = "https://minio.local/s3/plugin-packages/service-management/v0.1/image.tar")]
    pub plugin_package_image_url: Option<String>,
    /// Object-store URL of the UI bundle.
    #[schema(example = "https://minio.local/s3/plugin-packages/service-management/v0.1/ui.zip")]
    pub ui_package_url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<plugin_package::Model> for PackageResponse {
    fn from(m: plugin_package::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            version: m.version,
            plugin_package_image_url: m.image_url,
            ui_package_url: m.ui_url,
            uploaded_at: m.uploaded_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DependencyResponse {
    #[schema(example = "cmdb")]
    pub package_name: String,
    #[schema(example = "v1.0")]
    pub version: String,
}

impl From<package_dependency::Model> for DependencyResponse {
    fn from(m: package_dependency::Model) -> Self {
        Self {
            package_name: m.dependency_package_name,
            version: m.dependency_package_version,
        }
    }
}

/// Dependencies declared by a package.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DependenciesResponse {
    /// Name of the declaring package.
    #[schema(example = "service-management")]
    pub package_name: String,
    pub dependencies: Vec<DependencyResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuResponse {
    pub id: i32,
    #[schema(example = "JOBS_SERVICE_CATALOG_MANAGEMENT")]
    pub code: String,
    #[schema(example = "JOBS")]
    pub category: String,
    #[schema(example = "Servive Catalog Management")]
    pub display_name: String,
    #[schema(example = "/service-catalog")]
    pub path: String,
}

impl From<menu::Model> for MenuResponse {
    fn from(m: menu::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            category: m.category,
            display_name: m.display_name,
            path: m.path,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemParameterResponse {
    pub id: i32,
    #[schema(example = "xxx")]
    pub name: String,
    #[schema(example = "xxxx")]
    pub default_value: String,
    pub scope_type: ScopeType,
}

impl From<system_parameter::Model> for SystemParameterResponse {
    fn from(m: system_parameter::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            default_value: m.default_value,
            scope_type: m.scope_type,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityResponse {
    pub id: i32,
    #[schema(example = "admin")]
    pub role_name: String,
    #[schema(example = "JOBS_SERVICE_CATALOG_MANAGEMENT")]
    pub menu_code: String,
}

impl From<authority::Model> for AuthorityResponse {
    fn from(m: authority::Model) -> Self {
        Self {
            id: m.id,
            role_name: m.role_name,
            menu_code: m.menu_code,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DockerResourceResponse {
    pub id: i32,
    #[schema(example = "service_management")]
    pub image_name: String,
    #[schema(example = "service_management")]
    pub container_name: String,
    #[schema(example = "20002:20002")]
    pub port_bindings: Option<String>,
    pub volume_bindings: Option<String>,
    pub env_variables: Option<String>,
}

impl From<runtime_docker::Model> for DockerResourceResponse {
    fn from(m: runtime_docker::Model) -> Self {
        Self {
            id: m.id,
            image_name: m.image_name,
            container_name: m.container_name,
            port_bindings: m.port_bindings,
            volume_bindings: m.volume_bindings,
            env_variables: m.env_variables,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MysqlResourceResponse {
    pub id: i32,
    #[schema(example = "service_management")]
    pub schema: String,
    #[schema(example = "init.sql")]
    pub init_file_name: Option<String>,
    #[schema(example = "upgrade.sql")]
    pub upgrade_file_name: Option<String>,
}

impl From<runtime_mysql::Model> for MysqlResourceResponse {
    fn from(m: runtime_mysql::Model) -> Self {
        Self {
            id: m.id,
            schema: m.schema_name,
            init_file_name: m.init_file_name,
            upgrade_file_name: m.upgrade_file_name,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct S3ResourceResponse {
    pub id: i32,
    #[schema(example = "service_management")]
    pub bucket_name: String,
}

impl From<runtime_s3::Model> for S3ResourceResponse {
    fn from(m: runtime_s3::Model) -> Self {
        Self {
            id: m.id,
            bucket_name: m.bucket_name,
        }
    }
}

/// Runtime resources grouped by kind, each in declaration order.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RuntimeResourcesResponse {
    pub docker: Vec<DockerResourceResponse>,
    pub mysql: Vec<MysqlResourceResponse>,
    pub s3: Vec<S3ResourceResponse>,
}

impl From<RuntimeResources> for RuntimeResourcesResponse {
    fn from(r: RuntimeResources) -> Self {
        Self {
            docker: r.docker.into_iter().map(Into::into).collect(),
            mysql: r.mysql.into_iter().map(Into::into).collect(),
            s3: r.s3.into_iter().map(Into::into).collect(),
        }
    }
}
