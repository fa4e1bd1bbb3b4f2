//! Parsing of `package.toml` into typed sub-resource records.
//!
//! Parsing is pure: the same bytes always produce the same records, and every
//! list keeps the order it was declared in. Errors name the offending field
//! with a path such as `system_parameters[1].scope_type`.

use std::collections::HashSet;

use common::ScopeType;
use serde::Deserialize;

use super::error::RegistryError;

/// The `(name, version)` identity of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCoordinates {
    pub name: String,
    pub version: String,
}

impl PackageCoordinates {
    /// Derive coordinates from an archive named `<name>-<version>.zip`.
    ///
    /// The version is the shortest `-`-separated suffix that starts with a
    /// digit or with `v` followed by a digit, so `service-management-v0.1.zip`
    /// yields `("service-management", "v0.1")`.
    pub fn from_archive_name(file_name: &str) -> Option<Self> {
        let base = file_name.rsplit('/').next().unwrap_or(file_name);
        let stem = base.strip_suffix(".zip").unwrap_or(base);

        stem.match_indices('-').rev().find_map(|(pos, _)| {
            let (name, version) = (&stem[..pos], &stem[pos + 1..]);
            (is_valid_identifier(name) && looks_like_version(version)).then(|| Self {
                name: name.to_string(),
                version: version.to_string(),
            })
        })
    }
}

fn looks_like_version(s: &str) -> bool {
    let digits = s.strip_prefix('v').unwrap_or(s);
    digits.starts_with(|c: char| c.is_ascii_digit()) && is_valid_identifier(s)
}

/// Names and versions end up in object-store keys, so keep them path-safe.
fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('.')
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DependencySpec {
    pub package_name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MenuSpec {
    pub code: String,
    pub category: String,
    pub display_name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SystemParameterSpec {
    pub name: String,
    /// Kept verbatim; an empty default is allowed.
    pub default_value: String,
    pub scope_type: ScopeType,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthoritySpec {
    pub role_name: String,
    pub menu_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DockerSpec {
    pub image_name: String,
    pub container_name: String,
    pub port_bindings: Option<String>,
    pub volume_bindings: Option<String>,
    pub env_variables: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MysqlSpec {
    pub schema: String,
    pub init_file_name: Option<String>,
    pub upgrade_file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3Spec {
    pub bucket_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeResourcesSpec {
    pub docker: Vec<DockerSpec>,
    pub mysql: Vec<MysqlSpec>,
    pub s3: Vec<S3Spec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginSpec {
    pub name: String,
}

/// Everything a descriptor declares, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,
    pub dependencies: Vec<DependencySpec>,
    pub menus: Vec<MenuSpec>,
    pub system_parameters: Vec<SystemParameterSpec>,
    pub authorities: Vec<AuthoritySpec>,
    pub runtime_resources: RuntimeResourcesSpec,
    pub plugins: Vec<PluginSpec>,
}

impl PackageDescriptor {
    /// Check that every SQL script named by a mysql resource is available.
    pub fn check_sql_scripts(
        &self,
        has_script: impl Fn(&str) -> bool,
    ) -> Result<(), RegistryError> {
        for (i, mysql) in self.runtime_resources.mysql.iter().enumerate() {
            let scripts = [
                ("init_file_name", &mysql.init_file_name),
                ("upgrade_file_name", &mysql.upgrade_file_name),
            ];
            for (field, file) in scripts {
                if let Some(file) = file
                    && !has_script(file)
                {
                    return Err(RegistryError::descriptor(
                        format!("runtime_resources.mysql[{i}].{field}"),
                        format!("script '{file}' is not present in the archive"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// `package.toml` as written, before coordinates are resolved and checked.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDescriptor {
    package: RawCoordinates,
    dependencies: Vec<DependencySpec>,
    menus: Vec<MenuSpec>,
    system_parameters: Vec<SystemParameterSpec>,
    authorities: Vec<AuthoritySpec>,
    runtime_resources: RuntimeResourcesSpec,
    plugins: Vec<PluginSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCoordinates {
    name: Option<String>,
    version: Option<String>,
}

/// Parse descriptor bytes.
///
/// `fallback` supplies the package name/version when the descriptor's
/// `[package]` table omits them, typically derived from the archive name.
pub fn parse(
    data: &[u8],
    fallback: Option<&PackageCoordinates>,
) -> Result<PackageDescriptor, RegistryError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| RegistryError::descriptor("package.toml", "descriptor is not valid UTF-8"))?;
    let de = toml::de::Deserializer::parse(text)
        .map_err(|e| RegistryError::descriptor("package.toml", e.message()))?;
    let raw: RawDescriptor = serde_path_to_error::deserialize(de).map_err(field_error)?;

    let name = resolve_coordinate("name", raw.package.name, fallback.map(|c| &c.name))?;
    let version = resolve_coordinate("version", raw.package.version, fallback.map(|c| &c.version))?;

    let mut descriptor = PackageDescriptor {
        name,
        version,
        dependencies: raw.dependencies,
        menus: raw.menus,
        system_parameters: raw.system_parameters,
        authorities: raw.authorities,
        runtime_resources: raw.runtime_resources,
        plugins: raw.plugins,
    };
    descriptor.normalize()?;
    Ok(descriptor)
}

/// Convert a deserialization failure into a descriptor error at the field it
/// concerns. Missing fields are reported by serde against the enclosing
/// table, so the field name is appended to the path.
fn field_error(err: serde_path_to_error::Error<toml::de::Error>) -> RegistryError {
    let mut path = err.path().to_string();
    if path == "." {
        path.clear();
    }
    let message = err.inner().message().to_string();

    if let Some(field) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        path = join(&path, field);
        return RegistryError::descriptor(path, "required field is missing");
    }
    if path.is_empty() {
        path = "package.toml".to_string();
    }
    RegistryError::descriptor(path, message)
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn resolve_coordinate(
    key: &str,
    declared: Option<String>,
    fallback: Option<&String>,
) -> Result<String, RegistryError> {
    let path = || format!("package.{key}");
    let value = match declared {
        Some(mut value) => {
            non_blank(&mut value, path)?;
            value
        }
        None => fallback.cloned().ok_or_else(|| {
            RegistryError::descriptor(
                path(),
                "required field is missing and the archive name does not follow \
                 '<name>-<version>.zip'",
            )
        })?,
    };
    if !is_valid_identifier(&value) {
        return Err(RegistryError::descriptor(
            path(),
            format!("'{value}' may only contain letters, digits, '-', '_' and '.'"),
        ));
    }
    Ok(value)
}

/// Trim `value` in place, rejecting blank strings.
fn non_blank(value: &mut String, path: impl FnOnce() -> String) -> Result<(), RegistryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::descriptor(path(), "must not be blank"));
    }
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
    Ok(())
}

fn optional_non_blank(
    value: &mut Option<String>,
    path: impl FnOnce() -> String,
) -> Result<(), RegistryError> {
    match value {
        Some(v) => non_blank(v, path),
        None => Ok(()),
    }
}

impl PackageDescriptor {
    /// Trim every string field and enforce the cross-record rules: menu codes
    /// and plugin names are unique, and authorities only reference menus
    /// declared by this package.
    fn normalize(&mut self) -> Result<(), RegistryError> {
        for (i, dep) in self.dependencies.iter_mut().enumerate() {
            non_blank(&mut dep.package_name, || format!("dependencies[{i}].package_name"))?;
            non_blank(&mut dep.version, || format!("dependencies[{i}].version"))?;
        }

        let mut codes = HashSet::new();
        for (i, menu) in self.menus.iter_mut().enumerate() {
            non_blank(&mut menu.code, || format!("menus[{i}].code"))?;
            non_blank(&mut menu.category, || format!("menus[{i}].category"))?;
            non_blank(&mut menu.display_name, || format!("menus[{i}].display_name"))?;
            non_blank(&mut menu.path, || format!("menus[{i}].path"))?;
            if !codes.insert(menu.code.clone()) {
                return Err(RegistryError::descriptor(
                    format!("menus[{i}].code"),
                    format!("duplicate menu code '{}'", menu.code),
                ));
            }
        }

        for (i, param) in self.system_parameters.iter_mut().enumerate() {
            non_blank(&mut param.name, || format!("system_parameters[{i}].name"))?;
        }

        for (i, authority) in self.authorities.iter_mut().enumerate() {
            non_blank(&mut authority.role_name, || format!("authorities[{i}].role_name"))?;
            non_blank(&mut authority.menu_code, || format!("authorities[{i}].menu_code"))?;
            if !codes.contains(&authority.menu_code) {
                return Err(RegistryError::descriptor(
                    format!("authorities[{i}].menu_code"),
                    format!(
                        "no menu with code '{}' is declared by this package",
                        authority.menu_code
                    ),
                ));
            }
        }

        let runtime = &mut self.runtime_resources;
        for (i, docker) in runtime.docker.iter_mut().enumerate() {
            let at = |field: &str| format!("runtime_resources.docker[{i}].{field}");
            non_blank(&mut docker.image_name, || at("image_name"))?;
            non_blank(&mut docker.container_name, || at("container_name"))?;
            optional_non_blank(&mut docker.port_bindings, || at("port_bindings"))?;
            optional_non_blank(&mut docker.volume_bindings, || at("volume_bindings"))?;
            optional_non_blank(&mut docker.env_variables, || at("env_variables"))?;
        }
        for (i, mysql) in runtime.mysql.iter_mut().enumerate() {
            let at = |field: &str| format!("runtime_resources.mysql[{i}].{field}");
            non_blank(&mut mysql.schema, || at("schema"))?;
            optional_non_blank(&mut mysql.init_file_name, || at("init_file_name"))?;
            optional_non_blank(&mut mysql.upgrade_file_name, || at("upgrade_file_name"))?;
        }
        for (i, s3) in runtime.s3.iter_mut().enumerate() {
            non_blank(&mut s3.bucket_name, || {
                format!("runtime_resources.s3[{i}].bucket_name")
            })?;
        }

        let mut names = HashSet::new();
        for (i, plugin) in self.plugins.iter_mut().enumerate() {
            non_blank(&mut plugin.name, || format!("plugins[{i}].name"))?;
            if !names.insert(plugin.name.clone()) {
                return Err(RegistryError::descriptor(
                    format!("plugins[{i}].name"),
                    format!("duplicate plugin name '{}'", plugin.name),
                ));
            }
        }

        Ok(())
    }
}
