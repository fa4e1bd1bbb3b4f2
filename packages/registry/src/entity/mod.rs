pub mod authority;
pub mod menu;
pub mod package_dependency;
pub mod plugin;
pub mod plugin_package;
pub mod runtime_docker;
pub mod runtime_mysql;
pub mod runtime_s3;
pub mod system_parameter;
