pub mod plugin_status;
pub mod scope_type;
pub mod storage;

pub use plugin_status::PluginStatus;
pub use scope_type::ScopeType;
