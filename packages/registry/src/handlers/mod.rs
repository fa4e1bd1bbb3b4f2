pub mod package;
pub mod plugin;
