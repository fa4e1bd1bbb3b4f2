pub mod package;
pub mod plugin;
pub mod shared;
