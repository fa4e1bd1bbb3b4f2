//! Plugin package ingestion, queries and removal.

pub mod archive;
pub mod descriptor;
pub mod error;
pub mod guard;
pub mod registry;

pub use descriptor::PackageCoordinates;
pub use error::RegistryError;
pub use registry::{PackageRegistry, RuntimeResources};
