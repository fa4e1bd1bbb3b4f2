use std::sync::Arc;

use crate::config::AppConfig;
use crate::package::PackageRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PackageRegistry>,
    pub config: AppConfig,
}
