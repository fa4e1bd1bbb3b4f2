use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(package_routes(config.upload.max_archive_size))
        .merge(plugin_routes())
}

fn package_routes(max_archive_size: usize) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(
            handlers::package::list_packages,
            handlers::package::upload_package
        ))
        .layer(handlers::package::upload_body_limit(max_archive_size));

    OpenApiRouter::new()
        .routes(routes!(
            handlers::package::get_package,
            handlers::package::delete_package
        ))
        .routes(routes!(handlers::package::get_dependencies))
        .routes(routes!(handlers::package::get_menus))
        .routes(routes!(handlers::package::get_system_parameters))
        .routes(routes!(handlers::package::get_authorities))
        .routes(routes!(handlers::package::get_runtime_resources))
        .routes(routes!(handlers::package::get_plugins))
        .merge(upload)
}

fn plugin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::plugin::enable_plugin))
        .routes(routes!(handlers::plugin::disable_plugin))
}
