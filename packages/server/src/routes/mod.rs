use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

/// Upload sessions and asynchronous submissions.
pub fn experimental_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::usermedia::initiate_upload))
        .routes(routes!(handlers::usermedia::finish_upload))
        .routes(routes!(handlers::usermedia::abort_upload))
        .routes(routes!(handlers::submission::submit))
        .routes(routes!(handlers::submission::poll))
}

pub fn metrics_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::package::package_metrics))
        .routes(routes!(handlers::package::version_metrics))
}

/// Package management actions used by the frontend.
pub fn cyberstorm_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::package::rate))
        .routes(routes!(handlers::package::deprecate))
}

/// Per-community index documents, mounted under `/c`.
pub fn community_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::index::community_package_index))
        .routes(routes!(handlers::index::community_chunked_index))
}

/// Archive downloads, mounted under `/package`.
pub fn download_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::download::download_version))
}
