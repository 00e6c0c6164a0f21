pub mod config;
pub mod database;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ModVault Registry API",
        version = "1.0.0",
        description = "API for the ModVault mod package registry"
    ),
    tags(
        (name = "Auth", description = "Authentication and user management"),
        (name = "Usermedia", description = "Multipart upload sessions"),
        (name = "Submissions", description = "Asynchronous package submission"),
        (name = "Packages", description = "Package metrics and actions"),
        (name = "Index", description = "Per-community package indexes"),
        (name = "Downloads", description = "Package archive downloads"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api/auth", routes::auth_routes())
        .nest("/api/experimental", routes::experimental_routes())
        .nest("/api/v1", routes::metrics_routes())
        .nest("/api/cyberstorm", routes::cyberstorm_routes())
        .nest("/c", routes::community_routes())
        .nest("/package", routes::download_routes())
        .split_for_parts();

    router
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
}
