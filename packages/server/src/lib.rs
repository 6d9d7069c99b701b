pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Skiff API",
        version = "1.0.0",
        description = "API for the Skiff self-hosted file sharing service"
    ),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::files::list_files,
        handlers::files::upload_files,
        handlers::files::get_file,
        handlers::files::rename_file,
        handlers::files::delete_file,
        handlers::files::view_file,
        handlers::files::download_file,
        handlers::files::create_share_link,
        handlers::files::set_custom_share_token,
        handlers::files::revoke_share_link,
        handlers::account::get_account,
        handlers::account::update_account,
        handlers::account::regenerate_api_credential,
        handlers::account::export_account,
        handlers::account::sharex_config,
        handlers::share::fetch_shared,
        handlers::share::fetch_shared_raw,
        handlers::share::download_shared,
        handlers::health::healthz,
    ),
    tags(
        (name = "Auth", description = "Registration, login and session identity"),
        (name = "Files", description = "Upload, listing and file management"),
        (name = "Sharing", description = "Share links and public downloads"),
        (name = "Account", description = "Profile, preferences and uploader integration"),
        (name = "Health", description = "Liveness"),
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
    let cors = cors_layer(&state.config.server.cors);

    axum::Router::new()
        .nest("/api", routes::api_routes())
        .merge(routes::public_routes())
        .layer(cors)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
}

/// An empty origin list means "allow everyone", the usual single-user
/// self-hosted setup.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age));

    if config.allow_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
