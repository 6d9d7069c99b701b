use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/files", file_routes())
        .nest("/account", account_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

fn file_routes() -> Router<AppState> {
    let upload = Router::new()
        .route("/", post(handlers::files::upload_files))
        .layer(handlers::files::upload_body_limit());

    Router::new()
        .route("/", get(handlers::files::list_files))
        .route(
            "/{id}",
            get(handlers::files::get_file)
                .patch(handlers::files::rename_file)
                .delete(handlers::files::delete_file),
        )
        .route("/{id}/view", get(handlers::files::view_file))
        .route("/{id}/download", get(handlers::files::download_file))
        .route(
            "/{id}/share",
            post(handlers::files::create_share_link)
                .put(handlers::files::set_custom_share_token)
                .delete(handlers::files::revoke_share_link),
        )
        .merge(upload)
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::account::get_account).patch(handlers::account::update_account),
        )
        .route(
            "/api-credential",
            post(handlers::account::regenerate_api_credential),
        )
        .route("/export", get(handlers::account::export_account))
        .route("/sharex", get(handlers::account::sharex_config))
}
