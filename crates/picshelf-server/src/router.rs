use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handler::{self, AppState};

/// Build the axum router with all Picshelf endpoints.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(handler::health_handler))
        .route(
            "/image",
            post(handler::upload_images).get(handler::list_images),
        )
        .route("/image/rename", post(handler::rename_image))
        .route(
            "/image/:name",
            get(handler::get_image).delete(handler::delete_image),
        )
        .route("/download/:name", get(handler::download_original))
        .route("/thumbnail/:name", get(handler::download_thumbnail))
        .route(
            "/catalogue",
            post(handler::create_catalogue).get(handler::list_catalogues),
        )
        .route(
            "/catalogue/:name",
            get(handler::get_catalogue).delete(handler::delete_catalogue),
        )
        .route("/catalogue/:name/add-images", post(handler::add_images))
        .route("/catalogue/:name/remove-images", post(handler::remove_images))
        .route("/catalogue/:name/rename", put(handler::rename_catalogue))
        .route("/tags/tag-images", post(handler::tag_images))
        .route("/tags/statistics", get(handler::tag_statistics))
        .route("/tags/logs", get(handler::tag_logs))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
