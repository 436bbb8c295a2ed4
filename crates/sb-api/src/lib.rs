//! # sb-api
//!
//! The same-origin proxy server for schoolboard.

pub mod handlers;
pub mod middleware;

use actix_web::web;

pub use handlers::AppState;

/// Mounts the proxy and health routes.
///
/// # Developer Note
/// Scoped so the binary can mount the proxy under another prefix if the
/// front end ever moves off `/api`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .route("/api/proxy", web::get().to(handlers::proxy_get))
            .route("/api/proxy", web::post().to(handlers::proxy_post))
            .route("/healthz", web::get().to(handlers::healthz)),
    );
}
