//! schoolboard/crates/sb-api/src/middleware.rs Middleware
//!
//! Request logging and CORS for the proxy.

use actix_cors::Cors;
use actix_web::middleware::Logger;

/// Access log. Records go through the `log` facade, which the binary
/// bridges into tracing.
pub fn standard_middleware() -> Logger {
    Logger::new(r#"%a "%r" %s %b %Dms"#)
}

/// The browser only ever calls the proxy with GET and POST.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec!["Content-Type", "Accept"])
        .max_age(3600)
}
