//! # schoolboard Binary
//!
//! Starts the same-origin proxy. The upstream transport is picked by
//! compile-time features.

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sb_api::{configure_routes, middleware, AppState};
use sb_config::Settings;
use sb_core::Transport;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "http-reqwest")]
use sb_http_reqwest::{ReqwestTransport, TransportConfig};

#[cfg(not(feature = "http-reqwest"))]
compile_error!("schoolboard needs an upstream transport; enable the `http-reqwest` feature");

const LOG_FORMAT_VAR: &str = "SCHOOLBOARD_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Human,
    Json,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Human,
        }
    }
}

/// Installed before settings load so configuration logging is captured.
/// `RUST_LOG` and the format variable come from the process environment.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let format = std::env::var(LOG_FORMAT_VAR).ok();
    match LogFormat::from_env_value(format.as_deref()) {
        LogFormat::Json => builder.json().init(),
        LogFormat::Human => builder.init(),
    }
}

#[cfg(feature = "http-reqwest")]
fn upstream(settings: &Settings) -> anyhow::Result<Arc<dyn Transport>> {
    let transport = ReqwestTransport::new(
        &settings.upstream.base_url,
        TransportConfig {
            timeout: settings.upstream.timeout(),
            connect_timeout: settings.upstream.connect_timeout(),
        },
    )
    .context("failed to build upstream transport")?;
    Ok(Arc::new(transport))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let settings = Settings::load().context("failed to load settings")?;

    // Wrap in AppState (dynamic dispatch keeps the transport swappable)
    let state = web::Data::new(AppState::new(
        upstream(&settings)?,
        settings.proxy.allowed_prefixes.clone(),
    ));

    let bind = (settings.server.host.clone(), settings.server.port);
    info!(
        host = %bind.0,
        port = bind.1,
        upstream = %settings.upstream.base_url,
        allow_list = settings.proxy.allowed_prefixes.len(),
        "schoolboard proxy starting"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::cors_policy())
            .wrap(middleware::standard_middleware())
            .configure(configure_routes)
    })
    .bind(bind.clone())
    .with_context(|| format!("failed to bind {}:{}", bind.0, bind.1))?
    .run()
    .await?;

    Ok(())
}
