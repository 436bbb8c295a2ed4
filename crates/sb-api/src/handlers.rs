//! # sb-api Handlers
//!
//! Same-origin forwarder: `/api/proxy?endpoint=<path>` is relayed to the
//! upstream backend with the same method and JSON body.

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use sb_core::{default_headers, Method, OutboundRequest, RawResponse, Transport};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

const CONNECT_FAILURE: &str = "Failed to connect to API server";

/// State shared across all Actix-web workers.
pub struct AppState {
    pub upstream: Arc<dyn Transport>,
    /// Empty allows every endpoint.
    pub allowed_prefixes: Vec<String>,
}

impl AppState {
    pub fn new(upstream: Arc<dyn Transport>, allowed_prefixes: Vec<String>) -> Self {
        Self {
            upstream,
            allowed_prefixes,
        }
    }

    fn allows(&self, endpoint: &str) -> bool {
        if self.allowed_prefixes.is_empty() {
            return true;
        }
        let path = endpoint.split('?').next().unwrap_or(endpoint);
        self.allowed_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub endpoint: Option<String>,
}

pub async fn proxy_get(data: web::Data<AppState>, query: web::Query<ProxyQuery>) -> impl Responder {
    let endpoint = match checked_endpoint(&data, query.into_inner().endpoint) {
        Ok(endpoint) => endpoint,
        Err(rejection) => return rejection,
    };
    forward(&data, Method::Get, endpoint, None).await
}

pub async fn proxy_post(
    data: web::Data<AppState>,
    query: web::Query<ProxyQuery>,
    body: web::Bytes,
) -> impl Responder {
    let endpoint = match checked_endpoint(&data, query.into_inner().endpoint) {
        Ok(endpoint) => endpoint,
        Err(rejection) => return rejection,
    };
    let body: Value = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => {
            warn!(%endpoint, error = %e, "rejected non-JSON proxy body");
            return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body");
        }
    };
    forward(&data, Method::Post, endpoint, Some(body)).await
}

pub async fn healthz() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

fn checked_endpoint(data: &AppState, endpoint: Option<String>) -> Result<String, HttpResponse> {
    let endpoint = match endpoint.filter(|e| !e.is_empty()) {
        Some(endpoint) => endpoint,
        None => return Err(error_response(StatusCode::BAD_REQUEST, "Missing endpoint parameter")),
    };
    // "//host" or a bare "host" would rebase `${base}${endpoint}` elsewhere.
    let well_formed = endpoint.starts_with('/')
        && !endpoint.starts_with("//")
        && !endpoint.chars().any(|c| c.is_control() || c == '\\');
    if !well_formed {
        warn!(%endpoint, "rejected malformed endpoint");
        return Err(error_response(StatusCode::BAD_REQUEST, "Invalid endpoint parameter"));
    }
    if !data.allows(&endpoint) {
        warn!(%endpoint, "endpoint outside allow-list");
        return Err(error_response(StatusCode::FORBIDDEN, "Endpoint not allowed"));
    }
    Ok(endpoint)
}

async fn forward(data: &AppState, method: Method, endpoint: String, body: Option<Value>) -> HttpResponse {
    let request_id = Uuid::new_v4();
    let started = Instant::now();
    let request = OutboundRequest {
        method,
        path: endpoint.clone(),
        headers: default_headers(),
        body,
    };

    let result = data.upstream.send(request).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(response) if response.is_success() => relay_success(request_id, method, &endpoint, elapsed_ms, response),
        Ok(response) => {
            error!(%request_id, %method, %endpoint, status = response.status, elapsed_ms, body = %response.body, "upstream error");
            let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
            HttpResponse::build(status).json(json!({ "error": response.body }))
        }
        Err(err) => {
            error!(%request_id, %method, %endpoint, elapsed_ms, error = %err, "proxy request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, CONNECT_FAILURE)
        }
    }
}

fn relay_success(
    request_id: Uuid,
    method: Method,
    endpoint: &str,
    elapsed_ms: u64,
    response: RawResponse,
) -> HttpResponse {
    match serde_json::from_str::<Value>(&response.body) {
        Ok(value) => {
            info!(%request_id, %method, endpoint, status = response.status, elapsed_ms, "proxied");
            let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
            HttpResponse::build(status).json(value)
        }
        Err(e) => {
            error!(%request_id, %method, endpoint, status = response.status, error = %e, "upstream sent non-JSON body");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, CONNECT_FAILURE)
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "error": message }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configure_routes;
    use actix_web::{test, App};
    use sb_core::{ForumError, MockTransport};

    fn state(transport: MockTransport, allowed: &[&str]) -> web::Data<AppState> {
        web::Data::new(AppState::new(
            Arc::new(transport),
            allowed.iter().map(|p| p.to_string()).collect(),
        ))
    }

    async fn call(
        data: web::Data<AppState>,
        req: test::TestRequest,
    ) -> (StatusCode, Value) {
        let app = test::init_service(App::new().app_data(data).configure(configure_routes)).await;
        let resp = test::call_service(&app, req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn get_issues_one_upstream_get_and_relays_status() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.method == Method::Get && req.path == "/post-list" && req.body.is_none())
            .times(1)
            .returning(|_| Ok(RawResponse::json(201, &json!({"status": "success", "posts": []}))));

        let (status, body) = call(
            state(transport, &[]),
            test::TestRequest::get().uri("/api/proxy?endpoint=/post-list"),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "success");
    }

    #[actix_web::test]
    async fn encoded_query_reaches_upstream_intact() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.path == "/get-post?post_id=5&requester_school_id=12")
            .times(1)
            .returning(|_| Ok(RawResponse::json(200, &json!({"status": "success"}))));

        let (status, _) = call(
            state(transport, &[]),
            test::TestRequest::get()
                .uri("/api/proxy?endpoint=%2Fget-post%3Fpost_id%3D5%26requester_school_id%3D12"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[actix_web::test]
    async fn post_forwards_json_body() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.method == Method::Post
                    && req.path == "/validate-post"
                    && req.body == Some(json!({"post_id": 5, "requester_school_id": "7001"}))
            })
            .times(1)
            .returning(|_| Ok(RawResponse::json(200, &json!({"status": "success", "message": "ok"}))));

        let (status, body) = call(
            state(transport, &[]),
            test::TestRequest::post()
                .uri("/api/proxy?endpoint=/validate-post")
                .set_json(json!({"post_id": 5, "requester_school_id": "7001"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "ok");
    }

    #[actix_web::test]
    async fn upstream_error_keeps_status_and_wraps_text() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(RawResponse::new(404, "{\"detail\":\"Not Found\"}")));

        let (status, body) = call(
            state(transport, &[]),
            test::TestRequest::get().uri("/api/proxy?endpoint=/nope"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "{\"detail\":\"Not Found\"}"}));
    }

    #[actix_web::test]
    async fn unreachable_upstream_is_500() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Err(ForumError::Network {
                base_url: "http://localhost:8000".into(),
                reason: "connection refused".into(),
            })
        });

        let (status, body) = call(
            state(transport, &[]),
            test::TestRequest::get().uri("/api/proxy?endpoint=/post-list"),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to connect to API server"}));
    }

    #[actix_web::test]
    async fn non_json_success_is_500() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(RawResponse::new(200, "<html>")));

        let (status, _) = call(
            state(transport, &[]),
            test::TestRequest::get().uri("/api/proxy?endpoint=/post-list"),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn bad_requests_never_reach_upstream() {
        let cases = [
            ("/api/proxy", "Missing endpoint parameter", StatusCode::BAD_REQUEST),
            ("/api/proxy?endpoint=", "Missing endpoint parameter", StatusCode::BAD_REQUEST),
            ("/api/proxy?endpoint=post-list", "Invalid endpoint parameter", StatusCode::BAD_REQUEST),
            ("/api/proxy?endpoint=//evil.test/x", "Invalid endpoint parameter", StatusCode::BAD_REQUEST),
            ("/api/proxy?endpoint=@evil.test", "Invalid endpoint parameter", StatusCode::BAD_REQUEST),
        ];
        for (uri, message, expected) in cases {
            let mut transport = MockTransport::new();
            transport.expect_send().times(0);
            let (status, body) = call(state(transport, &[]), test::TestRequest::get().uri(uri)).await;
            assert_eq!(status, expected, "{uri}");
            assert_eq!(body["error"], message, "{uri}");
        }
    }

    #[actix_web::test]
    async fn allow_list_blocks_other_paths() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        let (status, body) = call(
            state(transport, &["/post-", "/get-"]),
            test::TestRequest::get().uri("/api/proxy?endpoint=/admin/drop"),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Endpoint not allowed");
    }

    #[actix_web::test]
    async fn invalid_json_body_is_400() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        let (status, body) = call(
            state(transport, &[]),
            test::TestRequest::post()
                .uri("/api/proxy?endpoint=/post-upload")
                .insert_header(("Content-Type", "application/json"))
                .set_payload("{not json"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON body");
    }

    #[actix_web::test]
    async fn healthz_is_ok() {
        let (status, body) = call(
            state(MockTransport::new(), &[]),
            test::TestRequest::get().uri("/healthz"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }
}
