//! Router and middleware stack.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, DefaultBodyLimit, Request},
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{any, get, post},
    Router,
};
use tower::{limit::GlobalConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{info, info_span, Level};

use super::auth::require_basic_auth;
use super::client_ip::{self, real_ip};
use super::handlers::{configure, health, ping, relay_webhook};
use super::preview::{render, unseal};
use super::ratelimit::rate_limit;
use super::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const APP_NAME: &str = "remapjson";

/// Build the application router.
///
/// `/wh/:token`, `/health` and `/ping` are public. `/configure`, `/unseal`
/// and `/render` sit behind Basic Auth when a password is configured.
pub fn router(state: AppState) -> Router {
    let management = Router::new()
        .route("/configure", post(configure))
        .route("/unseal", post(unseal))
        .route("/render", post(render))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .route_layer(middleware::from_fn(log_management_request));

    let max_body_bytes = state.config.max_body_bytes;
    let max_concurrent = state.config.max_concurrent_requests;

    Router::new()
        .route("/health", get(health))
        .route("/ping", get(ping))
        .route("/wh/:token", any(relay_webhook))
        .merge(management)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(middleware::from_fn(real_ip))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request| {
                            let request_id = request
                                .headers()
                                .get(REQUEST_ID_HEADER)
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("-");
                            let remote = request
                                .extensions()
                                .get::<ConnectInfo<SocketAddr>>()
                                .map(|info| info.0);
                            let client_ip = client_ip::resolve(request.headers(), remote)
                                .map(|ip| ip.to_string())
                                .unwrap_or_else(|| "-".to_string());
                            info_span!(
                                "request",
                                method = %request.method(),
                                path = %request.uri().path(),
                                request_id = %request_id,
                                client_ip = %client_ip,
                            )
                        })
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::DEBUG)
                                .latency_unit(LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(GlobalConcurrencyLimitLayer::new(max_concurrent))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("app-name"),
                    HeaderValue::from_static(APP_NAME),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("app-version"),
                    HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("author"),
                    HeaderValue::from_static(env!("CARGO_PKG_AUTHORS")),
                ))
                .layer(CatchPanicLayer::new()),
        )
        .with_state(state)
}

/// Management calls are logged at info level whether or not debug is on.
async fn log_management_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "management_request"
    );
    response
}
