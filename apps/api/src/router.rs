use std::any::Any;

use axum::{
    body::Body,
    http::{header, HeaderName, Method, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{self, TraceLayer},
};
use tracing::{warn, Level, Span};

use appointment_cell::router::appointment_routes;
use appointment_cell::services::SharedAppointmentStore;
use shared_config::AppConfig;
use shared_models::error::{json_text_response, AppError};
use shared_utils::extractor::{client_ip_middleware, request_id, ClientIp};

pub fn create_router(store: SharedAppointmentStore, config: &AppConfig) -> Router {
    let routes = Router::new()
        .route(
            "/",
            get(|| async {
                json_text_response(StatusCode::OK, "Car Service Center API is running!")
            }),
        )
        .merge(appointment_routes(store));

    apply_middleware(routes, config)
}

/// Wrap every route with CORS, request ids, client IP resolution, access
/// logging, panic recovery and the request timeout (outermost first).
pub fn apply_middleware(router: Router, config: &AppConfig) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(cors_layer(&config.cors_allowed_methods))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(middleware::from_fn(client_ip_middleware))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(make_request_span)
                    .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                config.request_timeout,
            )),
    )
}

// Credentials are allowed, so the origin is mirrored instead of `*`.
// Only the configured methods are advertised; the default of GET alone
// means browsers refuse preflighted POST/PATCH/DELETE.
fn cors_layer(allowed_methods: &[String]) -> CorsLayer {
    let methods: Vec<Method> = allowed_methods
        .iter()
        .filter_map(|method| match method.parse::<Method>() {
            Ok(method) => Some(method),
            Err(_) => {
                warn!("Ignoring invalid CORS method '{}'", method);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods(methods)
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
        ])
}

fn make_request_span(request: &Request<Body>) -> Span {
    let client_ip = request
        .extensions()
        .get::<ClientIp>()
        .map(|ClientIp(ip)| ip.to_string())
        .unwrap_or_else(|| "-".to_string());

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id(request).unwrap_or("-"),
        client_ip = %client_ip,
    )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(message) = err.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Internal(format!("handler panicked: {}", details)).into_response()
}
