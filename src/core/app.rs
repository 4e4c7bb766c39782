use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::core::config::Config;
use crate::core::middleware;
use crate::core::openapi::ApiDoc;
use crate::features::auth::JwtValidator;
use crate::features::files::{routes as files_routes, FileService, UploadRouter};

/// Build the application router with all routes and layers
pub fn create_router(
    config: &Config,
    jwt_validator: Arc<JwtValidator>,
    file_service: Arc<FileService>,
    upload_router: Arc<UploadRouter>,
) -> Router {
    let swagger =
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Protected routes (require JWT authentication)
    let protected_routes = Router::new()
        .merge(files_routes(file_service, upload_router))
        .route_layer(axum::middleware::from_fn_with_state(
            jwt_validator,
            middleware::auth_middleware,
        ));

    // Liveness endpoint (no auth required)
    let port = config.app.port;
    let liveness_route = Router::new().route(
        "/",
        get(move || async move { format!("Server is running on port {}", port) }),
    );

    Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(liveness_route)
        .nest_service("/uploads", ServeDir::new(&config.static_files.dir))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
}
