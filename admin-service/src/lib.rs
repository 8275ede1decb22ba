pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{AdminConfig, Environment, SwaggerMode};
use crate::middleware::metrics_middleware;
use crate::services::{
    AdminStore, CacheService, CacheStore, GamesService, PasswordsService, RightsService,
    TokensService, UsersService,
};
use service_core::error::AppError;
use std::sync::Arc;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::rights::register_rights,
        handlers::rights::get_game_rights,
        handlers::tokens::create_token,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::grant_right,
        handlers::users::revoke_right,
        handlers::passwords::get_password,
        handlers::passwords::create_password,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::rights::ExternalGameDto,
            dtos::rights::ExternalRightDto,
            dtos::rights::RegisterRightsRequest,
            dtos::rights::RegisterRightsResponse,
            dtos::rights::RightDto,
            dtos::tokens::LoginRequest,
            dtos::tokens::TokenResponse,
            dtos::users::CreateUserRequest,
            dtos::users::UpdateUserRequest,
            dtos::users::UserDto,
            dtos::users::GrantRightRequest,
            dtos::passwords::CreatePasswordRequest,
            dtos::passwords::PasswordDto,
        )
    ),
    tags(
        (name = "Rights", description = "Registration of per-game rights"),
        (name = "Tokens", description = "Access token issuance"),
        (name = "Users", description = "User management and right grants"),
        (name = "Passwords", description = "Stored encrypted passwords"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: AdminConfig,
    pub store: Arc<dyn AdminStore>,
    pub cache_store: Arc<dyn CacheStore>,
    pub games: GamesService,
    pub rights: RightsService,
    pub users: UsersService,
    pub passwords: PasswordsService,
    pub tokens: TokensService,
    pub token_rate_limiter: IpRateLimiter,
    /// Fired on shutdown; every request works with a child of it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wire every service on top of the given store and cache backends.
    pub fn new(
        config: AdminConfig,
        store: Arc<dyn AdminStore>,
        cache_store: Arc<dyn CacheStore>,
        shutdown: CancellationToken,
    ) -> Self {
        let cache = CacheService::new(cache_store.clone(), config.cache.lifetime_seconds);
        let games = GamesService::new(store.clone());
        let rights = RightsService::new(store.clone(), games.clone());
        let users = UsersService::new(store.clone(), cache.clone());
        let passwords = PasswordsService::new(store.clone(), cache);
        let tokens = TokensService::new(passwords.clone(), config.jwt.clone());
        let token_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.token_attempts,
            config.rate_limit.token_window_seconds,
        );

        Self {
            config,
            store,
            cache_store,
            games,
            rights,
            users,
            passwords,
            tokens,
            token_rate_limiter,
            shutdown,
        }
    }

    /// Cancellation token for one request.
    pub fn cancellation(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

fn cors_layer(config: &AdminConfig) -> CorsLayer {
    let origins = &config.security.allowed_origins;
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

pub fn build_router(state: AppState) -> Router {
    // Token issuance is the only credential check, so it gets its own limiter
    let token_route = Router::new()
        .route("/tokens", post(handlers::tokens::create_token))
        .layer(from_fn_with_state(
            state.token_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics));

    let swagger_enabled = match state.config.environment {
        Environment::Dev => true,
        Environment::Prod => state.config.swagger.enabled == SwaggerMode::Public,
    };
    if swagger_enabled {
        app = app.merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()));
    }

    app.route("/rights/register", post(handlers::rights::register_rights))
        .route("/rights/:game_name", get(handlers::rights::get_game_rights))
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/:id",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/users/:id/rights", post(handlers::users::grant_right))
        .route(
            "/users/:id/rights/:right_name",
            service_core::axum::routing::delete(handlers::users::revoke_right),
        )
        .route("/passwords", post(handlers::passwords::create_password))
        .route("/passwords/:id", get(handlers::passwords::get_password))
        .merge(token_route)
        .with_state(state.clone())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config))
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    service_core::axum::extract::State(state): service_core::axum::extract::State<AppState>,
) -> Result<service_core::axum::Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        AppError::ServiceUnavailable
    })?;

    state.cache_store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Redis health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(service_core::axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "database": "up",
            "redis": "up"
        }
    })))
}
