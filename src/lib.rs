// CRM API: user authentication and shared customer records over HTTP

pub mod auth;
pub mod config;
pub mod customers;
pub mod db;
pub mod error;
pub mod validation;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    models::{AuthResponse, LoginRequest, MeResponse, RegisterRequest, UserResponse},
    require_auth, AuthError, AuthService, InMemoryUserRepository, PasswordService,
    PgUserRepository, TokenService, UserRepository,
};
use config::{AppConfig, StorageBackend};
use customers::{
    CreateCustomerRequest, Customer, CustomerListResponse, CustomerRepository, CustomerResponse,
    CustomerService, InMemoryCustomerRepository, MessageResponse, PgCustomerRepository,
    UpdateCustomerRequest,
};
use db::DbPool;
use error::ErrorResponse;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        auth::handlers::me_handler,
        customers::handlers::list_customers_handler,
        customers::handlers::create_customer_handler,
        customers::handlers::update_customer_handler,
        customers::handlers::delete_customer_handler,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, AuthResponse, MeResponse, UserResponse,
            Customer, CreateCustomerRequest, UpdateCustomerRequest,
            CustomerListResponse, CustomerResponse, MessageResponse,
            ErrorResponse, HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and current user"),
        (name = "customers", description = "Customer records shared by all authenticated users")
    ),
    info(
        title = "CRM API",
        version = "1.0.0",
        description = "REST API for user authentication and customer record management"
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub customer_service: CustomerService,
    pub token_service: Arc<TokenService>,
    pub storage: StorageBackend,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hasher setup failed: {0}")]
    PasswordHasher(#[from] AuthError),

    #[error("postgres storage selected but no database pool was provided")]
    MissingPool,

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Wire the services for the configured storage backend
pub fn build_state(config: &AppConfig, pool: Option<DbPool>) -> Result<AppState, StartupError> {
    let (users, customers): (Arc<dyn UserRepository>, Arc<dyn CustomerRepository>) =
        match (config.storage, pool) {
            (StorageBackend::Postgres, Some(pool)) => (
                Arc::new(PgUserRepository::new(pool.clone())),
                Arc::new(PgCustomerRepository::new(pool)),
            ),
            (StorageBackend::Postgres, None) => return Err(StartupError::MissingPool),
            (StorageBackend::Memory, _) => {
                tracing::warn!("Using in-memory storage; data will not survive a restart");
                (
                    Arc::new(InMemoryUserRepository::new()),
                    Arc::new(InMemoryCustomerRepository::new()),
                )
            }
        };

    let token_service = Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl_secs));
    let password_service = PasswordService::new(config.password_hash)?;

    Ok(AppState {
        auth_service: Arc::new(AuthService::new(
            users,
            password_service,
            token_service.clone(),
            config.password_min_length,
        )),
        customer_service: CustomerService::new(customers),
        token_service,
        storage: config.storage,
    })
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    #[schema(example = "postgres")]
    pub storage: String,
}

/// GET /
async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("CRM API is running"))
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "OK".to_string(),
        storage: state.storage.as_str().to_string(),
    })
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Creates and configures the application router
///
/// Public: banner, health, register, login, API docs. Everything under
/// `/api/customers` and `/api/auth/me` passes through `require_auth` first.
pub fn create_router(state: AppState, config: &AppConfig) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        .route(
            "/api/customers",
            get(customers::list_customers_handler).post(customers::create_customer_handler),
        )
        .route(
            "/api/customers/:id",
            put(customers::update_customer_handler).delete(customers::delete_customer_handler),
        )
        .route_layer(from_fn_with_state(state.token_service.clone(), require_auth));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests;
