// HTTP handlers for authentication endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{AuthResponse, LoginRequest, MeResponse, RegisterRequest},
};
use crate::error::ErrorResponse;
use crate::AppState;

/// Register a new user
/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Missing or invalid fields, or email already registered", body = ErrorResponse,
            example = json!({"success": false, "message": "User already exists"})),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let Json(request) = payload?;
    let response = state.auth_service.register(request).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login a user
/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Unknown email or wrong password", body = ErrorResponse,
            example = json!({"success": false, "message": "Invalid credentials"})),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let Json(request) = payload?;
    let response = state.auth_service.login(request).await?;

    Ok(Json(response))
}

/// Get current user information (protected endpoint)
/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse,
            example = json!({"success": false, "message": "Invalid token"})),
        (status = 404, description = "Token subject no longer exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<MeResponse>, AuthError> {
    let user = state.auth_service.get_current_user(user.user_id).await?;

    Ok(Json(MeResponse {
        success: true,
        user,
    }))
}
