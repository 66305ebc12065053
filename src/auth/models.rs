// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User database model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public principal summary (excludes password_hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "Alice")]
    pub name: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Registration request DTO
///
/// Fields default to empty so an absent field fails validation with a
/// readable message instead of a deserialization error. The password
/// length policy is configurable and checked by the service.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[schema(example = "Alice")]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email address"))]
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "secret1")]
    pub password: String,
}

/// Login request DTO
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "secret1")]
    pub password: String,
}

/// Authentication response DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    #[schema(example = true)]
    pub success: bool,
    pub user: UserResponse,
    pub token: String,
}

impl AuthResponse {
    pub fn new(user: UserResponse, token: String) -> Self {
        Self {
            success: true,
            user,
            token,
        }
    }
}

/// Current user response DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    #[schema(example = true)]
    pub success: bool,
    pub user: UserResponse,
}
