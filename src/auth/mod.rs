// Authentication module
// Registration, login, and bearer-token verification for protected routes

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{login_handler, me_handler, register_handler};
pub use middleware::{require_auth, AuthenticatedUser};
pub use models::{AuthResponse, LoginRequest, MeResponse, RegisterRequest, User, UserResponse};
pub use password::PasswordService;
pub use repository::{InMemoryUserRepository, PgUserRepository, UserRepository};
pub use service::AuthService;
pub use token::{Claims, TokenService};
