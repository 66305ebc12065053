// Authentication service - business logic layer

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    models::{AuthResponse, LoginRequest, RegisterRequest, UserResponse},
    password::PasswordService,
    repository::UserRepository,
    token::TokenService,
};
use crate::validation::normalize_email;

/// Authentication service coordinating all auth operations
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    password_service: PasswordService,
    token_service: Arc<TokenService>,
    password_min_length: usize,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        password_service: PasswordService,
        token_service: Arc<TokenService>,
        password_min_length: usize,
    ) -> Self {
        Self {
            user_repo,
            password_service,
            token_service,
            password_min_length,
        }
    }

    /// Register a new user
    ///
    /// 1. Normalizes the email, then validates the request and the password policy
    /// 2. Hashes the password off the async runtime
    /// 3. Inserts the user; the store rejects a duplicate email
    /// 4. Issues a session token for the new user
    pub async fn register(&self, mut request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        request.email = normalize_email(&request.email);
        request.validate()?;
        PasswordService::validate_password_strength(&request.password, self.password_min_length)?;

        let name = request.name.trim();
        tracing::debug!("Registering new user: {}", request.email);

        let password_hash = self.password_service.hash(request.password).await?;
        let user = self
            .user_repo
            .create_user(name, &request.email, &password_hash)
            .await?;

        let token = self.token_service.generate_token(user.id)?;

        tracing::info!("Registered user with id: {}", user.id);
        Ok(AuthResponse::new(user.into(), token))
    }

    /// Login a user
    ///
    /// An unknown email and a wrong password both produce
    /// `InvalidCredentials`, after the same amount of hashing work.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        tracing::debug!("Login attempt for: {}", email);

        let user = self.user_repo.find_by_email(&email).await?;
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());

        let verified = self
            .password_service
            .verify(request.password, stored_hash)
            .await?;

        let user = match user {
            Some(user) if verified => user,
            _ => return Err(AuthError::InvalidCredentials),
        };

        let token = self.token_service.generate_token(user.id)?;

        tracing::info!("User {} logged in", user.id);
        Ok(AuthResponse::new(user.into(), token))
    }

    /// Get current user information
    pub async fn get_current_user(&self, user_id: Uuid) -> Result<UserResponse, AuthError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::InMemoryUserRepository;
    use crate::config::PasswordHashConfig;
    use secrecy::SecretString;

    struct Harness {
        service: AuthService,
        repo: Arc<InMemoryUserRepository>,
        tokens: Arc<TokenService>,
    }

    fn harness() -> Harness {
        let repo = Arc::new(InMemoryUserRepository::new());
        let tokens = Arc::new(TokenService::new(
            &SecretString::from("service-test-secret".to_string()),
            3600,
        ));
        let passwords = PasswordService::new(PasswordHashConfig {
            memory_kib: 1024,
            iterations: 1,
        })
        .unwrap();

        Harness {
            service: AuthService::new(repo.clone(), passwords, tokens.clone(), 6),
            repo,
            tokens,
        }
    }

    fn register_request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_returns_user_and_token() {
        let h = harness();
        let response = h
            .service
            .register(register_request("Alice", "alice@x.com", "secret1"))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.user.name, "Alice");
        assert_eq!(response.user.email, "alice@x.com");

        let claims = h.tokens.validate_token(&response.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), response.user.id);
    }

    #[tokio::test]
    async fn test_register_never_stores_plaintext() {
        let h = harness();
        h.service
            .register(register_request("Alice", "alice@x.com", "secret1"))
            .await
            .unwrap();

        let stored = h.repo.find_by_email("alice@x.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret1");
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_twice_fails_without_new_record() {
        let h = harness();
        h.service
            .register(register_request("Alice", "alice@x.com", "secret1"))
            .await
            .unwrap();

        let result = h
            .service
            .register(register_request("Alice Again", "ALICE@x.com", "another1"))
            .await;

        assert!(matches!(result, Err(AuthError::EmailAlreadyExists)));
        assert_eq!(h.repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_and_login_accept_the_same_padded_email() {
        let h = harness();
        let registered = h
            .service
            .register(register_request("Alice", " Alice@X.com ", "secret1"))
            .await
            .unwrap();
        assert_eq!(registered.user.email, "alice@x.com");

        let logged_in = h
            .service
            .login(login_request(" Alice@X.com ", "secret1"))
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_register_enforces_password_length() {
        let h = harness();
        let result = h
            .service
            .register(register_request("Alice", "alice@x.com", "12345"))
            .await;

        assert!(matches!(result, Err(AuthError::ValidationError(_))));
        assert!(h.repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_register_requires_all_fields() {
        let h = harness();
        for request in [
            register_request("", "alice@x.com", "secret1"),
            register_request("   ", "alice@x.com", "secret1"),
            register_request("Alice", "", "secret1"),
            register_request("Alice", "alice@x.com", ""),
        ] {
            let result = h.service.register(request).await;
            assert!(matches!(result, Err(AuthError::ValidationError(_))));
        }
        assert!(h.repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_login_with_correct_password() {
        let h = harness();
        let registered = h
            .service
            .register(register_request("Alice", "alice@x.com", "secret1"))
            .await
            .unwrap();

        let response = h
            .service
            .login(login_request("Alice@X.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(response.user, registered.user);
        let claims = h.tokens.validate_token(&response.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), registered.user.id);
        assert_ne!(response.token, registered.token);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let h = harness();
        h.service
            .register(register_request("Alice", "alice@x.com", "secret1"))
            .await
            .unwrap();

        let wrong_password = h
            .service
            .login(login_request("alice@x.com", "wrong"))
            .await
            .unwrap_err();
        let unknown_email = h
            .service
            .login(login_request("nobody@x.com", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.status_code(), unknown_email.status_code());
        assert_eq!(wrong_password.error_message(), unknown_email.error_message());
    }

    #[tokio::test]
    async fn test_get_current_user() {
        let h = harness();
        let registered = h
            .service
            .register(register_request("Alice", "alice@x.com", "secret1"))
            .await
            .unwrap();

        let user = h.service.get_current_user(registered.user.id).await.unwrap();
        assert_eq!(user, registered.user);

        let missing = h.service.get_current_user(Uuid::new_v4()).await;
        assert!(matches!(missing, Err(AuthError::UserNotFound)));
    }
}
