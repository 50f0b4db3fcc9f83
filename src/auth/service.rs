//! Auth service
//!
//! Signup, login, token verification, and principal resolution. Composes the
//! credential store with password hashing and the token service.

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password;
use crate::auth::TokenService;
use crate::domain::User;
use crate::error::AppError;
use crate::store::UserStore;

/// Validates credentials, issues and verifies bearer tokens, and resolves
/// the acting principal for protected routes
#[derive(Clone)]
pub struct AuthService {
    users: UserStore,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(pool: PgPool, tokens: TokenService) -> Self {
        Self {
            users: UserStore::new(pool),
            tokens,
        }
    }

    /// Register a new user, storing only the salted password hash
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Uuid, AppError> {
        let password_hash = password::hash_password(password)?;

        let user_id = self.users.insert(name, email, &password_hash).await?;

        tracing::info!(user_id = %user_id, "User registered");

        Ok(user_id)
    }

    /// Validate credentials and issue a signed bearer token
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if !password::verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        self.tokens.issue(user.id)
    }

    /// Validate a token's signature and expiry, returning the user id
    pub fn verify(&self, token: &str) -> Result<Uuid, AppError> {
        self.tokens.verify(token)
    }

    /// Resolve a token to the full user record acting as the request's
    /// principal
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let user_id = self.tokens.verify(token)?;

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Update the principal's display name
    pub async fn update_name(&self, user_id: Uuid, name: &str) -> Result<User, AppError> {
        self.users.update_name(user_id, name).await
    }
}
