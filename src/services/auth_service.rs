use async_trait::async_trait;
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};

use crate::models::auth::{LoginRequest, LoginResponse, RequestIdentity};
use crate::models::user::Role;
use crate::repositories::user_repository::UserRepository;

/// bcrypt work factor for stored password hashes
pub const PASSWORD_HASH_COST: u32 = 10;

/// Default lifetime of an issued token
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Hash checked when the email is unknown, so both failure paths pay for a
/// bcrypt verification
static UNKNOWN_USER_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unknown-user-placeholder").ok());

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id
    role: Role,
    name: String,
    exp: i64, // expiration timestamp
}

/// Authentication service errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Trait defining authentication service operations
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Authenticate a user and return a signed token
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError>;

    /// Validate a token and return the identity it carries
    async fn validate_token(&self, token: &str) -> Result<RequestIdentity, AuthError>;
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, PASSWORD_HASH_COST)
}

/// Implementation of AuthService
pub struct AuthServiceImpl {
    user_repository: Arc<dyn UserRepository>,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthServiceImpl {
    pub fn new(user_repository: Arc<dyn UserRepository>, jwt_secret: String) -> Self {
        Self {
            user_repository,
            jwt_secret,
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        }
    }

    /// Override the lifetime of issued tokens
    pub fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }

    /// Verify a password against a hash. bcrypt compares in constant time.
    fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        verify(password, hash)
            .map_err(|e| AuthError::DatabaseError(format!("Password verification failed: {}", e)))
    }

    /// Generate a JWT for an identity
    fn generate_jwt(
        &self,
        identity: &RequestIdentity,
    ) -> Result<(String, chrono::DateTime<Utc>), AuthError> {
        let expiration = Utc::now() + self.token_ttl;

        let claims = Claims {
            sub: identity.user_id.to_string(),
            role: identity.role,
            name: identity.name.clone(),
            exp: expiration.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::DatabaseError(format!("Token generation failed: {}", e)))?;

        Ok((token, expiration))
    }

    /// Decode and validate a JWT
    fn decode_jwt(&self, token: &str) -> Result<RequestIdentity, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        let user_id = token_data
            .claims
            .sub
            .parse::<i32>()
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(RequestIdentity {
            user_id,
            role: token_data.claims.role,
            name: token_data.claims.name,
        })
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        // Unknown email and wrong password produce the same error
        let Some(user) = self
            .user_repository
            .find_by_email(&request.email)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        else {
            if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
                let _ = verify(&request.password, hash);
            }
            return Err(AuthError::InvalidCredentials);
        };

        let is_valid = Self::verify_password(&request.password, &user.password_hash)?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = RequestIdentity {
            user_id: user.id,
            role: user.role,
            name: user.name.clone(),
        };
        let (token, expires_at) = self.generate_jwt(&identity)?;

        tracing::debug!(user_id = user.id, "issued session token");

        Ok(LoginResponse {
            token,
            expires_at,
            user,
        })
    }

    async fn validate_token(&self, token: &str) -> Result<RequestIdentity, AuthError> {
        self.decode_jwt(token)
    }
}
