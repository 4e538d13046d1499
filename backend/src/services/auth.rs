//! Authentication service for user registration, login, and token management

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Role, User, UserRecord};
use crate::store::UserStore;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: JwtConfig,
}

/// Input for registering a staff account
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Which secret a token was signed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub role: Role,
    pub typ: TokenType,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Tokens plus the public view of the user who logged in
#[derive(Debug, Serialize)]
pub struct LoginOutcome {
    #[serde(flatten)]
    pub tokens: AuthTokens,
    pub user: User,
}

/// Check that an identity is present and holds one of the allowed roles
pub fn authorize(allowed: &[Role], identity: Option<&AuthUser>) -> AppResult<()> {
    let identity = identity.ok_or(AppError::AuthenticationRequired)?;
    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(users: Arc<dyn UserStore>, jwt: JwtConfig) -> Self {
        Self { users, jwt }
    }

    /// Create a staff account. Callers must already be authorized as admin.
    pub async fn register(&self, input: RegisterInput) -> AppResult<User> {
        let username = input.username.trim().to_string();
        shared::validate_username(&username).map_err(|m| AppError::Validation {
            field: "username".to_string(),
            message: m.to_string(),
        })?;
        shared::validate_password(&input.password).map_err(|m| AppError::Validation {
            field: "password".to_string(),
            message: m.to_string(),
        })?;

        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AppError::DuplicateEntry("username".to_string()));
        }

        let password_hash = hash(&input.password, self.jwt.bcrypt_cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            username,
            password_hash,
            role: input.role,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(&record).await?;

        tracing::info!("Registered user {} with role {}", record.username, record.role);
        Ok(record.to_user())
    }

    /// Authenticate user with username and password
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginOutcome> {
        let user = match self.users.find_by_username(username.trim()).await? {
            Some(user) => user,
            None => {
                // Spend the same time as a real verification
                let _ = hash(password, self.jwt.bcrypt_cost);
                tracing::warn!("Login rejected: unknown username");
                return Err(AppError::InvalidCredentials);
            }
        };

        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            tracing::warn!("Login rejected for user {}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        let tokens = self.generate_tokens(user.id, user.role)?;
        tracing::info!("User {} logged in", user.username);

        Ok(LoginOutcome {
            tokens,
            user: user.to_user(),
        })
    }

    /// Issue a new token pair from a refresh token, using the user's current role
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let refresh_token = refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(AppError::MissingRefreshToken);
        }

        let claims = decode::<Claims>(
            refresh_token,
            &DecodingKey::from_secret(self.jwt.refresh_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::RefreshTokenExpired,
            _ => AppError::InvalidRefreshToken,
        })?
        .claims;

        if claims.typ != TokenType::Refresh {
            return Err(AppError::InvalidRefreshToken);
        }
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidRefreshToken)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.generate_tokens(user.id, user.role)
    }

    /// Validate access token and return the caller's identity
    pub fn verify_access_token(&self, token: &str) -> AppResult<AuthUser> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt.access_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => AppError::MalformedToken,
            _ => AppError::InvalidToken,
        })?
        .claims;

        if claims.typ != TokenType::Access {
            return Err(AppError::InvalidToken);
        }
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        Ok(AuthUser {
            user_id,
            role: claims.role,
        })
    }

    /// Public view of the caller
    pub async fn profile(&self, user_id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|u| u.to_user())
            .ok_or(AppError::UserNotFound)
    }

    /// Create the configured admin account unless the username already exists.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> AppResult<bool> {
        if self.users.find_by_username(username.trim()).await?.is_some() {
            return Ok(false);
        }
        self.register(RegisterInput {
            username: username.to_string(),
            password: password.to_string(),
            role: Role::Admin,
        })
        .await?;
        Ok(true)
    }

    /// Generate access and refresh tokens
    fn generate_tokens(&self, user_id: Uuid, role: Role) -> AppResult<AuthTokens> {
        let access_token = self.sign(
            user_id,
            role,
            TokenType::Access,
            self.jwt.access_token_expiry,
            &self.jwt.access_secret,
        )?;
        let refresh_token = self.sign(
            user_id,
            role,
            TokenType::Refresh,
            self.jwt.refresh_token_expiry,
            &self.jwt.refresh_secret,
        )?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_token_expiry,
        })
    }

    fn sign(
        &self,
        user_id: Uuid,
        role: Role,
        typ: TokenType,
        expiry_seconds: i64,
        secret: &str,
    ) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            typ,
            exp: (now + Duration::seconds(expiry_seconds)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}
