//! Administrator authentication: argon2 password hashes and HS256 tokens.

use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{AdminsRepo, RepoError};
use crate::domain::entities::AdminRecord;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("admin account not found")]
    AdminNotFound,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Token payload. `exp` and `iat` are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn AdminsRepo>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AdminsRepo>, secret: &[u8], expiry: Duration) -> Self {
        Self {
            repo,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            expiry,
        }
    }

    /// Unknown users and wrong passwords are indistinguishable to callers.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let admin = self
            .repo
            .find_admin_by_username(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = admin.password_hash.clone();
        let candidate = password.to_string();
        let matches = tokio::task::spawn_blocking(move || verify_password(&hash, &candidate))
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        info!(target: "folio::auth", admin_id = admin.id, "admin logged in");
        self.issue_token(&admin)
    }

    pub fn issue_token(&self, admin: &AdminRecord) -> Result<IssuedToken, AuthError> {
        let issued_at = OffsetDateTime::now_utc();
        let expires_at = issued_at + self.expiry;
        let claims = Claims {
            user_id: admin.id,
            username: admin.username.clone(),
            exp: expires_at.unix_timestamp(),
            iat: issued_at.unix_timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| AuthError::Signing(err.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Accepts only unexpired HS256 tokens signed with the configured secret.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| AuthError::InvalidToken(err.to_string()))
    }

    pub async fn current_admin(&self, id: i64) -> Result<AdminRecord, AuthError> {
        self.repo
            .find_admin(id)
            .await?
            .ok_or(AuthError::AdminNotFound)
    }

    /// Create the admin account when it does not exist yet. Returns whether
    /// an account was created.
    pub async fn ensure_admin_exists(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, AuthError> {
        if self.repo.find_admin_by_username(username).await?.is_some() {
            return Ok(false);
        }

        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))??;

        let admin = self.repo.create_admin(username, &hash).await?;
        info!(target: "folio::auth", admin_id = admin.id, username = %admin.username, "seeded admin account");
        Ok(true)
    }
}

/// Hash a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|err| AuthError::Hashing(err.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Hashing(err.to_string()))
}

/// Verify a candidate password against a PHC hash string.
pub fn verify_password(hash: &str, candidate: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}
