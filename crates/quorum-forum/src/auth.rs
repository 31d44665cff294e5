//! The auth gateway: sign-up, sign-in, and session tokens.
//!
//! Passwords are hashed with argon2 and stored as PHC strings; sessions are
//! stateless JWTs carrying the user id. The identity row doubles as the
//! profile document, so the "create profile lazily on first sign-in" step
//! of the original product collapses into sign-up here.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use quorum_shared::UserId;
use quorum_store::{Database, StoreError, User};

use crate::error::{AuthError, ForumError, Result};

const MIN_PASSWORD_LEN: usize = 8;

/// Sign-up form input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: String,
    /// Display name snapshot, for log context only.
    name: String,
    iat: i64,
    exp: i64,
}

/// Issues identities and session tokens.
pub struct AuthGateway {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl: Duration,
}

impl AuthGateway {
    pub fn new(jwt_secret: &str, token_ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_ttl: Duration::seconds(token_ttl_secs),
        }
    }

    /// Create a new account. The returned user starts with zero reputation
    /// and counters.
    pub fn sign_up(&self, db: &Database, input: NewUser) -> Result<User> {
        let email = input.email.trim().to_lowercase();
        if !email.contains('@') || email.len() < 3 {
            return Err(AuthError::InvalidEmail.into());
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword.into());
        }
        let display_name = input.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(AuthError::MissingDisplayName.into());
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| ForumError::Internal(format!("password hashing failed: {e}")))?
            .to_string();

        let user = User {
            id: UserId::new(),
            display_name,
            first_name: input.first_name,
            last_name: input.last_name,
            email,
            photo_url: input.photo_url,
            reputation: 0,
            questions_asked: 0,
            answers_given: 0,
            join_date: Utc::now(),
        };

        db.insert_user(&user, &hash)?;

        tracing::info!(user = %user.id, name = %user.display_name, "account created");
        Ok(user)
    }

    /// Verify credentials and issue a session token.
    pub fn sign_in(&self, db: &Database, email: &str, password: &str) -> Result<(User, String)> {
        let email = email.trim().to_lowercase();

        let (user, stored_hash) = db.get_user_by_email(&email).map_err(|e| match e {
            // Do not reveal whether the email exists.
            StoreError::NotFound => ForumError::Auth(AuthError::InvalidCredentials),
            other => other.into(),
        })?;

        let parsed = PasswordHash::new(&stored_hash)
            .map_err(|_| ForumError::Auth(AuthError::InvalidCredentials))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| ForumError::Auth(AuthError::InvalidCredentials))?;

        let token = self.issue_token(&user)?;

        tracing::info!(user = %user.id, "signed in");
        Ok((user, token))
    }

    /// Mint a token for an already-authenticated user.
    pub fn issue_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.display_name.clone(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ForumError::Internal(format!("token encoding failed: {e}")))
    }

    /// Validate a bearer token and return the identity it carries.
    pub fn verify_token(&self, token: &str) -> Result<UserId> {
        let data =
            decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        ForumError::Auth(AuthError::TokenExpired)
                    }
                    _ => ForumError::Auth(AuthError::TokenInvalid),
                }
            })?;

        UserId::parse(&data.claims.sub).map_err(|_| ForumError::Auth(AuthError::TokenInvalid))
    }
}
