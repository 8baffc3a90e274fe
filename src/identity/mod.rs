//! Identity collaborator: who is calling, and their profile.

pub mod memory;
pub mod token;

pub use memory::MemoryIdentity;
pub use token::IdTokenVerifier;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ProfileUpdate, User};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Unknown user '{0}'")]
    UnknownUser(String),

    #[error("Identity provider misconfigured: {0}")]
    Misconfigured(String),
}

/// Sign-in request. With a verifier configured only `id_token` is trusted and
/// the other fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignIn {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub id_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a bearer token to its user, or `None` for unknown tokens.
    async fn current_user(&self, token: &str) -> Result<Option<User>, IdentityError>;

    /// Opens a session. The profile is created on first sign-in and reused afterwards.
    async fn sign_in(&self, credentials: SignIn, now: DateTime<Utc>) -> Result<Session, IdentityError>;

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError>;

    async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> Result<User, IdentityError>;
}
