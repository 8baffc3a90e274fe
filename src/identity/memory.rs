use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::{IdTokenVerifier, IdentityError, IdentityProvider, Session, SignIn};
use crate::config::Config;
use crate::models::{normalize_optional, ProfileUpdate, User};

/// Token-based identity kept in process memory.
///
/// Without a verifier the identity posted to sign-in is taken at its word,
/// which is only suitable for local development.
#[derive(Default)]
pub struct MemoryIdentity {
    users: RwLock<HashMap<String, User>>,
    // token -> uid
    sessions: RwLock<HashMap<String, String>>,
    verifier: Option<IdTokenVerifier>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only identities carried by a valid ID token can sign in.
    pub fn with_verifier(verifier: IdTokenVerifier) -> Self {
        Self {
            verifier: Some(verifier),
            ..Self::default()
        }
    }

    /// Persistent storage is never paired with unverified sign-in.
    pub fn from_config(config: &Config) -> Result<Self, IdentityError> {
        match (&config.id_token_secret, &config.database_url) {
            (Some(secret), _) => Ok(Self::with_verifier(IdTokenVerifier::new(
                secret,
                config.id_token_issuer.as_deref(),
            ))),
            (None, Some(_)) => Err(IdentityError::Misconfigured(
                "AUTH_ID_TOKEN_SECRET must be set when DATABASE_URL is configured".to_string(),
            )),
            (None, None) => {
                tracing::warn!("AUTH_ID_TOKEN_SECRET not set, trusting identities asserted at sign-in");
                Ok(Self::new())
            }
        }
    }

    fn resolve(&self, credentials: SignIn) -> Result<SignIn, IdentityError> {
        let Some(verifier) = &self.verifier else {
            return Ok(credentials);
        };
        let id_token = credentials
            .id_token
            .as_deref()
            .ok_or_else(|| IdentityError::InvalidCredentials("id_token is required".to_string()))?;
        verifier.verify(id_token)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn current_user(&self, token: &str) -> Result<Option<User>, IdentityError> {
        let Some(uid) = self.sessions.read().get(token).cloned() else {
            return Ok(None);
        };
        Ok(self.users.read().get(&uid).cloned())
    }

    async fn sign_in(&self, credentials: SignIn, now: DateTime<Utc>) -> Result<Session, IdentityError> {
        let credentials = self.resolve(credentials)?;
        let uid = credentials.uid.trim().to_string();
        if uid.is_empty() {
            return Err(IdentityError::InvalidCredentials("uid must not be empty".to_string()));
        }

        let mut users = self.users.write();
        if let Some(existing) = users.get(&uid) {
            if !existing.email.eq_ignore_ascii_case(credentials.email.trim()) {
                tracing::warn!(uid = %uid, "Rejected sign-in with mismatched email");
                return Err(IdentityError::InvalidCredentials(
                    "email does not match the registered account".to_string(),
                ));
            }
        }
        let user = users
            .entry(uid.clone())
            .or_insert_with(|| {
                tracing::info!(uid = %uid, "Creating profile on first sign-in");
                User {
                    uid: uid.clone(),
                    email: credentials.email.trim().to_string(),
                    display_name: credentials.display_name.trim().to_string(),
                    photo_url: normalize_optional(credentials.photo_url),
                    created_at: now,
                }
            })
            .clone();
        drop(users);

        let token = Uuid::new_v4().simple().to_string();
        self.sessions.write().insert(token.clone(), uid);

        Ok(Session { token, user })
    }

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        self.sessions.write().remove(token);
        Ok(())
    }

    async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> Result<User, IdentityError> {
        let mut users = self.users.write();
        let user = users
            .get_mut(uid)
            .ok_or_else(|| IdentityError::UnknownUser(uid.to_string()))?;
        user.apply_update(update);
        Ok(user.clone())
    }
}
