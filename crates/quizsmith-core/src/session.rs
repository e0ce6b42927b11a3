// Authentication state: the bearer token, the signed-in user and the
// transitions between them.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, QuizApi};
use crate::model::{Credentials, User};
use crate::store::LocalStore;

/// Local storage key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// The persisted token has not been checked yet.
    Loading,
    Anonymous,
    Authenticated,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("signed in, but the user profile could not be loaded")]
    ProfileUnavailable,
}

impl SessionError {
    pub fn detail(&self) -> Option<&str> {
        match self {
            SessionError::Api(e) => e.detail(),
            SessionError::ProfileUnavailable => None,
        }
    }
}

/// Owns the token and the current user. The token is mirrored into the
/// API client so every request carries it, and into the local store so it
/// survives restarts.
pub struct Session {
    api: Arc<dyn QuizApi>,
    store: LocalStore,
    token: Option<String>,
    user: Option<User>,
    loading: bool,
}

impl Session {
    /// Restore the persisted token, if any. The session stays `Loading`
    /// until `load_user` runs.
    pub fn new(api: Arc<dyn QuizApi>, store: LocalStore) -> Self {
        let token = match store.get_item(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!("could not read persisted token: {e:#}");
                None
            }
        };
        api.set_token(token.clone());
        Session {
            api,
            store,
            token,
            user: None,
            loading: true,
        }
    }

    pub fn api(&self) -> &Arc<dyn QuizApi> {
        &self.api
    }

    /// Fetch the profile for the current token. Any failure logs the
    /// session out. Always leaves the `Loading` state.
    pub async fn load_user(&mut self) -> Option<&User> {
        if self.token.is_some() {
            self.api.set_token(self.token.clone());
            let fetched = self.api.me().await;
            match fetched {
                Ok(user) => {
                    info!(email = %user.email, "session restored");
                    self.user = Some(user);
                }
                Err(e) => {
                    warn!("failed to load user, logging out: {e}");
                    self.logout();
                }
            }
        }
        self.loading = false;
        self.user.as_ref()
    }

    /// Exchange credentials for a token, persist it, then load the profile.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<User, SessionError> {
        let token = self.api.login(credentials).await?;
        if let Err(e) = self.store.set_item(TOKEN_KEY, &token.access_token) {
            warn!("could not persist token: {e:#}");
        }
        self.token = Some(token.access_token);

        match self.load_user().await {
            Some(user) => {
                info!(email = %user.email, "logged in");
                Ok(user.clone())
            }
            None => Err(SessionError::ProfileUnavailable),
        }
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, credentials: &Credentials) -> Result<(), SessionError> {
        self.api.register(credentials).await?;
        info!(email = %credentials.email, "account registered");
        Ok(())
    }

    /// Clear the user and token everywhere. Storage failures are logged.
    pub fn logout(&mut self) {
        self.user = None;
        self.token = None;
        self.api.set_token(None);
        if let Err(e) = self.store.remove_item(TOKEN_KEY) {
            warn!("could not remove persisted token: {e:#}");
        }
        info!("logged out");
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Replace the cached profile after a successful update.
    pub fn replace_user(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn status(&self) -> AuthStatus {
        if self.loading {
            AuthStatus::Loading
        } else if self.user.is_some() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }
}
