//! Process-wide authentication state.
//!
//! [`SessionStore`] owns the only shared mutable state of the client: whether
//! the user is signed in and the preferences cached at login. Every write
//! replaces the whole [`Session`] value in one step, so readers never observe
//! `authenticated` without preferences or the reverse.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::SquidApi;
use crate::error::{ApiError, ClientError};
use crate::model::{Credentials, Preferences};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    preferences: Option<Preferences>,
}

impl Session {
    #[must_use]
    pub fn signed_out() -> Self {
        Self { preferences: None }
    }

    #[must_use]
    pub fn signed_in(preferences: Preferences) -> Self {
        Self {
            preferences: Some(preferences),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.preferences.is_some()
    }

    #[must_use]
    pub fn preferences(&self) -> Option<&Preferences> {
        self.preferences.as_ref()
    }
}

/// Cloneable handle to the shared session. Clones observe the same state.
#[derive(Clone)]
pub struct SessionStore {
    api: Arc<dyn SquidApi>,
    state: Arc<watch::Sender<Session>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(api: Arc<dyn SquidApi>) -> Self {
        let (state, _) = watch::channel(Session::signed_out());
        Self {
            api,
            state: Arc::new(state),
        }
    }

    /// Returns `true` when the backend accepted the credentials and the
    /// session is now populated. Failures leave the session untouched.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        match self.try_login(email, password).await {
            Ok(()) => true,
            Err(error) => {
                warn!(%error, "login failed");
                false
            }
        }
    }

    pub async fn try_login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let credentials = login_credentials(email, password)?;
        let response = self
            .api
            .login(&credentials)
            .await
            .map_err(ClientError::from_login)?;

        self.state.send_replace(Session::signed_in(response.preferences));
        info!(email = %credentials.email, "login accepted");
        Ok(())
    }

    /// Best-effort logout. Once the request completes, whatever its status,
    /// the local session is cleared. When the request cannot complete the
    /// session is kept and the failure is returned.
    pub async fn logout(&self) -> Result<(), ClientError> {
        match self.api.logout().await {
            Ok(()) => {}
            Err(ApiError::Http { status, error }) => {
                warn!(
                    status,
                    error = error.as_deref().unwrap_or("<none>"),
                    "logout completed with server error; clearing local session"
                );
            }
            Err(error) => {
                warn!(%error, "logout request failed; session left unchanged");
                return Err(ClientError::from(error));
            }
        }

        self.state.send_replace(Session::signed_out());
        info!("logged out");
        Ok(())
    }

    /// Overwrites the cached preferences without contacting the backend.
    /// Ignored while signed out so no preferences outlive a logout.
    pub fn update_preferences(&self, preferences: Preferences) {
        let updated = self.state.send_if_modified(|session| {
            if !session.is_authenticated() || session.preferences() == Some(&preferences) {
                return false;
            }
            *session = Session::signed_in(preferences.clone());
            true
        });
        if !updated && !self.is_authenticated() {
            debug!("preference update ignored while signed out");
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn preferences(&self) -> Option<Preferences> {
        self.state.borrow().preferences().cloned()
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Change notifications for re-rendering views.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }
}

fn login_credentials(email: &str, password: &str) -> Result<Credentials, ClientError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ClientError::validation("Email is required"));
    }
    if password.is_empty() {
        return Err(ClientError::validation("Password is required"));
    }
    Ok(Credentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}
