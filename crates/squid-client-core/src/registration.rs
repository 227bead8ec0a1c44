use std::sync::Arc;

use tracing::{info, warn};

use crate::api::SquidApi;
use crate::error::ClientError;
use crate::model::Credentials;
use crate::routing::{AppRoute, Navigator};

pub const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords do not match";
pub const REGISTRATION_FAILURE_MESSAGE: &str = "Registration failed";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Client-side checks. Nothing is sent when these fail.
    pub fn validate(&self) -> Result<Credentials, ClientError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ClientError::validation("Email is required"));
        }
        if self.password.is_empty() {
            return Err(ClientError::validation("Password is required"));
        }
        if self.password != self.confirm_password {
            return Err(ClientError::validation(PASSWORD_MISMATCH_MESSAGE));
        }
        Ok(Credentials {
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

/// Account creation. Never touches the session; on success the user is sent
/// to the login view.
pub struct Registration {
    api: Arc<dyn SquidApi>,
    navigator: Arc<dyn Navigator>,
    last_error: Option<String>,
}

impl Registration {
    pub fn new(api: Arc<dyn SquidApi>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            navigator,
            last_error: None,
        }
    }

    /// Inline message for the form: the validation text, the server's `error`
    /// field verbatim, or the generic fallback.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub async fn submit(&mut self, form: &RegistrationForm) -> Result<(), ClientError> {
        let result = self.register(form).await;
        self.last_error = result
            .as_ref()
            .err()
            .map(|error| error.user_message(REGISTRATION_FAILURE_MESSAGE));
        result
    }

    async fn register(&self, form: &RegistrationForm) -> Result<(), ClientError> {
        let credentials = form.validate()?;
        self.api.register(&credentials).await.map_err(|error| {
            warn!(%error, "registration rejected");
            ClientError::from(error)
        })?;
        info!(email = %credentials.email, "registration accepted");
        self.navigator.navigate(AppRoute::Login);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::routing::NavigationQueue;
    use crate::testing::FakeApi;
    use tokio::sync::mpsc::error::TryRecvError;

    fn form(password: &str, confirm_password: &str) -> RegistrationForm {
        RegistrationForm {
            email: "new@squid.dev".to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        }
    }

    #[tokio::test]
    async fn mismatched_passwords_fail_without_request() {
        let api = FakeApi::new();
        let (queue, mut routes) = NavigationQueue::channel();
        let mut registration = Registration::new(api.clone(), Arc::new(queue));

        let error = registration
            .submit(&form("hunter2", "hunter3"))
            .await
            .expect_err("mismatch");
        assert_eq!(error, ClientError::validation(PASSWORD_MISMATCH_MESSAGE));
        assert_eq!(registration.error_message(), Some(PASSWORD_MISMATCH_MESSAGE));
        assert!(api.calls().is_empty());
        assert_eq!(routes.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn success_navigates_to_login() {
        let api = FakeApi::new();
        let (queue, mut routes) = NavigationQueue::channel();
        let mut registration = Registration::new(api.clone(), Arc::new(queue));

        registration
            .submit(&form("hunter2", "hunter2"))
            .await
            .expect("registered");
        assert_eq!(registration.error_message(), None);
        assert_eq!(api.calls(), vec!["register:new@squid.dev".to_string()]);
        assert_eq!(routes.try_recv(), Ok(AppRoute::Login));
    }

    #[tokio::test]
    async fn server_error_is_shown_verbatim() {
        let api = FakeApi::new();
        api.set_register(Err(ApiError::Http {
            status: 400,
            error: Some("Email already exists".to_string()),
        }));
        let (queue, mut routes) = NavigationQueue::channel();
        let mut registration = Registration::new(api, Arc::new(queue));

        registration
            .submit(&form("hunter2", "hunter2"))
            .await
            .expect_err("duplicate");
        assert_eq!(registration.error_message(), Some("Email already exists"));
        assert_eq!(routes.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn missing_server_message_uses_fallback() {
        let api = FakeApi::new();
        api.set_register(Err(ApiError::Network {
            message: "connection refused".to_string(),
        }));
        let (queue, _routes) = NavigationQueue::channel();
        let mut registration = Registration::new(api, Arc::new(queue));

        let error = registration
            .submit(&form("hunter2", "hunter2"))
            .await
            .expect_err("offline");
        assert!(matches!(error, ClientError::NetworkFailure { .. }));
        assert_eq!(
            registration.error_message(),
            Some(REGISTRATION_FAILURE_MESSAGE)
        );
    }
}
