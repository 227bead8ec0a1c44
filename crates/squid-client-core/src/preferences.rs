use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::SquidApi;
use crate::config::DEFAULT_REDIRECT_DELAY_MS;
use crate::error::ClientError;
use crate::model::{Notifications, Preferences, Theme};
use crate::routing::{AppRoute, Navigator};
use crate::session::SessionStore;

pub const SAVE_SUCCESS_MESSAGE: &str = "Preferences saved successfully! Redirecting...";
pub const SAVE_FAILURE_MESSAGE: &str = "Failed to save preferences. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStatus {
    Idle,
    Saved,
    Failed(String),
}

/// Preference form bound to the lifetime of the preferences view.
///
/// A successful save writes the submitted payload into the [`SessionStore`]
/// and schedules a dashboard navigation after `redirect_delay`. Dropping the
/// form, or calling [`PreferenceSynchronizer::teardown`], cancels a pending
/// navigation.
pub struct PreferenceSynchronizer {
    api: Arc<dyn SquidApi>,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    redirect_delay: Duration,
    draft: Preferences,
    status: SubmitStatus,
    pending_redirect: Option<JoinHandle<()>>,
}

impl PreferenceSynchronizer {
    pub fn new(api: Arc<dyn SquidApi>, store: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        let draft = store.preferences().unwrap_or_default();
        Self {
            api,
            store,
            navigator,
            redirect_delay: Duration::from_millis(DEFAULT_REDIRECT_DELAY_MS),
            draft,
            status: SubmitStatus::Idle,
            pending_redirect: None,
        }
    }

    #[must_use]
    pub fn with_redirect_delay(mut self, redirect_delay: Duration) -> Self {
        self.redirect_delay = redirect_delay;
        self
    }

    #[must_use]
    pub fn draft(&self) -> &Preferences {
        &self.draft
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.draft.theme = theme;
    }

    pub fn set_notifications(&mut self, notifications: Notifications) {
        self.draft.notifications = notifications;
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.draft.language = language.into();
    }

    pub fn set_draft(&mut self, preferences: Preferences) {
        self.draft = preferences;
    }

    /// Re-seeds the form from the session, e.g. after the cached preferences
    /// changed underneath the view.
    pub fn reload_from_store(&mut self) {
        if let Some(preferences) = self.store.preferences() {
            self.draft = preferences;
        }
    }

    #[must_use]
    pub fn status(&self) -> &SubmitStatus {
        &self.status
    }

    #[must_use]
    pub fn success_message(&self) -> Option<&'static str> {
        (self.status == SubmitStatus::Saved).then_some(SAVE_SUCCESS_MESSAGE)
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            SubmitStatus::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn redirect_pending(&self) -> bool {
        self.pending_redirect
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Only one submission can be in flight: `submit` holds the form
    /// exclusively until the backend answers. Messages from the previous
    /// attempt are cleared first, so an abandoned submit leaves the form idle.
    pub async fn submit(&mut self) -> Result<(), ClientError> {
        self.status = SubmitStatus::Idle;
        let payload = self.draft.clone();
        if payload.language.trim().is_empty() {
            let error = ClientError::validation("Language is required");
            self.status = SubmitStatus::Failed(error.user_message(SAVE_FAILURE_MESSAGE));
            return Err(error);
        }

        match self.api.save_preferences(&payload).await {
            Ok(()) => {
                self.store.update_preferences(payload);
                self.status = SubmitStatus::Saved;
                info!("preferences saved");
                self.schedule_redirect();
                Ok(())
            }
            Err(error) => {
                let error = ClientError::from(error);
                warn!(%error, "saving preferences failed");
                self.status = SubmitStatus::Failed(SAVE_FAILURE_MESSAGE.to_string());
                Err(error)
            }
        }
    }

    fn schedule_redirect(&mut self) {
        self.cancel_redirect();
        let navigator = Arc::clone(&self.navigator);
        let delay = self.redirect_delay;
        debug!(delay_ms = delay.as_millis() as u64, "dashboard redirect scheduled");
        self.pending_redirect = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(AppRoute::Dashboard);
        }));
    }

    fn cancel_redirect(&mut self) {
        if let Some(handle) = self.pending_redirect.take() {
            if !handle.is_finished() {
                debug!("pending dashboard redirect cancelled");
            }
            handle.abort();
        }
    }

    /// Called when the preferences view is dismissed.
    pub fn teardown(&mut self) {
        self.cancel_redirect();
    }
}

impl Drop for PreferenceSynchronizer {
    fn drop(&mut self) {
        self.cancel_redirect();
    }
}
