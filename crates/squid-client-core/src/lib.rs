//! Client-side core for the Squid web application.
//!
//! Holds the session store, route guard, paginated list fetching and the
//! preference and registration forms. Transport lives behind [`SquidApi`];
//! the HTTP implementation is in `squid-api-client`.

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod pagination;
pub mod preferences;
pub mod registration;
pub mod routing;
pub mod session;
pub mod telemetry;
pub mod views;

#[cfg(test)]
mod testing;

pub use api::SquidApi;
pub use config::{ClientConfig, ConfigError, normalize_base_url};
pub use error::{ApiError, ClientError};
pub use model::{
    ActivitiesResponse, ActivityRecord, Credentials, LoginResponse, Notifications,
    PageVisitRecord, PageVisitRequest, PaginationControls, PaginationState, Preferences,
    SessionInfoResponse, Theme,
};
pub use pagination::{PageRequestError, PageRequestOutcome, PageSnapshot, PaginatedFetcher};
pub use preferences::{PreferenceSynchronizer, SubmitStatus};
pub use registration::{Registration, RegistrationForm};
pub use routing::{AppRoute, GuardDecision, NavigationQueue, Navigator, RouteGuard};
pub use session::{Session, SessionStore};
pub use telemetry::init_tracing;
pub use views::{ActivityLogView, DashboardView, SessionView};
