use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LANGUAGE: &str = "English";
pub const DEFAULT_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notifications {
    #[default]
    Enabled,
    Disabled,
}

impl Notifications {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

/// User preferences as cached on the client and stored by the backend.
///
/// Missing fields deserialize to their defaults, so an empty object from the
/// server yields `{light, enabled, "English"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub notifications: Notifications,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            notifications: Notifications::default(),
            language: default_language(),
        }
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub current_page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            current_page: 1,
            per_page: DEFAULT_PER_PAGE,
            total_pages: 1,
            total_items: 0,
        }
    }
}

impl PaginationState {
    /// Brings server-reported values into the client's invariants: at least
    /// one page, a positive page size, and a current page inside the range.
    /// The backend reports `total_pages = 0` for an empty collection.
    #[must_use]
    pub fn normalized(self) -> Self {
        let total_pages = self.total_pages.max(1);
        Self {
            current_page: self.current_page.clamp(1, total_pages),
            per_page: self.per_page.max(1),
            total_pages,
            total_items: self.total_items,
        }
    }

    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }

    #[must_use]
    pub fn previous_page(&self) -> Option<u32> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    #[must_use]
    pub fn next_page(&self) -> Option<u32> {
        (self.current_page < self.total_pages).then(|| self.current_page + 1)
    }

    /// Buttons a pagination control may offer. Targets outside
    /// `[1, total_pages]` are never produced.
    #[must_use]
    pub fn controls(&self) -> PaginationControls {
        let pages = (1..=self.total_pages)
            .map(|number| PageButton {
                number,
                current: number == self.current_page,
            })
            .collect();
        PaginationControls {
            previous: self.previous_page(),
            next: self.next_page(),
            pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageButton {
    pub number: u32,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationControls {
    pub previous: Option<u32>,
    pub next: Option<u32>,
    pub pages: Vec<PageButton>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub action: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVisitRecord {
    pub page: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVisitRequest {
    pub page: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "preferences_or_default")]
    pub preferences: Preferences,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivitiesResponse {
    #[serde(default)]
    pub activities: Vec<ActivityRecord>,
    pub pagination: PaginationState,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionInfoResponse {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub duration_seconds: u64,
    #[serde(default)]
    pub pages_visited: Vec<PageVisitRecord>,
    pub pagination: PaginationState,
}

fn preferences_or_default<'de, D>(deserializer: D) -> Result<Preferences, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Preferences>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `"{minutes}m {seconds}s"`, the dashboard's session duration label.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Timestamps arrive as RFC 3339, as naive ISO-8601 (UTC implied) from
/// `datetime.isoformat()`, or as RFC 2822 from JSON-encoded datetimes.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let trimmed = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(parsed.with_timezone(&Utc));
        }
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(parsed.and_utc());
        }
        DateTime::parse_from_rfc2822(trimmed)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc))
    }
}
