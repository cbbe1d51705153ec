//! Server-wide state and the settings it is built from.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error, auth::DEFAULT_COOKIE_DURATION, dashboard::{DEFAULT_CHART_WINDOW_DAYS, MAX_CHART_WINDOW_DAYS}, db::initialize,
    pagination::PaginationConfig, timezone::get_local_offset,
};

/// The settings the server is started with.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// A canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub pagination_config: PaginationConfig,
    /// The number of days covered by the dashboard's monthly chart, between one
    /// and [MAX_CHART_WINDOW_DAYS].
    pub chart_window_days: i64,
    /// How long an auth cookie lasts without "remember me".
    pub cookie_duration: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            local_timezone: "Etc/UTC".to_owned(),
            pagination_config: PaginationConfig::default(),
            chart_window_days: DEFAULT_CHART_WINDOW_DAYS,
            cookie_duration: DEFAULT_COOKIE_DURATION,
        }
    }
}

/// The state shared by every handler.
///
/// Handlers take the parts they need through their own state structs that
/// implement [FromRef] for [AppState].
#[derive(Debug, Clone)]
pub struct AppState {
    /// Signs and encrypts the private auth cookie.
    pub cookie_key: Key,
    pub cookie_duration: Duration,
    pub local_timezone: String,
    pub pagination_config: PaginationConfig,
    pub chart_window_days: i64,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create the tables in `db_connection` if needed and wrap it for sharing between requests.
    ///
    /// # Errors
    /// Returns an [Error::InvalidTimezoneError] if `config.local_timezone` is
    /// not a canonical timezone name, or an [Error::SqlError] if the database
    /// cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        config: AppConfig,
    ) -> Result<Self, Error> {
        if get_local_offset(&config.local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(config.local_timezone));
        }

        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: config.cookie_duration,
            local_timezone: config.local_timezone,
            pagination_config: config.pagination_config,
            chart_window_days: config.chart_window_days.clamp(1, MAX_CHART_WINDOW_DAYS),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

// `PrivateCookieJar` finds its key through this impl.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the cookie key from `secret` so that any secret length works.
pub fn create_cookie_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret))
}
