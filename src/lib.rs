//! A web app for tracking personal expenses and income.
//!
//! Users record expenses and income against their own categories, filter and
//! search their expenses, view monthly and per-category summaries on a
//! dashboard, and export their records as CSV.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod category;
mod dashboard;
mod db;
mod endpoints;
mod filter;
mod html;
mod internal_server_error;
mod logging;
mod money;
mod navigation;
mod not_found;
mod pagination;
mod profile;
mod routing;
mod store;
mod summary;
#[cfg(test)]
mod test_utils;
mod timezone;
mod transaction;

pub use app_state::{AppConfig, AppState};
pub use auth::{
    PasswordHash, User, UserID, ValidatedPassword, delete_user, get_user_by_username,
    update_password,
};
pub use category::{
    Category, CategoryTemplate, DEFAULT_CATEGORIES, get_categories, seed_default_categories,
};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use money::Amount;
pub use pagination::PaginationConfig;
pub use profile::get_or_create_profile;
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use transaction::{Transaction, TransactionKind, create_transaction};

/// Functions for creating users from outside the web app, e.g., when seeding a demo database.
pub mod accounts {
    pub use crate::auth::{NewUser, create_user};
}

use crate::{
    alert::Alert, internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate_signal) => {
                terminate_signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth token in the cookie could not be parsed or has expired.
    #[error("the auth token is invalid or has expired")]
    InvalidToken,

    /// There was an error creating or formatting the expiry date time for a cookie.
    #[error("could not set the cookie expiry: {0}")]
    InvalidDateFormat(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An empty or whitespace-only username was used to register.
    #[error("Username cannot be empty")]
    EmptyUsername,

    /// The username is already taken by another user.
    #[error("the username \"{0}\" is already taken")]
    DuplicateUsername(String),

    /// The email address is already used by another user.
    #[error("the email \"{0}\" is already registered")]
    DuplicateEmail(String),

    /// The email address is not in a valid format.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// A date could not be parsed.
    #[error("\"{0}\" is not a valid date, e.g. 2025-01-31")]
    InvalidDate(String),

    /// The start of a date range is after its end.
    #[error("the start date {0} is after the end date {1}")]
    InvalidDateRange(Date, Date),

    /// An amount of zero or less was used for an expense or income.
    #[error("Amount must be greater than zero.")]
    NonPositiveAmount,

    /// The amount could not be parsed or does not fit the allowed precision.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The minimum amount of a filter is greater than its maximum amount.
    #[error("the minimum amount {0} is greater than the maximum amount {1}")]
    InvalidAmountRange(String, String),

    /// A filter parameter could not be parsed.
    #[error("invalid value for the filter \"{0}\"")]
    InvalidFilter(String),

    /// An empty string was used as the title of an expense or income.
    #[error("Title cannot be empty")]
    EmptyTitle,

    /// The title of an expense or income is too long.
    #[error("Title cannot be longer than {0} characters")]
    TitleTooLong(usize),

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// The category name is too long.
    #[error("Category name cannot be longer than {0} characters")]
    CategoryNameTooLong(usize),

    /// The category type is not one of expense, income or both.
    #[error("\"{0}\" is not a valid category type")]
    InvalidCategoryType(String),

    /// The color is not a hex color string such as "#6c757d".
    #[error("\"{0}\" is not a valid hex color, e.g. #6c757d")]
    InvalidColor(String),

    /// The currency symbol is empty or too long.
    #[error("Currency symbol must be between 1 and {0} characters")]
    InvalidCurrency(usize),

    /// The category ID does not refer to a category owned by the user.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory,

    /// The category cannot be used for this kind of transaction.
    #[error("the category \"{0}\" cannot be used for {1}")]
    CategoryTypeMismatch(String, String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while writing CSV data.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_)) if sql_error.extended_code == 787 => {
                Error::InvalidCategory
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// Whether the error was caused by invalid input from the client.
    fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidDate(_)
                | Error::InvalidDateRange(_, _)
                | Error::NonPositiveAmount
                | Error::InvalidAmount(_)
                | Error::InvalidAmountRange(_, _)
                | Error::InvalidFilter(_)
                | Error::EmptyTitle
                | Error::TitleTooLong(_)
                | Error::EmptyCategoryName
                | Error::CategoryNameTooLong(_)
                | Error::InvalidCategoryType(_)
                | Error::InvalidColor(_)
                | Error::InvalidCurrency(_)
                | Error::InvalidCategory
                | Error::CategoryTypeMismatch(_, _)
                | Error::EmptyUsername
                | Error::InvalidEmail(_)
                | Error::DuplicateUsername(_)
                | Error::DuplicateEmail(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            error if error.is_validation_error() => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: error.to_string(),
                },
            )
                .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                        ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            )
                .into_response(),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Not found".to_owned(),
                    details: "The requested item could not be found.".to_owned(),
                },
            )
                .into_response(),
            Error::UpdateMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update transaction".to_owned(),
                    details: "The transaction could not be found.".to_owned(),
                },
            )
                .into_response(),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete transaction".to_owned(),
                    details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                        .to_owned(),
                },
            )
                .into_response(),
            Error::UpdateMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update category".to_owned(),
                    details: "The category could not be found.".to_owned(),
                },
            )
                .into_response(),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category could not be found. \
                    Try refreshing the page to see if the category has already been deleted."
                        .to_owned(),
                },
            )
                .into_response(),
            error if error.is_validation_error() => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid input".to_owned(),
                    details: error.to_string(),
                },
            )
                .into_response(),
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details:
                            "An unexpected error occurred, check the server logs for more details."
                                .to_owned(),
                    },
                )
                    .into_response()
            }
        }
    }
}
