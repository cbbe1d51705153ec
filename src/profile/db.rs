//! Database operations for user profiles.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, auth::UserID};

/// The currency symbol used until the user picks another one.
pub const DEFAULT_CURRENCY: &str = "$";

/// The max number of characters in a currency symbol.
pub const MAX_CURRENCY_LENGTH: usize = 10;

/// The display settings of a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: UserID,
    /// A reference to an uploaded avatar image, if any.
    pub avatar: Option<String>,
    /// The symbol shown in front of amounts, e.g. "$" or "NZ$".
    pub currency: String,
    pub dark_mode: bool,
    pub created_at: OffsetDateTime,
}

/// Create the profile table.
///
/// Each user has at most one profile, which is deleted along with the user.
pub fn create_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS profile (
            user_id INTEGER PRIMARY KEY,
            avatar TEXT,
            currency TEXT NOT NULL DEFAULT '$',
            dark_mode INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Check that `currency` has between 1 and [MAX_CURRENCY_LENGTH] characters
/// and return it without surrounding whitespace.
pub fn validate_currency(currency: &str) -> Result<String, Error> {
    let currency = currency.trim();
    let length = currency.graphemes(true).count();

    if length == 0 || length > MAX_CURRENCY_LENGTH {
        return Err(Error::InvalidCurrency(MAX_CURRENCY_LENGTH));
    }

    Ok(currency.to_owned())
}

/// Get the profile of `user_id`, creating one with the default settings if
/// the user does not have one yet.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the user does not exist.
pub fn get_or_create_profile(user_id: UserID, connection: &Connection) -> Result<Profile, Error> {
    connection
        .execute(
            "INSERT OR IGNORE INTO profile (user_id, currency, dark_mode, created_at)
            VALUES (?1, ?2, 0, ?3)",
            (user_id.as_i64(), DEFAULT_CURRENCY, OffsetDateTime::now_utc()),
        )
        .map_err(|error| match Error::from(error) {
            // The only foreign key on the profile table is the user.
            Error::InvalidCategory => Error::NotFound,
            error => error,
        })?;

    connection
        .prepare(
            "SELECT user_id, avatar, currency, dark_mode, created_at
            FROM profile WHERE user_id = :user_id",
        )?
        .query_row(&[(":user_id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Set the currency symbol of a user.
///
/// # Errors
///
/// Returns an [Error::InvalidCurrency] if the symbol is empty or too long,
/// or an [Error::NotFound] if the user does not exist.
pub fn update_currency(
    user_id: UserID,
    currency: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let currency = validate_currency(currency)?;
    get_or_create_profile(user_id, connection)?;

    connection.execute(
        "UPDATE profile SET currency = ?1 WHERE user_id = ?2",
        (&currency, user_id.as_i64()),
    )?;

    Ok(())
}

/// Flip the dark mode setting of a user and return the new value.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the user does not exist.
pub fn toggle_dark_mode(user_id: UserID, connection: &Connection) -> Result<bool, Error> {
    get_or_create_profile(user_id, connection)?;

    connection
        .query_row(
            "UPDATE profile SET dark_mode = NOT dark_mode WHERE user_id = ?1 RETURNING dark_mode",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<Profile, rusqlite::Error> {
    Ok(Profile {
        user_id: UserID::new(row.get(0)?),
        avatar: row.get(1)?,
        currency: row.get(2)?,
        dark_mode: row.get(3)?,
        created_at: row.get(4)?,
    })
}
