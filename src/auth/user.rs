//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The unique name the user logs in with.
    pub username: String,
    /// The user's email address, unique across users.
    pub email: String,
    /// The user's first name, may be empty.
    pub first_name: String,
    /// The user's last name, may be empty.
    pub last_name: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

impl User {
    /// The name to greet the user with.
    pub fn display_name(&self) -> &str {
        if self.first_name.is_empty() {
            &self.username
        } else {
            &self.first_name
        }
    }
}

/// The data needed to register a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The name the user logs in with.
    pub username: String,
    /// The user's email address.
    pub email: String,
    /// The user's first name, may be empty.
    pub first_name: String,
    /// The user's last name, may be empty.
    pub last_name: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE COLLATE NOCASE,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Check that `username` is not empty and return it without surrounding whitespace.
pub fn validate_username(username: &str) -> Result<String, Error> {
    let username = username.trim();

    if username.is_empty() {
        Err(Error::EmptyUsername)
    } else {
        Ok(username.to_owned())
    }
}

/// Check that `email` looks like an email address and return it without surrounding whitespace.
pub fn validate_email(email: &str) -> Result<String, Error> {
    let email = email.trim();

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(email.to_owned())
        }
        _ => Err(Error::InvalidEmail(email.to_owned())),
    }
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::EmptyUsername] or [Error::InvalidEmail] if the user details are invalid,
/// - [Error::DuplicateUsername] or [Error::DuplicateEmail] if another user has the same username or email,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let username = validate_username(&new_user.username)?;
    let email = validate_email(&new_user.email)?;
    let first_name = new_user.first_name.trim().to_owned();
    let last_name = new_user.last_name.trim().to_owned();

    connection
        .execute(
            "INSERT INTO user (username, email, first_name, last_name, password, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                &username,
                &email,
                &first_name,
                &last_name,
                new_user.password_hash.as_ref(),
                OffsetDateTime::now_utc(),
            ),
        )
        .map_err(|error| map_unique_error(error, &username, &email))?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username,
        email,
        first_name,
        last_name,
        password_hash: new_user.password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, email, first_name, last_name, password
            FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the user whose username matches `username`, ignoring case.
///
/// # Errors
///
/// Returns an [Error::NotFound] if there is no user with that username.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, email, first_name, last_name, password
            FROM user WHERE username = :username",
        )?
        .query_row(&[(":username", &username.trim())], map_row)
        .map_err(|error| error.into())
}

/// Update the name and email of a user.
///
/// # Errors
///
/// Returns an [Error::InvalidEmail] or [Error::DuplicateEmail] if the email
/// cannot be used, or an [Error::NotFound] if the user does not exist.
pub fn update_user_details(
    user_id: UserID,
    email: &str,
    first_name: &str,
    last_name: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let email = validate_email(email)?;

    let rows_affected = connection
        .execute(
            "UPDATE user SET email = ?1, first_name = ?2, last_name = ?3 WHERE id = ?4",
            (&email, first_name.trim(), last_name.trim(), user_id.as_i64()),
        )
        .map_err(|error| map_unique_error(error, "", &email))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Replace the password hash of a user.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the user does not exist.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete a user along with their profile, categories, expenses and income.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the user does not exist.
pub fn delete_user(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM user WHERE id = ?1", [user_id.as_i64()])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_unique_error(error: rusqlite::Error, username: &str, email: &str) -> Error {
    match error {
        // Code 2067 occurs when a UNIQUE constraint failed.
        rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
            if sql_error.extended_code == 2067 && desc.ends_with("user.username") =>
        {
            Error::DuplicateUsername(username.to_owned())
        }
        rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
            if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
        {
            Error::DuplicateEmail(email.to_owned())
        }
        error => error.into(),
    }
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_password_hash: String = row.get(5)?;

    Ok(User {
        id: UserID::new(raw_id),
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
