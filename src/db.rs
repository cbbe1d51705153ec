//! Sets up the application's SQLite database.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, auth::create_user_table, category::create_category_table,
    profile::create_profile_table, transaction::create_transaction_tables,
};

/// Enable foreign keys and create the tables for the domain models.
///
/// Foreign keys are off by default in SQLite and the setting is per
/// connection, so this must be called on every new connection. Deleting a
/// user relies on it to cascade to their profile, categories and transactions.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_profile_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
