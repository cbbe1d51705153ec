//! Expense and income models and their database functions.
//!
//! Expenses and income have the same shape and are stored in two tables with
//! identical columns, so every function here takes a [TransactionKind] to
//! pick the table.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    category::{CategoryId, Color, get_category},
    endpoints::{self, format_endpoint},
    money::Amount,
};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for an expense or income.
pub type TransactionId = i64;

/// The maximum number of characters in the title of an expense or income.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Whether a transaction is money going out or coming in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money spent.
    Expense,
    /// Money received.
    Income,
}

impl TransactionKind {
    /// Both kinds, expenses first.
    pub const ALL: [TransactionKind; 2] = [TransactionKind::Expense, TransactionKind::Income];

    /// The database table holding transactions of this kind.
    pub fn table(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
        }
    }

    /// Lowercase name of a single transaction, e.g. "expense".
    pub fn singular(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
        }
    }

    /// Lowercase name of many transactions, e.g. "expenses".
    pub fn plural(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "expenses",
            TransactionKind::Income => "income",
        }
    }

    /// Title case name used for page headings, e.g. "Expenses".
    pub fn title(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "Expenses",
            TransactionKind::Income => "Income",
        }
    }

    /// The page listing transactions of this kind.
    pub fn list_view(&self) -> &'static str {
        match self {
            TransactionKind::Expense => endpoints::EXPENSES_VIEW,
            TransactionKind::Income => endpoints::INCOME_VIEW,
        }
    }

    /// The page with the form for a new transaction.
    pub fn new_view(&self) -> &'static str {
        match self {
            TransactionKind::Expense => endpoints::NEW_EXPENSE_VIEW,
            TransactionKind::Income => endpoints::NEW_INCOME_VIEW,
        }
    }

    /// The page for editing the transaction `id`.
    pub fn edit_view(&self, id: TransactionId) -> String {
        match self {
            TransactionKind::Expense => format_endpoint(endpoints::EDIT_EXPENSE_VIEW, id),
            TransactionKind::Income => format_endpoint(endpoints::EDIT_INCOME_VIEW, id),
        }
    }

    /// The endpoint new transactions are posted to.
    pub fn create_api(&self) -> &'static str {
        match self {
            TransactionKind::Expense => endpoints::EXPENSES_API,
            TransactionKind::Income => endpoints::INCOME_API,
        }
    }

    /// The endpoint for updating or deleting the transaction `id`.
    pub fn item_api(&self, id: TransactionId) -> String {
        match self {
            TransactionKind::Expense => format_endpoint(endpoints::EXPENSE_API, id),
            TransactionKind::Income => format_endpoint(endpoints::INCOME_ITEM_API, id),
        }
    }

    /// The CSV download for transactions of this kind.
    pub fn export_url(&self) -> &'static str {
        match self {
            TransactionKind::Expense => endpoints::EXPORT_EXPENSES,
            TransactionKind::Income => endpoints::EXPORT_INCOME,
        }
    }
}

/// The parts of a category shown next to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub color: Color,
}

/// An expense or income recorded by a user.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// A short name for the transaction, e.g. "Weekly groceries".
    pub title: String,
    /// The amount of money spent or received.
    pub amount: Amount,
    /// The category the transaction is filed under, if any.
    pub category: Option<CategorySummary>,
    /// When the transaction happened.
    pub date: Date,
    /// Optional notes, empty if not given.
    pub description: String,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
    /// When the transaction was last edited.
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(title: impl Into<String>, amount: Amount, date: Date) -> TransactionBuilder {
        TransactionBuilder {
            title: title.into(),
            amount,
            date,
            description: String::new(),
            category_id: None,
        }
    }
}

/// Builder for creating or updating a [Transaction].
///
/// The builder holds the fields the user controls. The ID and timestamps are
/// set by the database.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    /// A short name for the transaction.
    pub title: String,
    /// The amount of money spent or received.
    pub amount: Amount,
    /// When the transaction happened.
    pub date: Date,
    /// Optional notes.
    pub description: String,
    /// The category to file the transaction under.
    pub category_id: Option<CategoryId>,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.trim().to_owned();
        self
    }

    /// Set the category for the transaction.
    pub fn category(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }
}

/// Check that `title` is not empty and not too long, and return it trimmed.
///
/// # Errors
///
/// Returns an [Error::EmptyTitle] or an [Error::TitleTooLong].
pub fn validate_title(title: &str) -> Result<String, Error> {
    let title = title.trim();

    if title.is_empty() {
        Err(Error::EmptyTitle)
    } else if title.chars().count() > MAX_TITLE_LENGTH {
        Err(Error::TitleTooLong(MAX_TITLE_LENGTH))
    } else {
        Ok(title.to_owned())
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Columns selected by [map_transaction_row], with the category joined in.
///
/// The transaction table is aliased as `t` and the category table as `c`.
pub(crate) fn select_transactions(kind: TransactionKind) -> String {
    format!(
        "SELECT t.id, t.user_id, t.title, t.amount, t.date, t.description,
            t.created_at, t.updated_at, c.id, c.name, c.color
        FROM {table} t
        LEFT JOIN category c ON c.id = t.category_id",
        table = kind.table()
    )
}

/// The default order of expenses and income: newest first.
pub(crate) const DEFAULT_ORDER: &str = "ORDER BY t.date DESC, t.created_at DESC, t.id DESC";

/// Create a new expense or income for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyTitle] or [Error::TitleTooLong] if the title is invalid,
/// - [Error::InvalidCategory] if the category does not belong to the user,
/// - [Error::CategoryTypeMismatch] if the category cannot be used for `kind`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    kind: TransactionKind,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let title = validate_title(&builder.title)?;
    check_category(user_id, kind, builder.category_id, connection)?;
    let now = OffsetDateTime::now_utc();

    let id: TransactionId = connection.query_row(
        &format!(
            "INSERT INTO {table} (user_id, title, amount, category_id, date, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            RETURNING id",
            table = kind.table()
        ),
        (
            user_id.as_i64(),
            &title,
            builder.amount.cents(),
            builder.category_id,
            builder.date,
            &builder.description,
            now,
        ),
        |row| row.get(0),
    )?;

    get_transaction(id, user_id, kind, connection)
}

/// Retrieve an expense or income owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction of the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "{} WHERE t.id = :id AND t.user_id = :user_id",
            select_transactions(kind)
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Replace the user editable fields of an expense or income.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction of the user,
/// - the same validation errors as [create_transaction],
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    kind: TransactionKind,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<(), Error> {
    let title = validate_title(&builder.title)?;
    check_category(user_id, kind, builder.category_id, connection)?;

    let rows_affected = connection.execute(
        &format!(
            "UPDATE {table}
            SET title = ?1, amount = ?2, category_id = ?3, date = ?4, description = ?5, updated_at = ?6
            WHERE id = ?7 AND user_id = ?8",
            table = kind.table()
        ),
        (
            &title,
            builder.amount.cents(),
            builder.category_id,
            builder.date,
            &builder.description,
            OffsetDateTime::now_utc(),
            id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Delete an expense or income owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a transaction of the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        &format!(
            "DELETE FROM {table} WHERE id = ?1 AND user_id = ?2",
            table = kind.table()
        ),
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the expense and income tables in the database.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_transaction_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    for kind in TransactionKind::ALL {
        connection.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                amount INTEGER NOT NULL CHECK (amount > 0),
                category_id INTEGER,
                date TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_{table}_user_date ON {table}(user_id, date);",
            table = kind.table()
        ))?;
    }

    Ok(())
}

/// Map a row selected with [select_transactions] to a Transaction.
pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let category_id: Option<CategoryId> = row.get(8)?;
    let category = match category_id {
        Some(id) => {
            let color: String = row.get(10)?;

            Some(CategorySummary {
                id,
                name: row.get(9)?,
                color: Color::new_unchecked(&color),
            })
        }
        None => None,
    };

    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        title: row.get(2)?,
        amount: Amount::from_cents(row.get(3)?),
        date: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        category,
    })
}

/// Check that `category_id`, if given, is one of the user's categories and
/// fits `kind`.
fn check_category(
    user_id: UserID,
    kind: TransactionKind,
    category_id: Option<CategoryId>,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(category_id) = category_id else {
        return Ok(());
    };

    let category = get_category(category_id, user_id, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidCategory,
        error => error,
    })?;

    if !category.category_type.allows(kind) {
        return Err(Error::CategoryTypeMismatch(
            category.name.to_string(),
            kind.plural().to_owned(),
        ));
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
