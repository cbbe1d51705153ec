//! Database fixtures shared by the unit tests.

use rusqlite::Connection;
use time::Date;

use crate::{
    auth::{NewUser, PasswordHash, User, create_user},
    category::{Category, CategoryName, CategoryType, NewCategory, create_category},
    db::initialize,
    money::Amount,
    transaction::{Transaction, TransactionKind, create_transaction},
};

/// An in-memory database with every table created.
#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// An in-memory database with a single user named "ada".
#[track_caller]
pub(crate) fn get_test_connection_with_user() -> (Connection, User) {
    let connection = get_test_connection();
    let user = create_test_user("ada", &connection);

    (connection, user)
}

/// Create a user named `username` with the email `<username>@example.com` and a dummy password hash.
#[track_caller]
pub(crate) fn create_test_user(username: &str, connection: &Connection) -> User {
    create_user(
        NewUser {
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        },
        connection,
    )
    .expect("Could not create test user")
}

#[track_caller]
pub(crate) fn create_test_category(
    user: &User,
    name: &str,
    category_type: CategoryType,
    connection: &Connection,
) -> Category {
    create_category(
        user.id,
        NewCategory::new(CategoryName::new_unchecked(name), category_type),
        connection,
    )
    .expect("Could not create test category")
}

/// Record an expense or income for `user` with an optional category.
#[track_caller]
pub(crate) fn create_test_transaction(
    user: &User,
    kind: TransactionKind,
    title: &str,
    cents: i64,
    date: Date,
    category: Option<&Category>,
    connection: &Connection,
) -> Transaction {
    create_transaction(
        user.id,
        kind,
        Transaction::build(title, Amount::from_cents(cents), date)
            .category(category.map(|category| category.id)),
        connection,
    )
    .expect("Could not create test transaction")
}
