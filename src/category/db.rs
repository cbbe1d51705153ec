//! Database operations for categories.
//!
//! Every query is scoped to the owning user, so a category ID that belongs
//! to someone else behaves exactly like one that does not exist.

use std::collections::HashMap;

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryId, CategoryName, CategoryType, Color, NewCategory},
    transaction::TransactionKind,
};

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            category_type TEXT NOT NULL DEFAULT 'expense'
                CHECK (category_type IN ('expense', 'income', 'both')),
            icon TEXT NOT NULL DEFAULT 'bi-tag',
            color TEXT NOT NULL DEFAULT '#6c757d',
            is_default INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_name ON category(user_id, name);",
    )?;

    Ok(())
}

const SELECT_CATEGORY: &str = "SELECT id, user_id, name, category_type, icon, color, is_default, created_at
    FROM category";

/// Create a category for `user_id` and return it with its generated ID.
pub fn create_category(
    user_id: UserID,
    new_category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO category (user_id, name, category_type, icon, color, is_default, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            user_id.as_i64(),
            new_category.name.as_ref(),
            new_category.category_type,
            &new_category.icon,
            new_category.color.as_ref(),
            new_category.is_default,
            created_at,
        ),
    )?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        user_id,
        name: new_category.name,
        category_type: new_category.category_type,
        icon: new_category.icon,
        color: new_category.color,
        is_default: new_category.is_default,
        created_at,
    })
}

/// Retrieve a single category owned by `user_id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the category does not exist or belongs to another user.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "{SELECT_CATEGORY} WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of a user's categories ordered alphabetically by name.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_CATEGORY} WHERE user_id = :user_id ORDER BY name COLLATE NOCASE ASC, id ASC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the categories that can be used for transactions of `kind`,
/// ordered alphabetically by name.
pub fn get_categories_for_kind(
    user_id: UserID,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let categories = get_categories(user_id, connection)?;

    Ok(categories
        .into_iter()
        .filter(|category| category.category_type.allows(kind))
        .collect())
}

/// Update the editable fields of a category. The default flag is left as is.
///
/// Existing expenses and income keep their category even if the new type
/// would not allow it.
///
/// # Errors
///
/// Returns an [Error::UpdateMissingCategory] if the category does not exist
/// or belongs to another user.
pub fn update_category(
    category_id: CategoryId,
    user_id: UserID,
    category: NewCategory,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1, category_type = ?2, icon = ?3, color = ?4
        WHERE id = ?5 AND user_id = ?6",
        (
            category.name.as_ref(),
            category.category_type,
            &category.icon,
            category.color.as_ref(),
            category_id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category, first removing it from any expenses and income that use it.
///
/// # Errors
///
/// Returns an [Error::DeleteMissingCategory] if the category does not exist
/// or belongs to another user. Nothing is changed in that case.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    // Using unchecked_transaction because we only have &Connection from the MutexGuard.
    let transaction = connection.unchecked_transaction()?;

    for kind in TransactionKind::ALL {
        transaction.execute(
            &format!(
                "UPDATE {table} SET category_id = NULL WHERE category_id = ?1 AND user_id = ?2",
                table = kind.table()
            ),
            (category_id, user_id.as_i64()),
        )?;
    }

    let rows_affected = transaction.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        // Dropping the transaction rolls back the updates above.
        return Err(Error::DeleteMissingCategory);
    }

    transaction.commit()?;

    Ok(())
}

/// Count the expenses and income that use each of the user's categories.
pub fn count_transactions_per_category(
    user_id: UserID,
    connection: &Connection,
) -> Result<HashMap<CategoryId, u32>, Error> {
    let result: Result<HashMap<CategoryId, u32>, rusqlite::Error> = connection
        .prepare(
            "SELECT category_id, COUNT(1) FROM (
                SELECT category_id FROM expense WHERE user_id = ?1 AND category_id IS NOT NULL
                UNION ALL
                SELECT category_id FROM income WHERE user_id = ?1 AND category_id IS NOT NULL
            ) GROUP BY category_id",
        )?
        .query_map([user_id.as_i64()], |row| {
            let category_id = row.get(0)?;
            let count = row.get(1)?;

            Ok((category_id, count))
        })?
        .collect();

    result.map_err(Error::from)
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;
    let raw_color: String = row.get(5)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: CategoryName::new_unchecked(&raw_name),
        category_type: row.get::<_, CategoryType>(3)?,
        icon: row.get(4)?,
        color: Color::new_unchecked(&raw_color),
        is_default: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod category_query_tests {
    use crate::{
        Error,
        category::{
            CategoryName, CategoryType, NewCategory, count_transactions_per_category,
            create_category, delete_category, get_categories, get_categories_for_kind,
            get_category, update_category,
        },
        money::Amount,
        test_utils::{create_test_user, get_test_connection_with_user},
        transaction::{Transaction, TransactionKind, create_transaction, get_transaction},
    };

    fn new_category(name: &str, category_type: CategoryType) -> NewCategory {
        NewCategory::new(CategoryName::new_unchecked(name), category_type)
    }

    #[test]
    fn create_category_succeeds() {
        let (connection, user) = get_test_connection_with_user();

        let category = create_category(
            user.id,
            new_category("Groceries", CategoryType::Expense),
            &connection,
        )
        .expect("Could not create category");

        assert!(category.id > 0);
        assert_eq!(category.name.as_ref(), "Groceries");
        assert_eq!(category.icon, "bi-tag");
        assert_eq!(category.color.as_ref(), "#6c757d");
        assert!(!category.is_default);
        let got = get_category(category.id, user.id, &connection).unwrap();
        assert_eq!(got.id, category.id);
        assert_eq!(got.name, category.name);
        assert_eq!(got.category_type, CategoryType::Expense);
    }

    #[test]
    fn get_category_of_other_user_returns_not_found() {
        let (connection, user) = get_test_connection_with_user();
        let other_user = create_test_user("bob", &connection);
        let category = create_category(
            user.id,
            new_category("Groceries", CategoryType::Expense),
            &connection,
        )
        .unwrap();

        let result = get_category(category.id, other_user.id, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_categories_orders_by_name_and_scopes_by_user() {
        let (connection, user) = get_test_connection_with_user();
        let other_user = create_test_user("bob", &connection);
        for name in ["rent", "Bills", "Coffee"] {
            create_category(user.id, new_category(name, CategoryType::Expense), &connection)
                .unwrap();
        }
        create_category(
            other_user.id,
            new_category("Another user's", CategoryType::Expense),
            &connection,
        )
        .unwrap();

        let names = get_categories(user.id, &connection)
            .unwrap()
            .into_iter()
            .map(|category| category.name.to_string())
            .collect::<Vec<_>>();

        assert_eq!(names, ["Bills", "Coffee", "rent"]);
    }

    #[test]
    fn get_categories_for_kind_filters_by_type() {
        let (connection, user) = get_test_connection_with_user();
        create_category(user.id, new_category("Rent", CategoryType::Expense), &connection)
            .unwrap();
        create_category(user.id, new_category("Salary", CategoryType::Income), &connection)
            .unwrap();
        create_category(user.id, new_category("Gifts", CategoryType::Both), &connection).unwrap();

        let names = |kind| {
            get_categories_for_kind(user.id, kind, &connection)
                .unwrap()
                .into_iter()
                .map(|category| category.name.to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(names(TransactionKind::Expense), ["Gifts", "Rent"]);
        assert_eq!(names(TransactionKind::Income), ["Gifts", "Salary"]);
    }

    #[test]
    fn update_category_succeeds() {
        let (connection, user) = get_test_connection_with_user();
        let category =
            create_category(user.id, new_category("Original", CategoryType::Expense), &connection)
                .unwrap();

        update_category(
            category.id,
            user.id,
            new_category("Updated", CategoryType::Both),
            &connection,
        )
        .unwrap();

        let updated = get_category(category.id, user.id, &connection).unwrap();
        assert_eq!(updated.name.as_ref(), "Updated");
        assert_eq!(updated.category_type, CategoryType::Both);
    }

    #[test]
    fn update_category_of_other_user_fails() {
        let (connection, user) = get_test_connection_with_user();
        let other_user = create_test_user("bob", &connection);
        let category =
            create_category(user.id, new_category("Original", CategoryType::Expense), &connection)
                .unwrap();

        let result = update_category(
            category.id,
            other_user.id,
            new_category("Hijacked", CategoryType::Expense),
            &connection,
        );

        assert_eq!(result, Err(Error::UpdateMissingCategory));
        let unchanged = get_category(category.id, user.id, &connection).unwrap();
        assert_eq!(unchanged.name.as_ref(), "Original");
    }

    #[test]
    fn delete_category_clears_references() {
        let (connection, user) = get_test_connection_with_user();
        let category =
            create_category(user.id, new_category("Gifts", CategoryType::Both), &connection)
                .unwrap();
        let expense = create_transaction(
            user.id,
            TransactionKind::Expense,
            Transaction::build("Present", Amount::from_cents(2000), time::macros::date!(2025 - 01 - 05))
                .category(Some(category.id)),
            &connection,
        )
        .unwrap();
        let income = create_transaction(
            user.id,
            TransactionKind::Income,
            Transaction::build("Birthday money", Amount::from_cents(5000), time::macros::date!(2025 - 01 - 06))
                .category(Some(category.id)),
            &connection,
        )
        .unwrap();

        delete_category(category.id, user.id, &connection).unwrap();

        assert_eq!(
            get_category(category.id, user.id, &connection),
            Err(Error::NotFound)
        );
        let expense = get_transaction(expense.id, user.id, TransactionKind::Expense, &connection)
            .unwrap();
        let income =
            get_transaction(income.id, user.id, TransactionKind::Income, &connection).unwrap();
        assert_eq!(expense.category, None);
        assert_eq!(income.category, None);
    }

    #[test]
    fn delete_category_of_other_user_fails() {
        let (connection, user) = get_test_connection_with_user();
        let other_user = create_test_user("bob", &connection);
        let category =
            create_category(user.id, new_category("Gifts", CategoryType::Both), &connection)
                .unwrap();

        let result = delete_category(category.id, other_user.id, &connection);

        assert_eq!(result, Err(Error::DeleteMissingCategory));
        assert!(get_category(category.id, user.id, &connection).is_ok());
    }

    #[test]
    fn counts_transactions_across_kinds() {
        let (connection, user) = get_test_connection_with_user();
        let category =
            create_category(user.id, new_category("Gifts", CategoryType::Both), &connection)
                .unwrap();
        for kind in TransactionKind::ALL {
            create_transaction(
                user.id,
                kind,
                Transaction::build("Gift", Amount::from_cents(500), time::macros::date!(2025 - 01 - 05))
                    .category(Some(category.id)),
                &connection,
            )
            .unwrap();
        }

        let counts = count_transactions_per_category(user.id, &connection).unwrap();

        assert_eq!(counts.get(&category.id), Some(&2));
    }
}
