//! An in-memory [LedgerStore] for testing code that only needs the store
//! interface.

use std::{cell::RefCell, collections::BTreeMap};

use rust_decimal::Decimal;
use time::{Date, Duration, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryId, CategoryName, CategoryType, NewCategory},
    money::Amount,
    store::{CategoryTotalRow, DateRange, LedgerStore, TransactionQuery},
    transaction::{CategorySummary, Transaction, TransactionId, TransactionKind},
};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    categories: RefCell<Vec<Category>>,
    transactions: RefCell<Vec<(TransactionKind, Transaction)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category with default icon and color and return its ID.
    pub fn add_category(
        &self,
        user_id: UserID,
        name: &str,
        category_type: CategoryType,
    ) -> CategoryId {
        self.insert_category(
            user_id,
            NewCategory::new(CategoryName::new_unchecked(name), category_type),
        )
        .map(|category| category.id)
        .expect("inserting into the in-memory store cannot fail")
    }

    /// Add an expense or income without any validation.
    pub fn add_transaction(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        title: &str,
        amount: Amount,
        date: Date,
        category_id: Option<CategoryId>,
    ) -> TransactionId {
        let category = category_id.map(|id| {
            let categories = self.categories.borrow();
            let category = categories
                .iter()
                .find(|category| category.id == id)
                .expect("category should be added to the store first");

            CategorySummary {
                id,
                name: category.name.to_string(),
                color: category.color.clone(),
            }
        });

        let mut transactions = self.transactions.borrow_mut();
        let id = transactions.len() as TransactionId + 1;
        // Later rows get later timestamps so the default order is deterministic.
        let created_at = OffsetDateTime::UNIX_EPOCH + Duration::seconds(id);

        transactions.push((
            kind,
            Transaction {
                id,
                user_id,
                title: title.to_owned(),
                amount,
                category,
                date,
                description: String::new(),
                created_at,
                updated_at: created_at,
            },
        ));

        id
    }

    /// Rename a category, as a user would on the categories page.
    pub fn rename_category(&self, category_id: CategoryId, name: &str) {
        for category in self.categories.borrow_mut().iter_mut() {
            if category.id == category_id {
                category.name = CategoryName::new_unchecked(name);
            }
        }
    }

    /// All categories of the user, in insertion order.
    pub fn categories(&self, user_id: UserID) -> Vec<Category> {
        self.categories
            .borrow()
            .iter()
            .filter(|category| category.user_id == user_id)
            .cloned()
            .collect()
    }

    fn matching(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        query: &TransactionQuery,
    ) -> Vec<Transaction> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
            .map(str::to_ascii_lowercase);

        let mut matches: Vec<Transaction> = self
            .transactions
            .borrow()
            .iter()
            .filter(|(row_kind, row)| *row_kind == kind && row.user_id == user_id)
            .map(|(_, row)| row)
            .filter(|row| {
                search.as_ref().is_none_or(|search| {
                    row.title.to_ascii_lowercase().contains(search)
                        || row.description.to_ascii_lowercase().contains(search)
                })
            })
            .filter(|row| {
                query.category_id.is_none_or(|id| {
                    row.category.as_ref().is_some_and(|category| category.id == id)
                })
            })
            .filter(|row| query.date_range.contains(row.date))
            .filter(|row| {
                query
                    .amount_min
                    .is_none_or(|min| row.amount.as_decimal() >= min)
            })
            .filter(|row| {
                query
                    .amount_max
                    .is_none_or(|max| row.amount.as_decimal() <= max)
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });

        matches
    }
}

impl LedgerStore for InMemoryStore {
    fn query_transactions(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, Error> {
        let mut matches = self.matching(user_id, kind, query);

        if let Some(limit) = query.limit {
            matches.truncate(limit as usize);
        }

        Ok(matches)
    }

    fn sum_amounts(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        query: &TransactionQuery,
    ) -> Result<Decimal, Error> {
        Ok(self
            .matching(user_id, kind, query)
            .iter()
            .map(|row| row.amount.as_decimal())
            .sum())
    }

    fn sum_by_month(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        range: DateRange,
    ) -> Result<Vec<(Date, Decimal)>, Error> {
        let mut totals = BTreeMap::new();

        for row in self.matching(user_id, kind, &TransactionQuery::in_range(range)) {
            let month = row.date.replace_day(1).expect("every month has a first day");
            *totals.entry(month).or_insert(Decimal::ZERO) += row.amount.as_decimal();
        }

        Ok(totals.into_iter().collect())
    }

    fn sum_by_category(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        range: DateRange,
    ) -> Result<Vec<CategoryTotalRow>, Error> {
        let mut totals: BTreeMap<Option<CategoryId>, CategoryTotalRow> = BTreeMap::new();

        for row in self.matching(user_id, kind, &TransactionQuery::in_range(range)) {
            let category_id = row.category.as_ref().map(|category| category.id);
            let entry = totals.entry(category_id).or_insert_with(|| CategoryTotalRow {
                category_id,
                name: row.category.as_ref().map(|category| category.name.clone()),
                color: row.category.as_ref().map(|category| category.color.clone()),
                total: Decimal::ZERO,
            });
            entry.total += row.amount.as_decimal();
        }

        Ok(totals.into_values().collect())
    }

    fn category_names(&self, user_id: UserID) -> Result<Vec<String>, Error> {
        Ok(self
            .categories(user_id)
            .into_iter()
            .map(|category| category.name.to_string())
            .collect())
    }

    fn insert_category(&self, user_id: UserID, category: NewCategory) -> Result<Category, Error> {
        let mut categories = self.categories.borrow_mut();
        let category = Category {
            id: categories.len() as CategoryId + 1,
            user_id,
            name: category.name,
            category_type: category.category_type,
            icon: category.icon,
            color: category.color,
            is_default: category.is_default,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        categories.push(category.clone());

        Ok(category)
    }
}
