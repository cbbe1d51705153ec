//! The query interface the summary, filter and aggregation code reads
//! expenses and income through.
//!
//! [LedgerStore] is implemented for [rusqlite::Connection] for the web app
//! and by an in-memory store in tests.

mod sqlite;

#[cfg(test)]
mod memory;

#[cfg(test)]
pub use memory::InMemoryStore;

use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryId, Color, NewCategory},
    transaction::{Transaction, TransactionKind},
};

/// An inclusive range of dates where either end may be left open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

impl DateRange {
    /// A range with both ends open, i.e. all dates.
    pub const ALL: DateRange = DateRange {
        start: None,
        end: None,
    };

    /// Create a range from optional bounds.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidDateRange] if `start` is after `end`.
    pub fn new(start: Option<Date>, end: Option<Date>) -> Result<Self, Error> {
        let range = Self { start, end };
        range.validate()?;

        Ok(range)
    }

    /// Check that the start of the range is not after its end.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidDateRange] if `start` is after `end`.
    pub fn validate(&self) -> Result<(), Error> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => Err(Error::InvalidDateRange(start, end)),
            _ => Ok(()),
        }
    }

    /// Whether `date` lies within the range.
    pub fn contains(&self, date: Date) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// Predicates for selecting expenses or income. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    /// Case-insensitive text that must appear in the title or description.
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    pub date_range: DateRange,
    /// Inclusive lower bound on the amount.
    pub amount_min: Option<Decimal>,
    /// Inclusive upper bound on the amount.
    pub amount_max: Option<Decimal>,
    /// The maximum number of rows to return.
    pub limit: Option<u32>,
}

impl TransactionQuery {
    /// A query that only restricts the date range.
    pub fn in_range(date_range: DateRange) -> Self {
        Self {
            date_range,
            ..Default::default()
        }
    }
}

/// The sum of a user's expenses or income in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotalRow {
    /// The category, or `None` for transactions without one.
    pub category_id: Option<CategoryId>,
    /// The category name, `None` for uncategorized transactions.
    pub name: Option<String>,
    /// The category color, `None` for uncategorized transactions.
    pub color: Option<Color>,
    pub total: Decimal,
}

/// Typed queries over a user's categories, expenses and income.
///
/// Every method takes the owning user explicitly and never returns rows of
/// another user.
pub trait LedgerStore {
    /// The transactions of `kind` matching every predicate in `query`, newest first.
    fn query_transactions(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, Error>;

    /// The sum of the amounts of the transactions matching `query`, ignoring
    /// its limit. Zero if nothing matches.
    fn sum_amounts(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        query: &TransactionQuery,
    ) -> Result<Decimal, Error>;

    /// Totals per month in `range`, keyed by the first day of the month and in
    /// ascending order. Months without transactions are left out.
    fn sum_by_month(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        range: DateRange,
    ) -> Result<Vec<(Date, Decimal)>, Error>;

    /// Totals per category in `range`, in no particular order.
    fn sum_by_category(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        range: DateRange,
    ) -> Result<Vec<CategoryTotalRow>, Error>;

    /// The names of all of the user's categories.
    fn category_names(&self, user_id: UserID) -> Result<Vec<String>, Error>;

    /// Add a category for the user.
    fn insert_category(&self, user_id: UserID, category: NewCategory) -> Result<Category, Error>;
}
