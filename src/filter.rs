//! Searching and filtering a user's expenses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    auth::UserID,
    category::CategoryId,
    money::{AMOUNT_SCALE, parse_decimal},
    store::{DateRange, LedgerStore, TransactionQuery},
    transaction::{Transaction, TransactionKind},
};

/// The format of dates in forms and query strings, e.g. "2025-01-31".
pub(crate) const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Which expenses to show. Every field is optional and the filters combine
/// with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    /// Case-insensitive text to find in the title or description.
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
    pub amount_min: Option<Decimal>,
    pub amount_max: Option<Decimal>,
}

impl ExpenseFilter {
    /// Whether any filter is set.
    pub fn is_active(&self) -> bool {
        self.search
            .as_deref()
            .is_some_and(|search| !search.trim().is_empty())
            || self.category_id.is_some()
            || self.date_from.is_some()
            || self.date_to.is_some()
            || self.amount_min.is_some()
            || self.amount_max.is_some()
    }

    /// Check the filter and turn it into a store query.
    fn to_query(&self) -> Result<TransactionQuery, Error> {
        if self.amount_min.is_some_and(|min| min.is_sign_negative()) {
            return Err(Error::InvalidFilter("amount_min".to_owned()));
        }

        if self.amount_max.is_some_and(|max| max.is_sign_negative()) {
            return Err(Error::InvalidFilter("amount_max".to_owned()));
        }

        let date_range = DateRange::new(self.date_from, self.date_to)?;

        if let (Some(min), Some(max)) = (self.amount_min, self.amount_max) {
            if min > max {
                return Err(Error::InvalidAmountRange(min.to_string(), max.to_string()));
            }
        }

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
            .map(str::to_owned);

        Ok(TransactionQuery {
            search,
            category_id: self.category_id,
            date_range,
            amount_min: self.amount_min,
            amount_max: self.amount_max,
            limit: None,
        })
    }
}

/// The expenses matching a filter and the sum of their amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredExpenses {
    /// The matching expenses, newest first.
    pub expenses: Vec<Transaction>,
    /// The sum of the amounts of all matching expenses, zero if there are none.
    pub total: Decimal,
}

/// Get the user's expenses matching `filter`.
///
/// # Errors
///
/// Returns, before querying the store:
/// - [Error::InvalidFilter] if an amount bound is negative,
/// - [Error::InvalidDateRange] if `date_from` is after `date_to`,
/// - [Error::InvalidAmountRange] if `amount_min` is greater than `amount_max`.
pub fn filter_expenses(
    store: &impl LedgerStore,
    user_id: UserID,
    filter: &ExpenseFilter,
) -> Result<FilteredExpenses, Error> {
    let query = filter.to_query()?;
    let expenses = store.query_transactions(user_id, TransactionKind::Expense, &query)?;
    let total = expenses
        .iter()
        .map(|expense| expense.amount.as_decimal())
        .sum();

    Ok(FilteredExpenses { expenses, total })
}

/// The filter fields of the expenses page as they appear in the query string.
///
/// Empty values mean the filter is not set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ExpenseFilterQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub amount_min: Option<String>,
    pub amount_max: Option<String>,
    pub page: Option<u64>,
}

impl ExpenseFilterQuery {
    /// Parse the raw query string values.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidFilter] naming the first field that is not a
    /// valid date, amount or category ID.
    pub fn parse(&self) -> Result<ExpenseFilter, Error> {
        Ok(ExpenseFilter {
            search: non_empty(&self.search).map(str::to_owned),
            category_id: parse_field(&self.category, "category", |text| text.parse().ok())?,
            date_from: parse_field(&self.date_from, "date_from", parse_date)?,
            date_to: parse_field(&self.date_to, "date_to", parse_date)?,
            amount_min: parse_field(&self.amount_min, "amount_min", parse_amount_bound)?,
            amount_max: parse_field(&self.amount_max, "amount_max", parse_amount_bound)?,
        })
    }

    /// The query string for `page` with the same filters.
    pub fn with_page(&self, page: u64) -> String {
        let query = Self {
            page: Some(page),
            ..self.clone()
        };

        serde_urlencoded::to_string(&query).unwrap_or_else(|error| {
            tracing::error!("could not encode the expense filters: {error}");
            format!("page={page}")
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn parse_field<T>(
    value: &Option<String>,
    field: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, Error> {
    match non_empty(value) {
        None => Ok(None),
        Some(text) => parse(text)
            .map(Some)
            .ok_or_else(|| Error::InvalidFilter(field.to_owned())),
    }
}

pub(crate) fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), DATE_FORMAT).ok()
}

/// Parse an optional date from a query string, where an empty value means no date.
///
/// # Errors
///
/// Returns an [Error::InvalidFilter] naming `field` if the value is not a date.
pub(crate) fn parse_optional_date(
    value: &Option<String>,
    field: &str,
) -> Result<Option<Date>, Error> {
    parse_field(value, field, parse_date)
}

fn parse_amount_bound(text: &str) -> Option<Decimal> {
    parse_decimal(text).filter(|amount| amount.normalize().scale() <= AMOUNT_SCALE)
}
