//! Totals of a user's income and expenses.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    Error,
    auth::UserID,
    store::{DateRange, LedgerStore, TransactionQuery},
    transaction::TransactionKind,
};

/// A user's total income and expenses over a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FinancialSummary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    /// Income minus expenses, negative if the user spent more than they earned.
    pub balance: Decimal,
}

/// Sum the user's income and expenses in `range`.
///
/// # Errors
///
/// Returns an [Error::InvalidDateRange] if the range starts after it ends,
/// without querying the store.
pub fn get_financial_summary(
    store: &impl LedgerStore,
    user_id: UserID,
    range: DateRange,
) -> Result<FinancialSummary, Error> {
    range.validate()?;

    let query = TransactionQuery::in_range(range);
    let total_income = store.sum_amounts(user_id, TransactionKind::Income, &query)?;
    let total_expenses = store.sum_amounts(user_id, TransactionKind::Expense, &query)?;

    Ok(FinancialSummary {
        total_income,
        total_expenses,
        balance: total_income - total_expenses,
    })
}
