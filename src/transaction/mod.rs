//! Expense and income management.
//!
//! This module contains everything related to expenses and income:
//! - The `Transaction` model and `TransactionBuilder` for creating them
//! - Database functions for storing and managing them per user
//! - The pages and endpoints for listing, creating, editing, deleting and
//!   exporting them

mod core;
mod create;
mod delete;
mod edit;
mod export;
mod form;
mod list;

pub use core::{
    CategorySummary, MAX_TITLE_LENGTH, Transaction, TransactionBuilder, TransactionId,
    TransactionKind, create_transaction, create_transaction_tables, delete_transaction,
    get_transaction, update_transaction,
};
pub(crate) use core::{DEFAULT_ORDER, map_transaction_row, select_transactions};
pub use create::{
    create_expense_endpoint, create_income_endpoint, get_new_expense_page, get_new_income_page,
};
pub use delete::{delete_expense_endpoint, delete_income_endpoint};
pub use edit::{
    get_edit_expense_page, get_edit_income_page, update_expense_endpoint, update_income_endpoint,
};
pub use export::{export_expenses, export_income};
pub use list::{get_expenses_page, get_income_page};
