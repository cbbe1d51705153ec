//! Dashboard module
//!
//! Provides an overview page with the user's total income, expenses and
//! balance, monthly and per-category charts, and their latest records.

mod aggregation;
mod cards;
mod charts;
mod handlers;
mod tables;

pub use aggregation::{DEFAULT_CHART_WINDOW_DAYS, MAX_CHART_WINDOW_DAYS};
pub use handlers::get_dashboard_page;
