//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The route handler for displaying the dashboard
//! - HTML view functions for rendering the dashboard UI
//! - State and query types used by the handler

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::{
        aggregation::{category_breakdown, monthly_series},
        cards::summary_cards_view,
        charts::{DashboardChart, category_chart, charts_script, charts_view, monthly_chart},
        tables::{RECENT_TRANSACTION_COUNT, recent_transactions_table},
    },
    endpoints,
    filter::parse_optional_date,
    html::{
        BUTTON_SECONDARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        HeadElement, LINK_STYLE, base, dark_mode_script,
    },
    navigation::NavBar,
    profile::get_or_create_profile,
    store::{DateRange, LedgerStore, TransactionQuery},
    summary::{FinancialSummary, get_financial_summary},
    timezone::get_local_date,
    transaction::{Transaction, TransactionKind},
};

/// The state needed for displaying the dashboard page.
///
/// Contains the database connection, timezone and chart settings required
/// by the dashboard handler.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading expenses and income.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// How many days back the monthly chart goes.
    pub chart_window_days: i64,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            chart_window_days: state.chart_window_days,
        }
    }
}

/// The optional date range of the dashboard summary and category breakdown.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl DashboardQuery {
    fn date_range(&self) -> Result<DateRange, Error> {
        DateRange::new(
            parse_optional_date(&self.date_from, "date_from")?,
            parse_optional_date(&self.date_to, "date_to")?,
        )
    }
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    summary: FinancialSummary,
    charts: [DashboardChart; 2],
    recent_expenses: Vec<Transaction>,
    recent_income: Vec<Transaction>,
}

/// Display a page with an overview of the user's income and expenses.
///
/// An invalid date range is reported on the page and the totals are shown
/// for all dates instead.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let today = get_local_date(&state.local_timezone)?;

    let (range, range_error) = match query.date_range() {
        Ok(range) => (range, None),
        Err(error) => (DateRange::ALL, Some(format!("Error: {error}"))),
    };

    let profile = get_or_create_profile(user_id, &connection)?;
    let data = build_dashboard_data(
        &*connection,
        user_id,
        today,
        state.chart_window_days,
        range,
        &profile.currency,
    )
    .inspect_err(|error| tracing::error!("Could not build the dashboard: {error}"))?;

    let content = dashboard_view(&data, &query, range_error.as_deref(), &profile.currency);
    let scripts = [
        dark_mode_script(profile.dark_mode),
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(&data.charts),
    ];

    Ok(base("Dashboard", &scripts, &content).into_response())
}

/// Fetches and builds all data needed for the dashboard display.
///
/// # Errors
/// Returns an error if the store could not be queried.
fn build_dashboard_data(
    store: &impl LedgerStore,
    user_id: UserID,
    today: Date,
    chart_window_days: i64,
    range: DateRange,
    currency: &str,
) -> Result<DashboardData, Error> {
    let summary = get_financial_summary(store, user_id, range)?;
    let months = monthly_series(store, user_id, today, chart_window_days)?;
    let breakdown = category_breakdown(store, user_id, range)?;

    let recent = TransactionQuery {
        limit: Some(RECENT_TRANSACTION_COUNT),
        ..Default::default()
    };
    let recent_expenses = store.query_transactions(user_id, TransactionKind::Expense, &recent)?;
    let recent_income = store.query_transactions(user_id, TransactionKind::Income, &recent)?;

    let charts = [
        DashboardChart {
            id: "monthly-chart",
            options: monthly_chart(&months, chart_window_days, currency).to_string(),
        },
        DashboardChart {
            id: "category-chart",
            options: category_chart(&breakdown, currency).to_string(),
        },
    ];

    Ok(DashboardData {
        summary,
        charts,
        recent_expenses,
        recent_income,
    })
}

fn date_range_form(query: &DashboardQuery, error_message: Option<&str>) -> Markup {
    let date_input = |name: &str, label: &str, value: &Option<String>| {
        html! {
            div
            {
                label for=(name) class=(FORM_LABEL_STYLE) { (label) }
                input
                    type="date"
                    name=(name)
                    id=(name)
                    value=(value.as_deref().unwrap_or_default())
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    };

    html! {
        form
            method="get"
            action=(endpoints::DASHBOARD_VIEW)
            class="w-full flex flex-wrap items-end gap-4 mb-4"
        {
            (date_input("date_from", "From", &query.date_from))
            (date_input("date_to", "To", &query.date_to))

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Apply" }
            a href=(endpoints::DASHBOARD_VIEW) class=(LINK_STYLE) { "Clear" }

            @if let Some(error_message) = error_message {
                p class={ "w-full " (FORM_ERROR_STYLE) } { (error_message) }
            }
        }
    }
}

fn dashboard_view(
    data: &DashboardData,
    query: &DashboardQuery,
    range_error: Option<&str>,
    currency: &str,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (date_range_form(query, range_error))
            (summary_cards_view(&data.summary, currency))
            (charts_view(&data.charts))

            section class="w-full grid grid-cols-1 xl:grid-cols-2 gap-4 mb-8"
            {
                (recent_transactions_table(TransactionKind::Expense, &data.recent_expenses, currency))
                (recent_transactions_table(TransactionKind::Income, &data.recent_income, currency))
            }
        }
    )
}
