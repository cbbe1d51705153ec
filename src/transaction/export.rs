//! Downloading a user's expenses or income as a CSV file.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::{UtcOffset, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    auth::UserID,
    filter::DATE_FORMAT,
    store::{LedgerStore, TransactionQuery},
    timezone::get_local_offset,
    transaction::{Transaction, TransactionKind},
};

const CREATED_AT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

const CSV_HEADER: [&str; 6] = [
    "Title",
    "Amount",
    "Category",
    "Date",
    "Description",
    "Created At",
];

/// The state needed to export expenses and income.
#[derive(Debug, Clone)]
pub struct ExportState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Download all of the user's expenses as "expenses.csv".
pub async fn export_expenses(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    export_transactions(TransactionKind::Expense, &state, user_id)
}

/// Download all of the user's income as "income.csv".
pub async fn export_income(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    export_transactions(TransactionKind::Income, &state, user_id)
}

fn export_transactions(
    kind: TransactionKind,
    state: &ExportState,
    user_id: UserID,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        connection.query_transactions(user_id, kind, &TransactionQuery::default())?
    };

    let csv = write_csv(&transactions, local_offset)
        .inspect_err(|error| tracing::error!("Could not export {}: {error}", kind.plural()))?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.csv\"", kind.plural()),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Write `transactions` as CSV with a header row, in the order given.
///
/// Creation times are shown in `local_offset`.
fn write_csv(transactions: &[Transaction], local_offset: UtcOffset) -> Result<String, Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .map_err(|error| Error::CsvError(error.to_string()))?;

    for transaction in transactions {
        let category = transaction
            .category
            .as_ref()
            .map(|category| category.name.as_str())
            .unwrap_or_default();
        let date = transaction
            .date
            .format(DATE_FORMAT)
            .map_err(|error| Error::CsvError(error.to_string()))?;
        let created_at = transaction
            .created_at
            .to_offset(local_offset)
            .format(CREATED_AT_FORMAT)
            .map_err(|error| Error::CsvError(error.to_string()))?;

        let amount = transaction.amount.to_string();

        writer
            .write_record([
                transaction.title.as_str(),
                amount.as_str(),
                category,
                date.as_str(),
                transaction.description.as_str(),
                created_at.as_str(),
            ])
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvError(error.to_string()))
}
