//! The endpoints for deleting expenses and income.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    transaction::{TransactionId, TransactionKind, delete_transaction},
};

/// The state needed to delete an expense or income.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete an expense, responds with an alert.
pub async fn delete_expense_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<TransactionId>,
) -> Response {
    delete_transaction_endpoint(TransactionKind::Expense, &state, user_id, expense_id)
}

/// Delete an income record, responds with an alert.
pub async fn delete_income_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(income_id): Path<TransactionId>,
) -> Response {
    delete_transaction_endpoint(TransactionKind::Income, &state, user_id, income_id)
}

fn delete_transaction_endpoint(
    kind: TransactionKind,
    state: &DeleteTransactionState,
    user_id: UserID,
    id: TransactionId,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_transaction(id, user_id, kind, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: format!("Deleted the {}", kind.singular()),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("Could not delete {} {id}: {error}", kind.singular());
            error.into_alert_response()
        }
    }
}
