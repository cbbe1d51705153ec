//! The pages and endpoints for recording new expenses and income.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    Error,
    auth::UserID,
    category::get_categories_for_kind,
    html::{base, dark_mode_script},
    profile::get_or_create_profile,
    timezone::get_local_date,
    transaction::{
        TransactionKind, create_transaction,
        form::{TransactionForm, TransactionFormState, transaction_form_page, transaction_form_view},
    },
};

/// Display the page for recording a new expense.
pub async fn get_new_expense_page(
    State(state): State<TransactionFormState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    new_transaction_page(TransactionKind::Expense, &state, user_id)
}

/// Display the page for recording new income.
pub async fn get_new_income_page(
    State(state): State<TransactionFormState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    new_transaction_page(TransactionKind::Income, &state, user_id)
}

fn new_transaction_page(
    kind: TransactionKind,
    state: &TransactionFormState,
    user_id: UserID,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let today = get_local_date(&state.local_timezone)?;
    let categories = get_categories_for_kind(user_id, kind, &connection)?;
    let profile = get_or_create_profile(user_id, &connection)?;

    let form = TransactionForm {
        date: today.to_string(),
        ..Default::default()
    };
    let heading = format!("New {}", kind.singular());
    let content = transaction_form_page(
        kind,
        &heading,
        transaction_form_view(kind, kind.create_api(), "hx-post", &form, &categories, None),
    );

    Ok(base(&heading, &[dark_mode_script(profile.dark_mode)], &content).into_response())
}

/// Create an expense and redirect to the expenses page.
///
/// Invalid input is shown in the returned form.
pub async fn create_expense_endpoint(
    State(state): State<TransactionFormState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    create_transaction_endpoint(TransactionKind::Expense, &state, user_id, form)
}

/// Create an income record and redirect to the income page.
///
/// Invalid input is shown in the returned form.
pub async fn create_income_endpoint(
    State(state): State<TransactionFormState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    create_transaction_endpoint(TransactionKind::Income, &state, user_id, form)
}

fn create_transaction_endpoint(
    kind: TransactionKind,
    state: &TransactionFormState,
    user_id: UserID,
    form: TransactionForm,
) -> Response {
    let today = match get_local_date(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = form
        .validate(today)
        .and_then(|builder| create_transaction(user_id, kind, builder, &connection));

    match result {
        Ok(transaction) => {
            tracing::debug!("Created {} {}", kind.singular(), transaction.id);
            (
                HxRedirect(kind.list_view().to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) if error.is_validation_error() => {
            form_with_error(kind, user_id, &form, &error, &connection)
        }
        Err(error) => {
            tracing::error!("Could not create {}: {error}", kind.singular());
            error.into_alert_response()
        }
    }
}

/// Render the create form again with the user's input and an error message.
fn form_with_error(
    kind: TransactionKind,
    user_id: UserID,
    form: &TransactionForm,
    error: &Error,
    connection: &Connection,
) -> Response {
    match get_categories_for_kind(user_id, kind, connection) {
        Ok(categories) => transaction_form_view(
            kind,
            kind.create_api(),
            "hx-post",
            form,
            &categories,
            Some(&format!("Error: {error}")),
        )
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod create_transaction_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        auth::User,
        category::{CategoryName, CategoryType, NewCategory, create_category},
        endpoints,
        store::{LedgerStore, TransactionQuery},
        test_utils::{
            assert_form_error_message, assert_form_input, assert_hx_endpoint, assert_hx_redirect,
            assert_status_ok, assert_valid_html, get_test_connection_with_user, must_get_form,
            parse_html_document, parse_html_fragment,
        },
        transaction::{
            TransactionKind,
            form::{TransactionForm, TransactionFormState},
        },
    };

    use super::{create_expense_endpoint, create_income_endpoint, get_new_expense_page};

    fn get_state() -> (TransactionFormState, User) {
        let (connection, user) = get_test_connection_with_user();

        (
            TransactionFormState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user,
        )
    }

    fn form(title: &str, amount: &str) -> TransactionForm {
        TransactionForm {
            title: title.to_owned(),
            amount: amount.to_owned(),
            date: "2025-01-05".to_owned(),
            category_id: None,
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn new_expense_page_has_form() {
        let (state, user) = get_state();

        let response = get_new_expense_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::EXPENSES_API, "hx-post");
        assert_form_input(&form, "title", "text");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "date", "date");
    }

    #[tokio::test]
    async fn creates_expense_and_redirects() {
        let (state, user) = get_state();

        let response = create_expense_endpoint(
            State(state.clone()),
            Extension(user.id),
            Form(form("Groceries", "45.20")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::EXPENSES_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let expenses = connection
            .query_transactions(user.id, TransactionKind::Expense, &TransactionQuery::default())
            .unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].title, "Groceries");
        assert_eq!(expenses[0].amount.as_decimal(), Decimal::new(4520, 2));
        assert_eq!(expenses[0].date, date!(2025 - 01 - 05));
    }

    #[tokio::test]
    async fn creates_income_and_redirects() {
        let (state, user) = get_state();

        let response = create_income_endpoint(
            State(state.clone()),
            Extension(user.id),
            Form(form("Salary", "1000")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::INCOME_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let expenses = connection
            .query_transactions(user.id, TransactionKind::Expense, &TransactionQuery::default())
            .unwrap();
        assert!(expenses.is_empty());
    }

    #[tokio::test]
    async fn zero_amount_is_shown_in_form() {
        let (state, user) = get_state();

        let response = create_expense_endpoint(
            State(state.clone()),
            Extension(user.id),
            Form(form("Groceries", "0")),
        )
        .await;

        assert_status_ok(&response);
        let fragment = parse_html_fragment(response).await;
        let form = must_get_form(&fragment);
        assert_form_error_message(&form, "Error: Amount must be greater than zero.");
        let connection = state.db_connection.lock().unwrap();
        let expenses = connection
            .query_transactions(user.id, TransactionKind::Expense, &TransactionQuery::default())
            .unwrap();
        assert!(expenses.is_empty());
    }

    #[tokio::test]
    async fn income_category_is_rejected_for_expense() {
        let (state, user) = get_state();
        let salary = {
            let connection = state.db_connection.lock().unwrap();
            create_category(
                user.id,
                NewCategory::new(CategoryName::new_unchecked("Salary"), CategoryType::Income),
                &connection,
            )
            .unwrap()
        };
        let form = TransactionForm {
            category_id: Some(salary.id),
            ..form("Groceries", "10")
        };

        let response = create_expense_endpoint(State(state), Extension(user.id), Form(form)).await;

        assert_status_ok(&response);
        let fragment = parse_html_fragment(response).await;
        let form = must_get_form(&fragment);
        assert_form_error_message(
            &form,
            "Error: the category \"Salary\" cannot be used for expenses",
        );
    }
}
