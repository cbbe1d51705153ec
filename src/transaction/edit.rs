//! The pages and endpoints for changing existing expenses and income.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;

use crate::{
    Error,
    auth::UserID,
    category::get_categories_for_kind,
    html::{base, dark_mode_script},
    profile::get_or_create_profile,
    timezone::get_local_date,
    transaction::{
        TransactionId, TransactionKind, get_transaction, update_transaction,
        form::{TransactionForm, TransactionFormState, transaction_form_page, transaction_form_view},
    },
};

/// Display the page for editing an expense.
pub async fn get_edit_expense_page(
    State(state): State<TransactionFormState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<TransactionId>,
) -> Result<Response, Error> {
    edit_transaction_page(TransactionKind::Expense, &state, user_id, expense_id)
}

/// Display the page for editing an income record.
pub async fn get_edit_income_page(
    State(state): State<TransactionFormState>,
    Extension(user_id): Extension<UserID>,
    Path(income_id): Path<TransactionId>,
) -> Result<Response, Error> {
    edit_transaction_page(TransactionKind::Income, &state, user_id, income_id)
}

fn edit_transaction_page(
    kind: TransactionKind,
    state: &TransactionFormState,
    user_id: UserID,
    id: TransactionId,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(id, user_id, kind, &connection)?;
    let categories = get_categories_for_kind(user_id, kind, &connection)?;
    let profile = get_or_create_profile(user_id, &connection)?;

    let form = TransactionForm::from_transaction(&transaction);
    let heading = format!("Edit {}", kind.singular());
    let content = transaction_form_page(
        kind,
        &heading,
        transaction_form_view(kind, &kind.item_api(id), "hx-put", &form, &categories, None),
    );

    Ok(base(&heading, &[dark_mode_script(profile.dark_mode)], &content).into_response())
}

/// Update an expense and redirect to the expenses page.
pub async fn update_expense_endpoint(
    State(state): State<TransactionFormState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<TransactionId>,
    Form(form): Form<TransactionForm>,
) -> Response {
    update_transaction_endpoint(TransactionKind::Expense, &state, user_id, expense_id, form)
}

/// Update an income record and redirect to the income page.
pub async fn update_income_endpoint(
    State(state): State<TransactionFormState>,
    Extension(user_id): Extension<UserID>,
    Path(income_id): Path<TransactionId>,
    Form(form): Form<TransactionForm>,
) -> Response {
    update_transaction_endpoint(TransactionKind::Income, &state, user_id, income_id, form)
}

fn update_transaction_endpoint(
    kind: TransactionKind,
    state: &TransactionFormState,
    user_id: UserID,
    id: TransactionId,
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
        .and_then(|builder| update_transaction(id, user_id, kind, builder, &connection));

    match result {
        Ok(()) => (
            HxRedirect(kind.list_view().to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) if error.is_validation_error() => {
            match get_categories_for_kind(user_id, kind, &connection) {
                Ok(categories) => transaction_form_view(
                    kind,
                    &kind.item_api(id),
                    "hx-put",
                    &form,
                    &categories,
                    Some(&format!("Error: {error}")),
                )
                .into_response(),
                Err(error) => error.into_alert_response(),
            }
        }
        Err(error) => {
            tracing::error!("Could not update {} {id}: {error}", kind.singular());
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod edit_transaction_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        Error,
        auth::User,
        money::Amount,
        test_utils::{
            assert_form_error_message, assert_form_input_with_value, assert_hx_endpoint,
            assert_hx_redirect, assert_status_ok, assert_valid_html, create_test_user,
            get_test_connection_with_user, must_get_form, parse_html_document,
            parse_html_fragment,
        },
        transaction::{
            Transaction, TransactionKind, create_transaction,
            form::{TransactionForm, TransactionFormState},
            get_transaction,
        },
    };

    use super::{get_edit_expense_page, get_edit_income_page, update_expense_endpoint};

    fn get_state() -> (TransactionFormState, User, Transaction) {
        let (connection, user) = get_test_connection_with_user();
        let expense = create_transaction(
            user.id,
            TransactionKind::Expense,
            Transaction::build("Lunch", Amount::from_cents(1250), date!(2025 - 01 - 05))
                .description("Sushi"),
            &connection,
        )
        .unwrap();

        (
            TransactionFormState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user,
            expense,
        )
    }

    #[tokio::test]
    async fn edit_page_is_filled_in() {
        let (state, user, expense) = get_state();

        let response = get_edit_expense_page(State(state), Extension(user.id), Path(expense.id))
            .await
            .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(
            &form,
            &TransactionKind::Expense.item_api(expense.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "title", "text", "Lunch");
        assert_form_input_with_value(&form, "amount", "number", "12.50");
        assert_form_input_with_value(&form, "date", "date", "2025-01-05");
    }

    #[tokio::test]
    async fn expense_id_is_not_found_as_income() {
        let (state, user, expense) = get_state();

        let result =
            get_edit_income_page(State(state), Extension(user.id), Path(expense.id)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[tokio::test]
    async fn updates_expense_and_redirects() {
        let (state, user, expense) = get_state();
        let form = TransactionForm {
            title: "Dinner".to_owned(),
            amount: "30".to_owned(),
            date: "2025-01-06".to_owned(),
            category_id: None,
            description: String::new(),
        };

        let response = update_expense_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(expense.id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, TransactionKind::Expense.list_view());
        let connection = state.db_connection.lock().unwrap();
        let updated =
            get_transaction(expense.id, user.id, TransactionKind::Expense, &connection).unwrap();
        assert_eq!(updated.title, "Dinner");
        assert_eq!(updated.amount.as_decimal(), Decimal::new(30, 0));
        assert_eq!(updated.date, date!(2025 - 01 - 06));
        assert_eq!(updated.description, "");
    }

    #[tokio::test]
    async fn empty_title_is_shown_in_form() {
        let (state, user, expense) = get_state();
        let form = TransactionForm {
            title: "   ".to_owned(),
            amount: "30".to_owned(),
            ..Default::default()
        };

        let response = update_expense_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(expense.id),
            Form(form),
        )
        .await;

        assert_status_ok(&response);
        let fragment = parse_html_fragment(response).await;
        let form = must_get_form(&fragment);
        assert_form_error_message(&form, "Error: Title cannot be empty");
        let connection = state.db_connection.lock().unwrap();
        let unchanged =
            get_transaction(expense.id, user.id, TransactionKind::Expense, &connection).unwrap();
        assert_eq!(unchanged.title, "Lunch");
    }

    #[tokio::test]
    async fn other_users_expense_is_not_updated() {
        let (state, _, expense) = get_state();
        let intruder = {
            let connection = state.db_connection.lock().unwrap();
            create_test_user("mallory", &connection)
        };
        let form = TransactionForm {
            title: "Stolen".to_owned(),
            amount: "1".to_owned(),
            ..Default::default()
        };

        let response = update_expense_endpoint(
            State(state),
            Extension(intruder.id),
            Path(expense.id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
