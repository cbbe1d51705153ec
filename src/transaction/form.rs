//! The form shared by the pages for creating and editing expenses and income.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    category::{Category, CategoryId},
    filter::parse_date,
    html::{
        FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        submit_button,
    },
    money::Amount,
    navigation::NavBar,
    transaction::{MAX_TITLE_LENGTH, Transaction, TransactionBuilder, TransactionKind},
};

/// The state needed by the pages and endpoints for creating and editing
/// expenses and income.
#[derive(Debug, Clone)]
pub struct TransactionFormState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionFormState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The raw form data for creating or editing an expense or income.
///
/// Amounts and dates are kept as text so that the user's input can be shown
/// again if it is invalid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionForm {
    pub title: String,
    pub amount: String,
    /// The date as "YYYY-MM-DD", today if empty.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub description: String,
}

impl TransactionForm {
    /// The form filled in with an existing transaction.
    pub fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            title: transaction.title.clone(),
            amount: transaction.amount.to_string(),
            date: transaction.date.to_string(),
            category_id: transaction.category.as_ref().map(|category| category.id),
            description: transaction.description.clone(),
        }
    }

    /// Check the amount and date and build the transaction.
    ///
    /// The title and category are checked when the transaction is saved.
    ///
    /// # Errors
    ///
    /// Returns an [Error::NonPositiveAmount] or [Error::InvalidAmount] if the
    /// amount is not valid, or an [Error::InvalidDate] if the date cannot be parsed.
    pub fn validate(&self, today: Date) -> Result<TransactionBuilder, Error> {
        let amount: Amount = self.amount.parse()?;
        let date = if self.date.trim().is_empty() {
            today
        } else {
            parse_date(&self.date).ok_or_else(|| Error::InvalidDate(self.date.clone()))?
        };

        Ok(Transaction::build(self.title.as_str(), amount, date)
            .description(&self.description)
            .category(self.category_id))
    }
}

/// Renders the form for an expense or income.
///
/// `categories` should only hold the categories that can be used for `kind`.
/// The error message, if any, is shown at the top of the form.
pub fn transaction_form_view(
    kind: TransactionKind,
    endpoint: &str,
    hx_method: &str,
    form: &TransactionForm,
    categories: &[Category],
    error_message: Option<&str>,
) -> Markup {
    let submit_text = if hx_method == "hx-put" {
        format!("Update {}", kind.singular())
    } else {
        format!("Add {}", kind.singular())
    };
    let amount_placeholder = "0.01";

    html! {
        form
            hx-post=[(hx_method == "hx-post").then_some(endpoint)]
            hx-put=[(hx_method == "hx-put").then_some(endpoint)]
            hx-target-error="#alert-container"
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            class="w-full space-y-4 md:space-y-6"
        {
            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            div
            {
                label for="title" class=(FORM_LABEL_STYLE) { "Title" }

                input
                    name="title"
                    id="title"
                    type="text"
                    placeholder="e.g. Weekly groceries"
                    value=(form.title)
                    maxlength=(MAX_TITLE_LENGTH)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder=(amount_placeholder)
                    value=(form.amount)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    value=(form.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select name="category_id" id="category_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "No category" }

                    @for category in categories {
                        option
                            value=(category.id)
                            selected[form.category_id == Some(category.id)]
                        {
                            (category.name)
                        }
                    }
                }
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                textarea
                    name="description"
                    id="description"
                    rows="3"
                    placeholder="Optional notes"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (form.description)
                }
            }

            (submit_button(&submit_text))
        }
    }
}

/// The page around a transaction form, with a link back to the list.
pub(super) fn transaction_form_page(kind: TransactionKind, heading: &str, form: Markup) -> Markup {
    html! {
        (NavBar::new(kind.list_view()).into_html())

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h1 class="text-xl font-bold" { (heading) }

                (form)

                a href=(kind.list_view()) class=(LINK_STYLE) { "Back to " (kind.plural()) }
            }
        }
    }
}
