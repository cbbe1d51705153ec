//! The pages listing a user's expenses and income.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, get_categories_for_kind},
    filter::{ExpenseFilter, ExpenseFilterQuery, filter_expenses},
    html::{
        BUTTON_SECONDARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, MAX_CELL_GRAPHEMES, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, category_badge, dark_mode_script,
        edit_delete_action_links, format_currency, truncate_text,
    },
    navigation::NavBar,
    pagination::{
        PaginationConfig, create_pagination_indicators, page_count, page_slice, pagination_view,
    },
    profile::get_or_create_profile,
    store::{LedgerStore, TransactionQuery},
    transaction::{Transaction, TransactionKind},
};

/// The state needed to list expenses and income.
#[derive(Debug, Clone)]
pub struct TransactionListState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How many rows to show per page.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The page number of the income page.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
}

/// One page of rows plus what is needed to render the page links.
struct Page<'a> {
    rows: &'a [Transaction],
    current: u64,
    count: u64,
}

fn paginate<'a>(rows: &'a [Transaction], page: Option<u64>, config: &PaginationConfig) -> Page<'a> {
    let page = page.unwrap_or(config.default_page);
    let (rows_on_page, current) = page_slice(rows, page, config.default_page_size);

    Page {
        rows: rows_on_page,
        current,
        count: page_count(rows.len() as u64, config.default_page_size),
    }
}

/// Display the user's expenses that match the filters in the query string.
///
/// Invalid filters are reported above the list, which then shows every expense.
pub async fn get_expenses_page(
    State(state): State<TransactionListState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ExpenseFilterQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let profile = get_or_create_profile(user_id, &connection)?;
    let categories = get_categories_for_kind(user_id, TransactionKind::Expense, &connection)?;

    let filtered = query
        .parse()
        .and_then(|filter| filter_expenses(&*connection, user_id, &filter));
    let (filtered, filter_error) = match filtered {
        Ok(filtered) => (filtered, None),
        Err(error) if error.is_validation_error() => (
            filter_expenses(&*connection, user_id, &ExpenseFilter::default())?,
            Some(format!("Error: {error}")),
        ),
        Err(error) => return Err(error),
    };

    let kind = TransactionKind::Expense;
    let page = paginate(&filtered.expenses, query.page, &state.pagination_config);
    let indicators = create_pagination_indicators(
        page.current,
        page.count,
        state.pagination_config.max_pages,
    );

    let pagination = pagination_view(&indicators, |page| {
        format!("{}?{}", kind.list_view(), query.with_page(page))
    });

    let content = html! {
        (NavBar::new(kind.list_view()).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            (list_header(kind))
            (filter_form(&query, &categories, filter_error.as_deref()))
            (total_view(kind, filtered.total, filtered.expenses.len(), &profile.currency))
            (transactions_table(kind, page.rows, &profile.currency))
            (pagination)
        }
    };

    Ok(base("Expenses", &[dark_mode_script(profile.dark_mode)], &content).into_response())
}

/// Display the user's income, newest first.
pub async fn get_income_page(
    State(state): State<TransactionListState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PageQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let kind = TransactionKind::Income;
    let profile = get_or_create_profile(user_id, &connection)?;
    let income = connection.query_transactions(user_id, kind, &TransactionQuery::default())?;
    let total: Decimal = income.iter().map(|income| income.amount.as_decimal()).sum();

    let page = paginate(&income, query.page, &state.pagination_config);
    let indicators = create_pagination_indicators(
        page.current,
        page.count,
        state.pagination_config.max_pages,
    );

    let pagination = pagination_view(&indicators, |page| {
        format!("{}?page={page}", kind.list_view())
    });

    let content = html! {
        (NavBar::new(kind.list_view()).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            (list_header(kind))
            (total_view(kind, total, income.len(), &profile.currency))
            (transactions_table(kind, page.rows, &profile.currency))
            (pagination)
        }
    };

    Ok(base("Income", &[dark_mode_script(profile.dark_mode)], &content).into_response())
}

fn list_header(kind: TransactionKind) -> Markup {
    html! {
        div class="w-full flex flex-wrap justify-between items-center gap-4 mb-4"
        {
            h1 class="text-2xl font-bold" { (kind.title()) }

            div class="flex gap-4"
            {
                a href=(kind.export_url()) class=(BUTTON_SECONDARY_STYLE) { "Export CSV" }
                a href=(kind.new_view()) class=(LINK_STYLE) { "Add " (kind.singular()) }
            }
        }
    }
}

fn filter_form(
    query: &ExpenseFilterQuery,
    categories: &[Category],
    error_message: Option<&str>,
) -> Markup {
    let text_field = |name: &str, label: &str, type_: &str, value: &Option<String>| {
        html! {
            div
            {
                label for=(name) class=(FORM_LABEL_STYLE) { (label) }
                input
                    type=(type_)
                    name=(name)
                    id=(name)
                    value=(value.as_deref().unwrap_or_default())
                    step=[(type_ == "number").then_some("0.01")]
                    min=[(type_ == "number").then_some("0")]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    };
    let selected_category = query.category.as_deref().unwrap_or_default();

    html! {
        form
            method="get"
            action=(TransactionKind::Expense.list_view())
            class="w-full grid grid-cols-1 md:grid-cols-3 gap-4 mb-4 items-end"
        {
            @if let Some(error_message) = error_message {
                p class={ (FORM_ERROR_STYLE) " md:col-span-3" } { (error_message) }
            }

            (text_field("search", "Search", "search", &query.search))

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                select name="category" id="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All categories" }

                    @for category in categories {
                        @let id = category.id.to_string();
                        option value=(id) selected[id == selected_category] { (category.name) }
                    }
                }
            }

            (text_field("date_from", "From", "date", &query.date_from))
            (text_field("date_to", "To", "date", &query.date_to))
            (text_field("amount_min", "Min amount", "number", &query.amount_min))
            (text_field("amount_max", "Max amount", "number", &query.amount_max))

            div class="flex gap-4 items-center md:col-span-3"
            {
                button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Filter" }
                a href=(TransactionKind::Expense.list_view()) class=(LINK_STYLE) { "Clear" }
            }
        }
    }
}

fn total_view(kind: TransactionKind, total: Decimal, count: usize, currency: &str) -> Markup {
    let noun = if count == 1 {
        kind.singular()
    } else {
        kind.plural()
    };

    html! {
        p id="total" class="w-full mb-4 text-lg"
        {
            "Total: "
            span class="font-semibold" { (format_currency(total, currency)) }
            span class="text-sm text-gray-500 dark:text-gray-400" { " (" (count) " " (noun) ")" }
        }
    }
}

fn transactions_table(kind: TransactionKind, rows: &[Transaction], currency: &str) -> Markup {
    html! {
        div class="w-full overflow-x-auto rounded-lg shadow"
        {
            table id="transactions" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Title" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                    }
                }

                tbody
                {
                    @for transaction in rows {
                        (transaction_row(kind, transaction, currency))
                    }

                    @if rows.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="5" class={ (TABLE_CELL_STYLE) " text-center" }
                            {
                                "Nothing to show. "
                                a href=(kind.new_view()) class=(LINK_STYLE) { "Add " (kind.singular()) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn transaction_row(kind: TransactionKind, transaction: &Transaction, currency: &str) -> Markup {
    let (title, full_title) = truncate_text(&transaction.title, MAX_CELL_GRAPHEMES);
    let (description, full_description) =
        truncate_text(&transaction.description, MAX_CELL_GRAPHEMES);
    let confirm_message = format!(
        "Are you sure you want to delete the {} '{}'? This cannot be undone.",
        kind.singular(),
        transaction.title
    );

    html! {
        tr class=(TABLE_ROW_STYLE) data-id=(transaction.id)
        {
            td class=(TABLE_CELL_STYLE) title=[full_title]
            {
                span class="font-medium text-gray-900 dark:text-white" { (title) }

                @if !description.is_empty() {
                    br;
                    span class="text-xs" title=[full_description] { (description) }
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(category) = &transaction.category {
                    (category_badge(&category.name, category.color.as_ref()))
                }
            }
            td class=(TABLE_CELL_STYLE) { (transaction.date) }
            td class={ (TABLE_CELL_STYLE) " text-right whitespace-nowrap" }
            {
                (format_currency(transaction.amount.as_decimal(), currency))
            }
            td class={ (TABLE_CELL_STYLE) " flex gap-4" }
            {
                (edit_delete_action_links(
                    &kind.edit_view(transaction.id),
                    &kind.item_api(transaction.id),
                    &confirm_message,
                    "closest tr",
                    "delete",
                ))
            }
        }
    }
}
