//! Categories listing page.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    auth::UserID,
    category::{
        Category, count_transactions_per_category, form::CategoryState, get_categories,
    },
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, category_badge, dark_mode_script, edit_delete_action_links,
    },
    navigation::NavBar,
    profile::get_or_create_profile,
};

/// A category with the number of expenses and income that use it.
struct CategoryRow {
    category: Category,
    transaction_count: u32,
}

/// Render the categories listing page with transaction counts.
pub async fn get_categories_page(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
    let counts = count_transactions_per_category(user_id, &connection).inspect_err(|error| {
        tracing::error!("Could not count transactions per category: {error}")
    })?;
    let profile = get_or_create_profile(user_id, &connection)?;

    let rows: Vec<CategoryRow> = categories
        .into_iter()
        .map(|category| CategoryRow {
            transaction_count: counts.get(&category.id).copied().unwrap_or_default(),
            category,
        })
        .collect();

    Ok(base(
        "Categories",
        &[dark_mode_script(profile.dark_mode)],
        &categories_view(&rows),
    )
    .into_response())
}

fn category_row_view(row: &CategoryRow) -> Markup {
    let category = &row.category;
    let edit_url = format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id);
    let delete_url = format_endpoint(endpoints::CATEGORY_API, category.id);
    let confirm_message = format!(
        "Are you sure you want to delete '{}'? This will remove it from {} transaction(s).",
        category.name, row.transaction_count
    );

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE)
            {
                i class={ "bi " (category.icon) " mr-2" } style={ "color: " (category.color) } {}
                (category_badge(category.name.as_ref(), category.color.as_ref()))
            }
            td class=(TABLE_CELL_STYLE) { (category.category_type.label()) }
            td class=(TABLE_CELL_STYLE) { (row.transaction_count) }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    (edit_delete_action_links(
                        &edit_url,
                        &delete_url,
                        &confirm_message,
                        "closest tr",
                        "delete",
                    ))
                }
            }
        }
    }
}

fn categories_view(rows: &[CategoryRow]) -> Markup {
    let new_category_route = endpoints::NEW_CATEGORY_VIEW;

    html! {
        (NavBar::new(endpoints::CATEGORIES_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(new_category_route) class=(LINK_STYLE) { "Create Category" }
                }

                div class="overflow-x-auto rounded-lg shadow dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Used for" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (category_row_view(row))
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories created yet. "
                                        a href=(new_category_route) class=(LINK_STYLE)
                                        {
                                            "Create your first category"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod categories_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use time::macros::date;

    use crate::{
        category::{CategoryType, form::CategoryState},
        test_utils::{
            assert_status_ok, assert_valid_html, create_test_category, create_test_transaction,
            create_test_user, get_test_connection_with_user, parse_html_document, table_rows,
        },
        transaction::TransactionKind,
    };

    use super::get_categories_page;

    #[tokio::test]
    async fn lists_categories_with_counts() {
        let (connection, user) = get_test_connection_with_user();
        let other = create_test_user("grace", &connection);
        let pets = create_test_category(&user, "Pets", CategoryType::Both, &connection);
        create_test_category(&other, "Hidden", CategoryType::Expense, &connection);
        for kind in TransactionKind::ALL {
            create_test_transaction(
                &user,
                kind,
                "Vet",
                100,
                date!(2025 - 01 - 05),
                Some(&pets),
                &connection,
            );
        }
        let state = CategoryState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_categories_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_status_ok(&response);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(table_rows(&html, 3), [["Pets", "Both", "2"]]);
    }
}
