//! Tables of the most recent expenses and income on the dashboard.

use maud::{Markup, html};

use crate::{
    html::{
        LINK_STYLE, MAX_CELL_GRAPHEMES, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        category_badge, format_currency, truncate_text,
    },
    transaction::{Transaction, TransactionKind},
};

/// The number of expenses and income listed on the dashboard.
pub(super) const RECENT_TRANSACTION_COUNT: u32 = 5;

const TABLE_CELL_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const TABLE_CELL_RED_STYLE: &str = "text-red-600 dark:text-red-400";

/// Renders the latest `transactions` of `kind` with a link to the full list.
pub(super) fn recent_transactions_table(
    kind: TransactionKind,
    transactions: &[Transaction],
    currency: &str,
) -> Markup {
    let amount_style = match kind {
        TransactionKind::Expense => TABLE_CELL_RED_STYLE,
        TransactionKind::Income => TABLE_CELL_GREEN_STYLE,
    };

    html! {
        div id={ "recent-" (kind.plural()) }
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h3 class="text-xl font-semibold" { "Recent " (kind.title()) }
                a href=(kind.list_view()) class=(LINK_STYLE) { "View all" }
            }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Title" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                        }
                    }

                    tbody
                    {
                        @for transaction in transactions {
                            @let (title, full_title) = truncate_text(&transaction.title, MAX_CELL_GRAPHEMES);

                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) title=[full_title] { (title) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    @if let Some(category) = &transaction.category {
                                        (category_badge(&category.name, category.color.as_ref()))
                                    }
                                }
                                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                td class={ (TABLE_CELL_STYLE) " text-right whitespace-nowrap " (amount_style) }
                                {
                                    (format_currency(transaction.amount.as_decimal(), currency))
                                }
                            }
                        }

                        @if transactions.is_empty() {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td colspan="4" class={ (TABLE_CELL_STYLE) " text-center" }
                                {
                                    "No " (kind.plural()) " yet. "
                                    a href=(kind.new_view()) class=(LINK_STYLE) { "Add one" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
