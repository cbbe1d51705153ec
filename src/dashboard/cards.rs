//! Summary cards showing the totals at the top of the dashboard.

use maud::{Markup, html};
use rust_decimal::Decimal;

use crate::{html::format_currency, summary::FinancialSummary};

const CARD_STYLE: &str = "flex flex-col gap-1 p-4 rounded-lg shadow bg-white dark:bg-gray-800";
const CARD_LABEL_STYLE: &str = "text-sm font-medium text-gray-500 dark:text-gray-400";
const CARD_VALUE_GREEN_STYLE: &str = "text-2xl font-bold text-green-600 dark:text-green-400";
const CARD_VALUE_RED_STYLE: &str = "text-2xl font-bold text-red-600 dark:text-red-400";

/// Gets the CSS class for the balance (green if the user saved money, red otherwise).
fn balance_style(balance: Decimal) -> &'static str {
    if balance.is_sign_negative() && !balance.is_zero() {
        CARD_VALUE_RED_STYLE
    } else {
        CARD_VALUE_GREEN_STYLE
    }
}

fn card(id: &str, label: &str, value: &str, value_style: &str) -> Markup {
    html! {
        div id=(id) class=(CARD_STYLE)
        {
            span class=(CARD_LABEL_STYLE) { (label) }
            span class=(value_style) { (value) }
        }
    }
}

/// Renders the total income, total expenses and balance as a row of cards.
pub(super) fn summary_cards_view(summary: &FinancialSummary, currency: &str) -> Markup {
    html! {
        section id="summary" class="w-full grid grid-cols-1 sm:grid-cols-3 gap-4 mb-4"
        {
            (card(
                "total-income",
                "Total Income",
                &format_currency(summary.total_income, currency),
                CARD_VALUE_GREEN_STYLE,
            ))
            (card(
                "total-expenses",
                "Total Expenses",
                &format_currency(summary.total_expenses, currency),
                CARD_VALUE_RED_STYLE,
            ))
            (card(
                "balance",
                "Balance",
                &format_currency(summary.balance, currency),
                balance_style(summary.balance),
            ))
        }
    }
}
