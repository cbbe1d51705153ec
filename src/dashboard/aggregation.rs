//! Aggregates income and expenses for the dashboard charts.
//!
//! Provides the month-by-month income and expense series and the breakdown of
//! expenses by category.

use std::{cmp::Reverse, collections::BTreeMap};

use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, Duration, Month};

use crate::{
    Error,
    auth::UserID,
    category::Color,
    store::{DateRange, LedgerStore},
    transaction::TransactionKind,
};

/// The number of days of history shown in the monthly chart by default.
pub const DEFAULT_CHART_WINDOW_DAYS: i64 = 180;

/// The longest window the monthly chart covers, about one hundred years.
pub const MAX_CHART_WINDOW_DAYS: i64 = 36_525;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// The most categories shown in the category breakdown.
pub const MAX_BREAKDOWN_CATEGORIES: usize = 8;

/// The label for expenses without a category.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Total income and expenses in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthTotals {
    /// The first day of the month.
    pub month: Date,
    /// The month and year, e.g. "Jan 2025".
    pub label: String,
    pub expenses: Decimal,
    pub income: Decimal,
}

/// Total expenses in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub label: String,
    pub total: Decimal,
    pub color: Color,
}

/// Income and expenses per month over the `window_days` days up to and
/// including `today`.
///
/// A window reaching past the earliest representable date starts at [Date::MIN].
/// Months with neither income nor expenses are left out. A month with only one
/// of the two has zero for the other. Months are in ascending order.
///
/// # Errors
///
/// Returns an error if the store cannot be queried.
pub fn monthly_series(
    store: &impl LedgerStore,
    user_id: UserID,
    today: Date,
    window_days: i64,
) -> Result<Vec<MonthTotals>, Error> {
    let range = DateRange {
        start: Some(
            window_days
                .checked_mul(SECONDS_PER_DAY)
                .and_then(|seconds| today.checked_sub(Duration::seconds(seconds)))
                .unwrap_or(Date::MIN),
        ),
        end: Some(today),
    };

    let expenses = store.sum_by_month(user_id, TransactionKind::Expense, range)?;
    let income = store.sum_by_month(user_id, TransactionKind::Income, range)?;

    let mut totals: BTreeMap<Date, (Decimal, Decimal)> = BTreeMap::new();

    for (month, total) in expenses {
        totals.entry(month).or_default().0 += total;
    }

    for (month, total) in income {
        totals.entry(month).or_default().1 += total;
    }

    Ok(totals
        .into_iter()
        .map(|(month, (expenses, income))| MonthTotals {
            month,
            label: format_month_label(month),
            expenses,
            income,
        })
        .collect())
}

/// The user's expense categories with the largest totals in `range`, largest first.
///
/// Expenses without a category are grouped under [UNCATEGORIZED_LABEL]. Equal
/// totals are ordered by category ID with the uncategorized group last. At
/// most [MAX_BREAKDOWN_CATEGORIES] categories are returned.
///
/// # Errors
///
/// Returns an [Error::InvalidDateRange] if the range starts after it ends,
/// without querying the store.
pub fn category_breakdown(
    store: &impl LedgerStore,
    user_id: UserID,
    range: DateRange,
) -> Result<Vec<CategoryTotal>, Error> {
    range.validate()?;

    let mut rows = store.sum_by_category(user_id, TransactionKind::Expense, range)?;
    rows.sort_by_key(|row| (Reverse(row.total), row.category_id.is_none(), row.category_id));

    Ok(rows
        .into_iter()
        .take(MAX_BREAKDOWN_CATEGORIES)
        .map(|row| match row.category_id {
            Some(_) => CategoryTotal {
                label: row.name.unwrap_or_default(),
                total: row.total,
                color: row.color.unwrap_or_default(),
            },
            None => CategoryTotal {
                label: UNCATEGORIZED_LABEL.to_owned(),
                total: row.total,
                color: Color::default(),
            },
        })
        .collect())
}

/// Formats a month as a three-letter abbreviation and the year, e.g. "Jan 2025".
pub(super) fn format_month_label(date: Date) -> String {
    let month = match date.month() {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    };

    format!("{month} {}", date.year())
}

#[cfg(test)]
mod monthly_series_tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        auth::UserID,
        money::Amount,
        store::InMemoryStore,
        test_utils::get_test_connection_with_user,
        transaction::{Transaction, TransactionKind, create_transaction},
    };

    use super::{MonthTotals, format_month_label, monthly_series};

    const USER: UserID = UserID::new(1);

    fn dollars(amount: i64) -> Decimal {
        Decimal::new(amount, 0)
    }

    fn scenario_rows() -> [(TransactionKind, i64, time::Date); 3] {
        [
            (TransactionKind::Expense, 5000, date!(2025 - 01 - 05)),
            (TransactionKind::Expense, 3000, date!(2025 - 02 - 10)),
            (TransactionKind::Income, 100_000, date!(2025 - 01 - 20)),
        ]
    }

    fn scenario_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        for (kind, cents, date) in scenario_rows() {
            store.add_transaction(USER, kind, "Row", Amount::from_cents(cents), date, None);
        }
        store
    }

    fn want_scenario() -> Vec<MonthTotals> {
        vec![
            MonthTotals {
                month: date!(2025 - 01 - 01),
                label: "Jan 2025".to_owned(),
                expenses: dollars(50),
                income: dollars(1000),
            },
            MonthTotals {
                month: date!(2025 - 02 - 01),
                label: "Feb 2025".to_owned(),
                expenses: dollars(30),
                income: Decimal::ZERO,
            },
        ]
    }

    #[test]
    fn fills_missing_side_with_zero() {
        let store = scenario_store();

        let got = monthly_series(&store, USER, date!(2025 - 03 - 01), 180).unwrap();

        assert_eq!(got, want_scenario());
    }

    #[test]
    fn empty_store_gives_empty_series() {
        let got = monthly_series(&InMemoryStore::new(), USER, date!(2025 - 03 - 01), 180).unwrap();

        assert!(got.is_empty());
    }

    #[test]
    fn window_past_earliest_date_covers_everything() {
        let store = InMemoryStore::new();
        store.add_transaction(
            USER,
            TransactionKind::Income,
            "Inheritance",
            Amount::from_cents(1_000_00),
            date!(1900 - 01 - 15),
            None,
        );

        let got = monthly_series(&store, USER, date!(2025 - 03 - 01), 5_000_000).unwrap();

        assert_eq!(
            got,
            [MonthTotals {
                month: date!(1900 - 01 - 01),
                label: format_month_label(date!(1900 - 01 - 01)),
                expenses: Decimal::ZERO,
                income: Decimal::new(1_000_00, 2),
            }]
        );
        assert!(
            monthly_series(&InMemoryStore::new(), USER, date!(2025 - 03 - 01), i64::MAX)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn excludes_rows_outside_window() {
        let store = scenario_store();
        store.add_transaction(
            USER,
            TransactionKind::Income,
            "Old",
            Amount::from_cents(100),
            date!(2024 - 01 - 01),
            None,
        );
        store.add_transaction(
            USER,
            TransactionKind::Expense,
            "Future",
            Amount::from_cents(100),
            date!(2025 - 03 - 02),
            None,
        );

        let got = monthly_series(&store, USER, date!(2025 - 03 - 01), 180).unwrap();

        assert_eq!(got, want_scenario());
    }

    #[test]
    fn window_start_is_inclusive() {
        let store = InMemoryStore::new();
        store.add_transaction(
            USER,
            TransactionKind::Expense,
            "Edge",
            Amount::from_cents(100),
            date!(2025 - 01 - 01),
            None,
        );

        let got = monthly_series(&store, USER, date!(2025 - 01 - 11), 10).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].expenses, Decimal::new(100, 2));
    }

    #[test]
    fn sqlite_store_gives_same_series() {
        let (connection, user) = get_test_connection_with_user();
        for (kind, cents, date) in scenario_rows() {
            create_transaction(
                user.id,
                kind,
                Transaction::build("Row", Amount::from_cents(cents), date),
                &connection,
            )
            .unwrap();
        }

        let got = monthly_series(&connection, user.id, date!(2025 - 03 - 01), 180).unwrap();

        assert_eq!(got, want_scenario());
    }

    #[test]
    fn labels_include_year() {
        assert_eq!(format_month_label(date!(2024 - 12 - 01)), "Dec 2024");
        assert_eq!(format_month_label(date!(2025 - 06 - 01)), "Jun 2025");
    }
}

#[cfg(test)]
mod category_breakdown_tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        Error,
        auth::UserID,
        category::{CategoryName, CategoryType, Color, NewCategory, create_category},
        money::Amount,
        store::{DateRange, InMemoryStore},
        test_utils::get_test_connection_with_user,
        transaction::{Transaction, TransactionKind, create_transaction},
    };

    use super::{MAX_BREAKDOWN_CATEGORIES, UNCATEGORIZED_LABEL, category_breakdown};

    const USER: UserID = UserID::new(1);

    fn add_expense(store: &InMemoryStore, cents: i64, category: Option<i64>) {
        store.add_transaction(
            USER,
            TransactionKind::Expense,
            "Expense",
            Amount::from_cents(cents),
            date!(2025 - 01 - 15),
            category,
        );
    }

    #[test]
    fn returns_at_most_eight_largest() {
        let store = InMemoryStore::new();
        for i in 1..=10 {
            let id = store.add_category(USER, &format!("Category {i}"), CategoryType::Expense);
            add_expense(&store, i * 100, Some(id));
        }

        let got = category_breakdown(&store, USER, DateRange::ALL).unwrap();

        assert_eq!(got.len(), MAX_BREAKDOWN_CATEGORIES);
        assert_eq!(got[0].label, "Category 10");
        assert_eq!(got[7].label, "Category 3");
        assert!(got.windows(2).all(|pair| pair[0].total >= pair[1].total));
    }

    #[test]
    fn groups_uncategorized_expenses() {
        let store = InMemoryStore::new();
        let rent = store.add_category(USER, "Rent", CategoryType::Expense);
        add_expense(&store, 1000, None);
        add_expense(&store, 2500, None);
        add_expense(&store, 2000, Some(rent));

        let got = category_breakdown(&store, USER, DateRange::ALL).unwrap();

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].label, UNCATEGORIZED_LABEL);
        assert_eq!(got[0].total, Decimal::new(3500, 2));
        assert_eq!(got[0].color, Color::default());
        assert_eq!(got[1].label, "Rent");
    }

    #[test]
    fn ties_ordered_by_category_with_uncategorized_last() {
        let store = InMemoryStore::new();
        let first = store.add_category(USER, "Zoo", CategoryType::Expense);
        let second = store.add_category(USER, "Aquarium", CategoryType::Expense);
        add_expense(&store, 1000, None);
        add_expense(&store, 1000, Some(second));
        add_expense(&store, 1000, Some(first));

        let labels: Vec<_> = category_breakdown(&store, USER, DateRange::ALL)
            .unwrap()
            .into_iter()
            .map(|total| total.label)
            .collect();

        assert_eq!(labels, ["Zoo", "Aquarium", UNCATEGORIZED_LABEL]);
    }

    #[test]
    fn ignores_income() {
        let store = InMemoryStore::new();
        store.add_transaction(
            USER,
            TransactionKind::Income,
            "Salary",
            Amount::from_cents(100_000),
            date!(2025 - 01 - 15),
            None,
        );

        let got = category_breakdown(&store, USER, DateRange::ALL).unwrap();

        assert!(got.is_empty());
    }

    #[test]
    fn rejects_inverted_range() {
        let range = DateRange {
            start: Some(date!(2025 - 02 - 01)),
            end: Some(date!(2025 - 01 - 01)),
        };

        let result = category_breakdown(&InMemoryStore::new(), USER, range);

        assert_eq!(
            result,
            Err(Error::InvalidDateRange(
                date!(2025 - 02 - 01),
                date!(2025 - 01 - 01)
            ))
        );
    }

    #[test]
    fn sqlite_store_uses_category_name_and_color() {
        let (connection, user) = get_test_connection_with_user();
        let mut new_category =
            NewCategory::new(CategoryName::new_unchecked("Food"), CategoryType::Expense);
        new_category.color = Color::new("#e74c3c").unwrap();
        let food = create_category(user.id, new_category, &connection).unwrap();
        for (cents, category) in [(1200, Some(food.id)), (800, Some(food.id)), (500, None)] {
            create_transaction(
                user.id,
                TransactionKind::Expense,
                Transaction::build("Row", Amount::from_cents(cents), date!(2025 - 01 - 15))
                    .category(category),
                &connection,
            )
            .unwrap();
        }

        let got = category_breakdown(&connection, user.id, DateRange::ALL).unwrap();

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].label, "Food");
        assert_eq!(got[0].total, Decimal::new(2000, 2));
        assert_eq!(got[0].color.as_ref(), "#e74c3c");
        assert_eq!(got[1].label, UNCATEGORIZED_LABEL);
        assert_eq!(got[1].total, Decimal::new(500, 2));
    }
}
