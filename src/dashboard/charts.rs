//! Chart generation and rendering for the dashboard.
//!
//! This module creates ECharts visualizations for the dashboard:
//! - **Monthly Chart**: Income and expense totals per month over the chart window
//! - **Category Chart**: Pie chart of the largest expense categories
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization code.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Color, Emphasis, EmphasisFocus,
        JsFunction, Tooltip, Trigger,
    },
    series::{Pie, bar},
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{
    dashboard::aggregation::{CategoryTotal, MonthTotals},
    html::HeadElement,
};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for dashboard charts.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded bg-white dark:bg-gray-800"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// Each chart picks the dark theme when the page is in dark mode and resizes
/// with the window.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const isDarkMode = document.documentElement.classList.contains('dark');
                    const chart = echarts.init(chartDom, isDarkMode ? 'dark' : null);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// Grouped bar chart of income and expenses per month.
pub(super) fn monthly_chart(series: &[MonthTotals], window_days: i64, currency: &str) -> Chart {
    let labels: Vec<String> = series.iter().map(|month| month.label.clone()).collect();
    let income: Vec<f64> = series.iter().map(|month| to_f64(month.income)).collect();
    let expenses: Vec<f64> = series.iter().map(|month| to_f64(month.expenses)).collect();

    Chart::new()
        .title(
            Title::new()
                .text("Income vs Expenses")
                .subtext(format!("Last {window_days} days")),
        )
        .tooltip(currency_tooltip(currency))
        .legend(Legend::new().right("4%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(70)
                .contain_label(true),
        )
        .color(vec![Color::from("#27ae60"), Color::from("#e74c3c")])
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter(currency))),
        )
        .series(
            bar::Bar::new()
                .name("Income")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(income),
        )
        .series(
            bar::Bar::new()
                .name("Expenses")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(expenses),
        )
}

/// Pie chart of expenses per category.
pub(super) fn category_chart(breakdown: &[CategoryTotal], currency: &str) -> Chart {
    let colors = breakdown
        .iter()
        .map(|category| Color::from(category.color.as_ref()))
        .collect();
    let data: Vec<(f64, String)> = breakdown
        .iter()
        .map(|category| (to_f64(category.total), category.label.clone()))
        .collect();

    Chart::new()
        .title(
            Title::new()
                .text("Expenses by Category")
                .subtext("Top categories"),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter(currency)),
        )
        .legend(Legend::new().bottom("2%"))
        .color(colors)
        .series(
            Pie::new()
                .name("Expenses")
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or_default()
}

#[inline]
fn currency_formatter(currency: &str) -> JsFunction {
    let currency = serde_json::to_string(currency).unwrap_or_else(|_| "\"$\"".to_owned());

    JsFunction::new_with_args(
        "number",
        &format!(
            "const numberFormatter = new Intl.NumberFormat('en-US', {{
                minimumFractionDigits: 2,
                maximumFractionDigits: 2
            }});
            return (number) ? {currency} + numberFormatter.format(number) : \"-\";"
        ),
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip(currency: &str) -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter(currency))
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
