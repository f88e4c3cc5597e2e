//! Chart generation and rendering.
//!
//! Charts are built as ECharts options with `charming` and initialised by a
//! script in the page head:
//! - **Spending by category**: a doughnut of expense totals in category colors
//! - **Daily trend**: income and expense lines over the last N days
//! - **Period report**: income and expense bars per week, month, quarter or year

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Color, Emphasis, EmphasisFocus,
        JsFunction, Tooltip, Trigger,
    },
    series::{Line, Pie, bar},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    analytics::{CategoryTotal, DailyTotal, PeriodSummary},
    html::HeadElement,
};

/// A chart with its HTML container ID and ECharts configuration.
pub(crate) struct PageChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

impl PageChart {
    pub(crate) fn new(id: &'static str, chart: Chart) -> Self {
        Self {
            id,
            options: chart.to_string(),
        }
    }
}

/// Renders the HTML containers for `charts` in a responsive grid.
pub(crate) fn charts_view(charts: &[PageChart]) -> Markup {
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
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates the JavaScript that initialises every chart with dark mode
/// support and responsive resizing.
pub(crate) fn charts_script(charts: &[PageChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
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

fn grid() -> Grid {
    Grid::new()
        .left("3%")
        .right("4%")
        .bottom("3%")
        .top(80)
        .contain_label(true)
}

/// A doughnut chart of expenses per category, each slice in its category color.
pub(crate) fn category_chart(category_totals: &[CategoryTotal], subtitle: &str) -> Chart {
    let colors = category_totals
        .iter()
        .map(|total| Color::from(total.color.as_str()))
        .collect::<Vec<_>>();
    let data = category_totals
        .iter()
        .map(|total| (round_cents(total.total), total.name.as_str()))
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text("Spending by Category").subtext(subtitle))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().bottom("0%"))
        .color(colors)
        .series(
            Pie::new()
                .name("Expenses")
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

/// Income and expense lines, one point per day.
pub(crate) fn trend_chart(daily_totals: &[DailyTotal]) -> Chart {
    let labels = daily_totals
        .iter()
        .map(|day| day.date.to_string())
        .collect::<Vec<_>>();
    let income = daily_totals
        .iter()
        .map(|day| round_cents(day.income))
        .collect::<Vec<_>>();
    let expenses = daily_totals
        .iter()
        .map(|day| round_cents(day.expenses))
        .collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Daily Trend")
                .subtext(format!("Last {} days", daily_totals.len())),
        )
        .tooltip(currency_tooltip())
        .legend(Legend::new().top("1%").right("4%"))
        .grid(grid())
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Line::new().name("Income").data(income))
        .series(Line::new().name("Expenses").data(expenses))
}

/// Side by side income and expense bars for each period.
pub(crate) fn period_chart(periods: &[PeriodSummary], subtitle: &str) -> Chart {
    let labels = periods
        .iter()
        .map(|period| period.label.clone())
        .collect::<Vec<_>>();
    let income = periods
        .iter()
        .map(|period| round_cents(period.income))
        .collect::<Vec<_>>();
    let expenses = periods
        .iter()
        .map(|period| round_cents(period.expenses))
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text("Income vs Expenses").subtext(subtitle))
        .tooltip(currency_tooltip())
        .legend(Legend::new().top("1%").right("4%"))
        .grid(grid())
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
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

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

#[cfg(test)]
mod chart_tests {
    use time::macros::date;

    use crate::{
        analytics::{CategoryTotal, DailyTotal},
        html::HeadElement,
    };

    use super::{PageChart, category_chart, charts_script, charts_view, trend_chart};

    #[test]
    fn category_chart_uses_category_colors() {
        let totals = [CategoryTotal {
            category_id: 1,
            name: "Food".to_owned(),
            color: "#ff6b6b".to_owned(),
            total: 12.5,
            count: 2,
        }];

        let options = category_chart(&totals, "All time").to_string();

        assert!(options.contains("#ff6b6b"), "got {options}");
        assert!(options.contains("Food"));
        assert!(options.contains("12.5"));
    }

    #[test]
    fn script_initialises_each_chart() {
        let charts = [PageChart::new(
            "trend-chart",
            trend_chart(&[DailyTotal {
                date: date!(2025 - 01 - 01),
                income: 1.0,
                expenses: 2.0,
            }]),
        )];

        let HeadElement::ScriptSource(script) = charts_script(&charts) else {
            panic!("want inline script");
        };
        let container = charts_view(&charts).into_string();

        assert!(script.0.contains(r#"document.getElementById("trend-chart")"#));
        assert!(script.0.contains("2025-01-01"));
        assert!(container.contains(r#"id="trend-chart""#));
    }
}
