//! Summary cards for the balance and this month's figures.

use maud::{Markup, html};

use crate::{
    analytics::DashboardStats,
    html::{CARD_STYLE, format_currency},
};

const POSITIVE_STYLE: &str = "text-green-600 dark:text-green-400";
const NEGATIVE_STYLE: &str = "text-red-600 dark:text-red-400";

fn amount_style(amount: f64) -> &'static str {
    if amount >= 0.0 {
        POSITIVE_STYLE
    } else {
        NEGATIVE_STYLE
    }
}

fn stat_card(id: &str, label: &str, value: &str, value_style: &str, detail: &str) -> Markup {
    html!(
        div class=(CARD_STYLE) data-stat=(id)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p class={ "text-2xl font-bold " (value_style) } { (value) }
            p class="text-xs text-gray-500 dark:text-gray-400" { (detail) }
        }
    )
}

/// Cards for the balance, this month's income and expenses and the
/// savings rate.
pub(super) fn summary_cards_view(stats: &DashboardStats) -> Markup {
    let savings_rate = format!("{:.1}%", stats.savings_rate);
    let daily_average = format!("{} per day", format_currency(stats.daily_average));
    let transaction_count = format!("{} transactions in total", stats.transaction_count);

    html!(
        section class="grid grid-cols-1 sm:grid-cols-2 xl:grid-cols-4 gap-4 w-full"
        {
            (stat_card(
                "balance",
                "Balance",
                &format_currency(stats.balance),
                amount_style(stats.balance),
                &transaction_count,
            ))
            (stat_card(
                "monthly-income",
                "Income this month",
                &format_currency(stats.monthly_income),
                POSITIVE_STYLE,
                &format!("{} all time", format_currency(stats.total_income)),
            ))
            (stat_card(
                "monthly-expenses",
                "Expenses this month",
                &format_currency(stats.monthly_expenses),
                NEGATIVE_STYLE,
                &daily_average,
            ))
            (stat_card(
                "savings-rate",
                "Savings rate",
                &savings_rate,
                amount_style(stats.savings_rate),
                "Share of this month's income not spent",
            ))
        }
    )
}
