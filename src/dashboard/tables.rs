//! Tables for the most recent transactions and spending per category.

use maud::{Markup, html};

use crate::{
    analytics::CategoryTotal,
    endpoints,
    html::{
        LINK_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, category_badge,
        format_currency, truncate_text,
    },
    transaction::{TransactionType, query::TransactionRow},
};

const DESCRIPTION_MAX_GRAPHEMES: usize = 32;

pub(super) fn recent_transactions_table(transactions: &[TransactionRow]) -> Markup {
    html!(
        div class="w-full overflow-x-auto"
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h3 class="text-xl font-semibold" { "Recent Transactions" }
                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "View all" }
            }

            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class="px-6 py-4 text-right" { "Amount" }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        @let signed_amount = match transaction.transaction_type {
                            TransactionType::Income => transaction.amount,
                            TransactionType::Expense => -transaction.amount,
                        };

                        tr class=(TABLE_ROW_STYLE) data-recent-transaction
                        {
                            td class=(TABLE_CELL_STYLE) { (transaction.date) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                (truncate_text(&transaction.description, DESCRIPTION_MAX_GRAPHEMES))
                            }
                            td class=(TABLE_CELL_STYLE)
                            {
                                (category_badge(&transaction.category_name, &transaction.category_color))
                            }
                            td class="px-6 py-4 text-right" { (format_currency(signed_amount)) }
                        }
                    }

                    @if transactions.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="4" class="px-6 py-4 text-center" { "No transactions yet." }
                        }
                    }
                }
            }
        }
    )
}

/// Expense totals per category with each category's share of all expenses.
pub(super) fn category_breakdown_table(category_totals: &[CategoryTotal]) -> Markup {
    let total_expenses: f64 = category_totals.iter().map(|total| total.total).sum();

    html!(
        div class="w-full overflow-x-auto"
        {
            h3 class="text-xl font-semibold mb-4" { "Spending by Category" }

            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class="px-6 py-4 text-right" { "Transactions" }
                        th scope="col" class="px-6 py-4 text-right" { "Total" }
                        th scope="col" class="px-6 py-4 text-right" { "Share" }
                    }
                }

                tbody
                {
                    @for category in category_totals {
                        @let share = if total_expenses > 0.0 {
                            category.total / total_expenses * 100.0
                        } else {
                            0.0
                        };

                        tr class=(TABLE_ROW_STYLE) data-category-total
                        {
                            td class=(TABLE_CELL_STYLE) { (category_badge(&category.name, &category.color)) }
                            td class="px-6 py-4 text-right" { (category.count) }
                            td class="px-6 py-4 text-right" { (format_currency(category.total)) }
                            td class="px-6 py-4 text-right" { (format!("{share:.0}%")) }
                        }
                    }

                    @if category_totals.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="4" class="px-6 py-4 text-center" { "No expenses yet." }
                        }
                    }
                }
            }
        }
    )
}
