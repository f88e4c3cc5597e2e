//! Income and expenses per week, month, quarter or year.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    analytics::{PeriodSummary, ReportPeriod, get_ledger, period_report},
    auth::UserID,
    dashboard::charts::{PageChart, charts_script, charts_view, period_chart},
    endpoints,
    html::{
        ECHARTS_SCRIPT, HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency, page_header,
    },
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed for the reports page.
#[derive(Debug, Clone)]
pub struct ReportsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// One of "week", "month", "quarter" or "year". Anything else shows months.
    pub period: Option<String>,
}

pub async fn get_reports_page(
    State(state): State<ReportsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let period = query
        .period
        .as_deref()
        .map(ReportPeriod::from_name)
        .unwrap_or_default();
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let ledger = get_ledger(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get transactions: {error}"))?;
    drop(connection);

    let report = period_report(&ledger, period, today);
    let subtitle = format!("Last {} {}s", period.count(), period.as_str());
    let charts = [PageChart::new(
        "period-chart",
        period_chart(&report, &subtitle),
    )];

    Ok(reports_view(period, &report, &charts).into_response())
}

fn period_links(selected: ReportPeriod) -> Markup {
    let periods = [
        (ReportPeriod::Week, "Weekly"),
        (ReportPeriod::Month, "Monthly"),
        (ReportPeriod::Quarter, "Quarterly"),
        (ReportPeriod::Year, "Yearly"),
    ];

    html!(
        nav class="flex gap-4"
        {
            @for (period, label) in periods {
                @let url = format!("{}?period={}", endpoints::REPORTS_VIEW, period.as_str());

                @if period == selected {
                    span class="font-semibold" aria-current="page" { (label) }
                } @else {
                    a href=(url) class=(LINK_STYLE) { (label) }
                }
            }
        }
    )
}

fn report_table(report: &[PeriodSummary]) -> Markup {
    html!(
        div class="w-full overflow-x-auto"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Period" }
                        th scope="col" class="px-6 py-4 text-right" { "Income" }
                        th scope="col" class="px-6 py-4 text-right" { "Expenses" }
                        th scope="col" class="px-6 py-4 text-right" { "Balance" }
                    }
                }

                tbody
                {
                    @for row in report.iter().rev() {
                        @let balance_style = if row.balance >= 0.0 {
                            "px-6 py-4 text-right text-green-600 dark:text-green-400"
                        } else {
                            "px-6 py-4 text-right text-red-600 dark:text-red-400"
                        };

                        tr class=(TABLE_ROW_STYLE) data-period=(row.label)
                        {
                            td class=(TABLE_CELL_STYLE) { (row.label) }
                            td class="px-6 py-4 text-right" { (format_currency(row.income)) }
                            td class="px-6 py-4 text-right" { (format_currency(row.expenses)) }
                            td class=(balance_style) { (format_currency(row.balance)) }
                        }
                    }
                }
            }
        }
    )
}

fn reports_view(period: ReportPeriod, report: &[PeriodSummary], charts: &[PageChart]) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            (page_header("Reports", Some((endpoints::EXPORT_TRANSACTIONS, "Export CSV"))))
            (period_links(period))
            (charts_view(charts))
            (report_table(report))
        }
    );

    let scripts = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned()),
        charts_script(charts),
    ];

    base("Reports", &scripts, &content)
}
