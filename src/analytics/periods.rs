//! Income and expenses summarised per week, month, quarter or year.

use serde::Serialize;
use time::{Date, Duration, Month};

use crate::{analytics::totals, transaction::query::TransactionRow};

/// The length of each row in a period report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportPeriod {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl ReportPeriod {
    /// Parse a period name, falling back to [ReportPeriod::Month] for
    /// anything unrecognised.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "week" => ReportPeriod::Week,
            "quarter" => ReportPeriod::Quarter,
            "year" => ReportPeriod::Year,
            _ => ReportPeriod::Month,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Week => "week",
            ReportPeriod::Month => "month",
            ReportPeriod::Quarter => "quarter",
            ReportPeriod::Year => "year",
        }
    }

    /// How many periods a report covers.
    pub fn count(&self) -> i32 {
        match self {
            ReportPeriod::Week => 12,
            ReportPeriod::Month => 12,
            ReportPeriod::Quarter => 8,
            ReportPeriod::Year => 5,
        }
    }
}

/// The totals for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub label: String,
    pub start: Date,
    /// Inclusive.
    pub end: Date,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

/// The first day of the month `index` months after January of year zero.
fn month_from_index(index: i32) -> Option<Date> {
    let year = index.div_euclid(12);
    let month = Month::try_from(index.rem_euclid(12) as u8 + 1).ok()?;

    Date::from_calendar_date(year, month, 1).ok()
}

fn month_index(date: Date) -> i32 {
    date.year() * 12 + i32::from(u8::from(date.month())) - 1
}

/// The label, first and last day of the `offset`th period before the one
/// containing `today`.
fn period_bounds(period: ReportPeriod, today: Date, offset: i32) -> Option<(String, Date, Date)> {
    match period {
        ReportPeriod::Week => {
            let monday = today - Duration::days(i64::from(today.weekday().number_days_from_monday()));
            let start = monday - Duration::weeks(i64::from(offset));
            let end = start + Duration::days(6);
            let label = format!(
                "Week {:02}.{:02} - {:02}.{:02}",
                start.day(),
                u8::from(start.month()),
                end.day(),
                u8::from(end.month())
            );

            Some((label, start, end))
        }
        ReportPeriod::Month => {
            let index = month_index(today) - offset;
            let start = month_from_index(index)?;
            let end = month_from_index(index + 1)?.previous_day()?;

            Some((format!("{} {}", start.month(), start.year()), start, end))
        }
        ReportPeriod::Quarter => {
            let index = month_index(today).div_euclid(3) - offset;
            let start = month_from_index(index * 3)?;
            let end = month_from_index((index + 1) * 3)?.previous_day()?;
            let label = format!("Q{} {}", index.rem_euclid(4) + 1, start.year());

            Some((label, start, end))
        }
        ReportPeriod::Year => {
            let year = today.year() - offset;
            let start = Date::from_calendar_date(year, Month::January, 1).ok()?;
            let end = Date::from_calendar_date(year, Month::December, 31).ok()?;

            Some((year.to_string(), start, end))
        }
    }
}

/// Summarise `rows` over the last [ReportPeriod::count] periods up to and
/// including the one containing `today`, oldest first.
pub fn period_report(rows: &[TransactionRow], period: ReportPeriod, today: Date) -> Vec<PeriodSummary> {
    (0..period.count())
        .rev()
        .filter_map(|offset| period_bounds(period, today, offset))
        .map(|(label, start, end)| {
            let period_totals = totals(rows.iter().filter(|row| row.date >= start && row.date <= end));

            PeriodSummary {
                label,
                start,
                end,
                income: period_totals.income,
                expenses: period_totals.expenses,
                balance: period_totals.balance(),
            }
        })
        .collect()
}

#[cfg(test)]
mod period_report_tests {
    use time::macros::date;

    use crate::analytics::test_rows::{expense, income};

    use super::{ReportPeriod, period_report};

    #[test]
    fn unknown_period_falls_back_to_month() {
        assert_eq!(ReportPeriod::from_name("fortnight"), ReportPeriod::Month);
        assert_eq!(ReportPeriod::from_name("quarter"), ReportPeriod::Quarter);
    }

    #[test]
    fn reports_cover_expected_number_of_periods() {
        let today = date!(2025 - 05 - 14);

        for (period, want) in [
            (ReportPeriod::Week, 12),
            (ReportPeriod::Month, 12),
            (ReportPeriod::Quarter, 8),
            (ReportPeriod::Year, 5),
        ] {
            let report = period_report(&[], period, today);

            assert_eq!(report.len(), want, "wrong row count for {period:?}");
            assert!(report.windows(2).all(|pair| pair[0].end < pair[1].start));
            assert!(report.last().is_some_and(|row| row.start <= today && today <= row.end));
        }
    }

    #[test]
    fn monthly_report_spans_year_boundary() {
        let report = period_report(&[], ReportPeriod::Month, date!(2025 - 02 - 10));

        assert_eq!(report[0].label, "March 2024");
        assert_eq!(report[0].start, date!(2024 - 03 - 01));
        assert_eq!(report[10].label, "January 2025");
        assert_eq!(report[10].end, date!(2025 - 01 - 31));
        assert_eq!(report[11].end, date!(2025 - 02 - 28));
    }

    #[test]
    fn weeks_start_on_monday() {
        // 2025-05-14 is a Wednesday.
        let report = period_report(&[], ReportPeriod::Week, date!(2025 - 05 - 14));

        let this_week = &report[11];
        assert_eq!(this_week.start, date!(2025 - 05 - 12));
        assert_eq!(this_week.end, date!(2025 - 05 - 18));
        assert_eq!(this_week.label, "Week 12.05 - 18.05");
    }

    #[test]
    fn quarters_are_labelled() {
        let report = period_report(&[], ReportPeriod::Quarter, date!(2025 - 05 - 14));

        assert_eq!(report[0].label, "Q3 2023");
        assert_eq!(report[7].label, "Q2 2025");
        assert_eq!(report[7].start, date!(2025 - 04 - 01));
        assert_eq!(report[7].end, date!(2025 - 06 - 30));
    }

    #[test]
    fn sums_transactions_into_their_period() {
        let rows = [
            income(1, 500.0, date!(2025 - 01 - 31), 1),
            expense(2, 100.0, date!(2025 - 02 - 01), 2),
            expense(3, 50.0, date!(2025 - 02 - 28), 2),
            income(4, 900.0, date!(2019 - 01 - 01), 1),
        ];

        let report = period_report(&rows, ReportPeriod::Month, date!(2025 - 02 - 10));

        assert_eq!(report[10].income, 500.0);
        assert_eq!(report[11].expenses, 150.0);
        assert_eq!(report[11].balance, -150.0);
        assert_eq!(report.iter().map(|row| row.income).sum::<f64>(), 500.0);

        let yearly = period_report(&rows, ReportPeriod::Year, date!(2025 - 02 - 10));
        assert_eq!(yearly[0].label, "2021");
        assert_eq!(yearly[4].balance, 350.0);
    }
}
