use std::str::FromStr;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    category::{CategoryId, get_category},
    db::impl_text_column,
    endpoints,
    notification::{NewNotification, NotificationPriority, NotificationType, create_notification},
    transaction::{Transaction, TransactionType, get_expenses_in_category},
};

/// How long a budget goal runs for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        }
    }

    /// The number of days from a goal's start to its end.
    pub fn days(&self) -> i64 {
        match self {
            BudgetPeriod::Weekly => 7,
            BudgetPeriod::Monthly => 30,
            BudgetPeriod::Yearly => 365,
        }
    }
}

impl FromStr for BudgetPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(BudgetPeriod::Weekly),
            "monthly" => Ok(BudgetPeriod::Monthly),
            "yearly" => Ok(BudgetPeriod::Yearly),
            other => Err(Error::InvalidBudgetPeriod(other.to_owned())),
        }
    }
}

impl_text_column!(BudgetPeriod);

pub type BudgetGoalId = i64;

/// A spending ceiling for one category over a period.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetGoal {
    pub id: BudgetGoalId,
    pub user_id: UserID,
    pub category_id: CategoryId,
    pub target_amount: f64,
    pub period: BudgetPeriod,
    pub start_date: Date,
    /// Goals without an end date count spending up to today.
    pub end_date: Option<Date>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

/// `spent` as a percentage of `target`, between 0 and 100.
///
/// A target of zero always gives 0.
pub fn progress_percentage(spent: f64, target: f64) -> f64 {
    if target == 0.0 {
        return 0.0;
    }

    (spent / target * 100.0).clamp(0.0, 100.0)
}

/// How much of `target` is left after `spent`, never negative.
pub fn remaining_amount(spent: f64, target: f64) -> f64 {
    (target - spent).max(0.0)
}

/// Whole days from `today` until `end_date`, 0 once the end has passed or
/// if there is no end date.
pub fn days_remaining(end_date: Option<Date>, today: Date) -> i64 {
    end_date
        .map(|end_date| (end_date - today).whole_days().max(0))
        .unwrap_or(0)
}

/// A budget goal with its spending so far.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub goal: BudgetGoal,
    pub category_name: String,
    pub category_color: String,
    pub current_spent: f64,
    pub progress_percentage: f64,
    pub remaining_amount: f64,
    pub is_over_budget: bool,
    pub days_remaining: i64,
}

impl GoalProgress {
    pub fn new(
        goal: BudgetGoal,
        category_name: String,
        category_color: String,
        current_spent: f64,
        today: Date,
    ) -> Self {
        Self {
            progress_percentage: progress_percentage(current_spent, goal.target_amount),
            remaining_amount: remaining_amount(current_spent, goal.target_amount),
            is_over_budget: current_spent > goal.target_amount,
            days_remaining: days_remaining(goal.end_date, today),
            category_name,
            category_color,
            current_spent,
            goal,
        }
    }
}

pub fn create_budget_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget_goal (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            target_amount REAL NOT NULL CHECK (target_amount >= 0),
            period TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

const GOAL_COLUMNS: &str = "id, user_id, category_id, target_amount, period, start_date, \
    end_date, is_active, created_at";

fn map_row(row: &Row) -> Result<BudgetGoal, rusqlite::Error> {
    Ok(BudgetGoal {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        target_amount: row.get(3)?,
        period: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Create an active goal that starts on `start_date` and ends after the
/// number of days in `period`.
///
/// # Errors
/// Returns:
/// - [Error::NegativeTargetAmount] if `target_amount` is below zero or not a number,
/// - [Error::InvalidCategory] if `category_id` does not exist,
/// - [Error::SqlError] for other SQL errors.
pub fn create_budget_goal(
    user_id: UserID,
    category_id: CategoryId,
    target_amount: f64,
    period: BudgetPeriod,
    start_date: Date,
    connection: &Connection,
) -> Result<BudgetGoal, Error> {
    if !target_amount.is_finite() || target_amount < 0.0 {
        return Err(Error::NegativeTargetAmount);
    }

    get_category(category_id, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidCategory(category_id),
        error => error,
    })?;

    let end_date = start_date + Duration::days(period.days());

    connection
        .prepare(&format!(
            "INSERT INTO budget_goal
                (user_id, category_id, target_amount, period, start_date, end_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {GOAL_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                category_id,
                target_amount,
                period,
                start_date,
                end_date,
                OffsetDateTime::now_utc(),
            ),
            map_row,
        )
        .map_err(Error::from)
}

/// The active goals of `user_id`, oldest first.
pub fn get_active_budget_goals(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<BudgetGoal>, Error> {
    connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM budget_goal
            WHERE user_id = ?1 AND is_active = 1
            ORDER BY id ASC"
        ))?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_goal| maybe_goal.map_err(Error::from))
        .collect()
}

pub fn count_budget_goals(user_id: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(1) FROM budget_goal WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Delete a goal owned by `user_id`.
///
/// # Errors
/// Returns [Error::DeleteMissingBudgetGoal] if the goal does not exist or
/// belongs to someone else.
pub fn delete_budget_goal(
    goal_id: BudgetGoalId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget_goal WHERE id = ?1 AND user_id = ?2",
        (goal_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudgetGoal);
    }

    Ok(())
}

/// The expenses counted against `goal`: those in its category dated from
/// the start date to the end date, or to `today` if it has no end date.
pub fn current_spent(goal: &BudgetGoal, today: Date, connection: &Connection) -> Result<f64, Error> {
    get_expenses_in_category(
        goal.user_id,
        goal.category_id,
        goal.start_date,
        goal.end_date.unwrap_or(today),
        connection,
    )
}

/// Progress for every active goal of `user_id`.
pub fn get_goal_progress(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<Vec<GoalProgress>, Error> {
    get_active_budget_goals(user_id, connection)?
        .into_iter()
        .map(|goal| {
            let category = get_category(goal.category_id, connection)?;
            let spent = current_spent(&goal, today, connection)?;

            Ok(GoalProgress::new(
                goal,
                category.name.to_string(),
                category.color,
                spent,
                today,
            ))
        })
        .collect()
}

/// Send a budget alert for every active goal that `transaction` pushed from
/// within budget to over budget.
///
/// `transaction` must already be stored. Income never triggers an alert.
pub fn notify_if_over_budget(
    transaction: &Transaction,
    today: Date,
    connection: &Connection,
) -> Result<(), Error> {
    if transaction.transaction_type != TransactionType::Expense {
        return Ok(());
    }

    for goal in get_active_budget_goals(transaction.user_id, connection)? {
        let window_end = goal.end_date.unwrap_or(today);
        if goal.category_id != transaction.category_id
            || transaction.date < goal.start_date
            || transaction.date > window_end
        {
            continue;
        }

        let spent = current_spent(&goal, today, connection)?;
        let spent_before = spent - transaction.amount;
        if spent_before > goal.target_amount || spent <= goal.target_amount {
            continue;
        }

        let category = get_category(goal.category_id, connection)?;
        tracing::info!(
            "Budget goal {} for user {} exceeded: spent {spent:.2} of {:.2}",
            goal.id,
            goal.user_id,
            goal.target_amount
        );

        create_notification(
            goal.user_id,
            &NewNotification {
                notification_type: NotificationType::BudgetAlert,
                title: format!("Budget exceeded: {}", category.name),
                message: format!(
                    "You have spent ${spent:.2} of your ${:.2} {} budget for {}.",
                    goal.target_amount, goal.period, category.name
                ),
                priority: NotificationPriority::High,
                action_url: Some(endpoints::BUDGET_GOALS_VIEW.to_owned()),
                action_text: Some("View budget goals".to_owned()),
            },
            connection,
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod budget_goal_tests {
    use time::macros::date;

    use crate::{
        Error,
        category::get_category_by_name,
        notification::{NotificationType, get_notifications},
        test_utils::{create_named_test_user, create_test_user, get_test_connection},
        transaction::{Transaction, TransactionType, create_transaction},
    };

    use super::{
        BudgetPeriod, count_budget_goals, create_budget_goal, days_remaining, delete_budget_goal,
        get_active_budget_goals, get_goal_progress, notify_if_over_budget, progress_percentage,
        remaining_amount,
    };

    #[test]
    fn progress_is_zero_for_zero_target() {
        for spent in [0.0, 1.0, 1e9] {
            assert_eq!(progress_percentage(spent, 0.0), 0.0);
        }
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress_percentage(50.0, 200.0), 25.0);
        assert_eq!(progress_percentage(300.0, 200.0), 100.0);
    }

    #[test]
    fn remaining_is_never_negative() {
        assert_eq!(remaining_amount(50.0, 200.0), 150.0);
        assert_eq!(remaining_amount(250.0, 200.0), 0.0);
    }

    #[test]
    fn days_remaining_stops_at_zero() {
        let today = date!(2025 - 03 - 10);

        assert_eq!(days_remaining(Some(date!(2025 - 03 - 15)), today), 5);
        assert_eq!(days_remaining(Some(date!(2025 - 03 - 01)), today), 0);
        assert_eq!(days_remaining(None, today), 0);
    }

    #[test]
    fn end_date_follows_period() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = get_category_by_name("Food", &connection).unwrap();
        let start = date!(2025 - 01 - 01);

        for (period, want_end) in [
            (BudgetPeriod::Weekly, date!(2025 - 01 - 08)),
            (BudgetPeriod::Monthly, date!(2025 - 01 - 31)),
            (BudgetPeriod::Yearly, date!(2026 - 01 - 01)),
        ] {
            let goal =
                create_budget_goal(user.id, food.id, 100.0, period, start, &connection).unwrap();

            assert_eq!(goal.end_date, Some(want_end));
            assert!(goal.is_active);
        }
        assert_eq!(count_budget_goals(user.id, &connection), Ok(3));
    }

    #[test]
    fn rejects_negative_target_and_missing_category() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = get_category_by_name("Food", &connection).unwrap();
        let start = date!(2025 - 01 - 01);

        assert_eq!(
            create_budget_goal(user.id, food.id, -1.0, BudgetPeriod::Monthly, start, &connection),
            Err(Error::NegativeTargetAmount)
        );
        assert_eq!(
            create_budget_goal(user.id, 9999, 1.0, BudgetPeriod::Monthly, start, &connection),
            Err(Error::InvalidCategory(9999))
        );
    }

    #[test]
    fn progress_counts_expenses_in_window() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = get_category_by_name("Food", &connection).unwrap();
        create_budget_goal(
            user.id,
            food.id,
            100.0,
            BudgetPeriod::Weekly,
            date!(2025 - 03 - 01),
            &connection,
        )
        .unwrap();
        for (amount, transaction_type, date) in [
            (30.0, TransactionType::Expense, date!(2025 - 03 - 02)),
            (40.0, TransactionType::Expense, date!(2025 - 03 - 08)),
            (500.0, TransactionType::Income, date!(2025 - 03 - 03)),
            (80.0, TransactionType::Expense, date!(2025 - 02 - 28)),
            (80.0, TransactionType::Expense, date!(2025 - 03 - 09)),
        ] {
            create_transaction(
                Transaction::build(amount, transaction_type, date, food.id).description("food"),
                user.id,
                &connection,
            )
            .unwrap();
        }

        let progress = get_goal_progress(user.id, date!(2025 - 03 - 05), &connection).unwrap();

        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].current_spent, 70.0);
        assert_eq!(progress[0].progress_percentage, 70.0);
        assert_eq!(progress[0].remaining_amount, 30.0);
        assert!(!progress[0].is_over_budget);
        assert_eq!(progress[0].days_remaining, 3);
        assert_eq!(progress[0].category_name, "Food");
    }

    #[test]
    fn alerts_once_when_crossing_target() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = get_category_by_name("Food", &connection).unwrap();
        let today = date!(2025 - 03 - 05);
        create_budget_goal(user.id, food.id, 50.0, BudgetPeriod::Monthly, today, &connection)
            .unwrap();

        for amount in [40.0, 20.0, 5.0] {
            let transaction = create_transaction(
                Transaction::build(amount, TransactionType::Expense, today, food.id)
                    .description("lunch"),
                user.id,
                &connection,
            )
            .unwrap();
            notify_if_over_budget(&transaction, today, &connection).unwrap();
        }

        let alerts = get_notifications(user.id, &connection)
            .unwrap()
            .into_iter()
            .filter(|notification| notification.notification_type == NotificationType::BudgetAlert)
            .collect::<Vec<_>>();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "Budget exceeded: Food");
        assert_eq!(
            alerts[0].message,
            "You have spent $60.00 of your $50.00 monthly budget for Food."
        );
    }

    #[test]
    fn delete_only_own_goal() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let other_user = create_named_test_user("other", &connection);
        let food = get_category_by_name("Food", &connection).unwrap();
        let goal = create_budget_goal(
            user.id,
            food.id,
            50.0,
            BudgetPeriod::Monthly,
            date!(2025 - 03 - 05),
            &connection,
        )
        .unwrap();

        assert_eq!(
            delete_budget_goal(goal.id, other_user.id, &connection),
            Err(Error::DeleteMissingBudgetGoal)
        );
        assert_eq!(delete_budget_goal(goal.id, user.id, &connection), Ok(()));
        assert!(get_active_budget_goals(user.id, &connection).unwrap().is_empty());
    }
}
