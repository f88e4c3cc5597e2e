//! Spending targets per category and the alerts sent when they are exceeded.

mod core;
mod create;
mod delete;
mod list;

pub use core::{
    BudgetGoal, BudgetGoalId, BudgetPeriod, GoalProgress, count_budget_goals,
    create_budget_goal, create_budget_goal_table, current_spent, days_remaining,
    delete_budget_goal, get_active_budget_goals, get_goal_progress, notify_if_over_budget,
    progress_percentage, remaining_amount,
};
pub use create::{CreateBudgetGoalState, create_budget_goal_endpoint, get_new_budget_goal_page};
pub use delete::{DeleteBudgetGoalState, delete_budget_goal_endpoint};
pub use list::{BudgetGoalsPageState, get_budget_goals_page};
