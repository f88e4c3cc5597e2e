//! Budget goal deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    budget_goal::{BudgetGoalId, delete_budget_goal},
};

/// The state needed to delete a budget goal.
#[derive(Debug, Clone)]
pub struct DeleteBudgetGoalState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteBudgetGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn delete_budget_goal_endpoint(
    State(state): State<DeleteBudgetGoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<BudgetGoalId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_budget_goal(goal_id, user_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Budget goal deleted successfully".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingBudgetGoal) => Error::DeleteMissingBudgetGoal.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not delete budget goal {goal_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_budget_goal_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use time::macros::date;

    use crate::{
        budget_goal::{BudgetPeriod, create_budget_goal, get_active_budget_goals},
        category::get_category_by_name,
        test_utils::{create_test_user, get_test_connection},
    };

    use super::{DeleteBudgetGoalState, delete_budget_goal_endpoint};

    #[tokio::test]
    async fn deletes_goal_then_reports_missing() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = get_category_by_name("Food", &connection).unwrap();
        let goal = create_budget_goal(
            user.id,
            food.id,
            100.0,
            BudgetPeriod::Monthly,
            date!(2025 - 01 - 01),
            &connection,
        )
        .unwrap();
        let state = DeleteBudgetGoalState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            delete_budget_goal_endpoint(State(state.clone()), Extension(user.id), Path(goal.id))
                .await
                .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            get_active_budget_goals(user.id, &state.db_connection.lock().unwrap())
                .unwrap()
                .is_empty()
        );

        let response =
            delete_budget_goal_endpoint(State(state.clone()), Extension(user.id), Path(goal.id))
                .await
                .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
