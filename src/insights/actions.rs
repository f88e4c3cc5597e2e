//! Endpoints for marking a recommendation as read or applied.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    achievement::award_achievements,
    auth::UserID,
    insights::{
        RecommendationId, apply_recommendation, mark_recommendation_read, page::recommendation_card,
    },
    timezone::local_today,
};

/// The state needed to update a recommendation.
#[derive(Debug, Clone)]
pub struct RecommendationActionState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for RecommendationActionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Mark a recommendation as read and respond with its updated card.
pub async fn mark_recommendation_read_endpoint(
    State(state): State<RecommendationActionState>,
    Extension(user_id): Extension<UserID>,
    Path(recommendation_id): Path<RecommendationId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match mark_recommendation_read(recommendation_id, user_id, &connection) {
        Ok(recommendation) => recommendation_card(&recommendation).into_response(),
        Err(Error::UpdateMissingRecommendation) => {
            Error::UpdateMissingRecommendation.into_alert_response()
        }
        Err(error) => {
            tracing::error!("Could not mark recommendation {recommendation_id} as read: {error}");
            error.into_alert_response()
        }
    }
}

/// Mark a recommendation as applied, check for newly earned achievements and
/// respond with the updated card.
pub async fn apply_recommendation_endpoint(
    State(state): State<RecommendationActionState>,
    Extension(user_id): Extension<UserID>,
    Path(recommendation_id): Path<RecommendationId>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let recommendation = match apply_recommendation(recommendation_id, user_id, &connection) {
        Ok(recommendation) => recommendation,
        Err(Error::UpdateMissingRecommendation) => {
            return Error::UpdateMissingRecommendation.into_alert_response();
        }
        Err(error) => {
            tracing::error!("Could not apply recommendation {recommendation_id}: {error}");
            return error.into_alert_response();
        }
    };

    tracing::info!("User {user_id} applied recommendation {recommendation_id}");

    if let Err(error) = award_achievements(user_id, today, &connection) {
        tracing::error!("Could not award achievements to user {user_id}: {error}");
    }

    recommendation_card(&recommendation).into_response()
}
