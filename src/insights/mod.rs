//! Smart insights: stored recommendations, the insights page and the JSON
//! analytics endpoints.

mod actions;
mod api;
mod core;
mod page;

pub use actions::{
    RecommendationActionState, apply_recommendation_endpoint, mark_recommendation_read_endpoint,
};
pub use api::{
    AnalyticsApiState, get_chart_data, get_live_balance, get_predictions, get_spending_trends,
};
pub use core::{
    RecommendationId, StoredRecommendation, apply_recommendation, count_applied_recommendations,
    create_recommendation_table, get_pending_recommendations, mark_recommendation_read,
    regenerate_recommendations, store_recommendation, top_recommendations,
};
pub use page::{InsightsPageState, get_insights_page};
