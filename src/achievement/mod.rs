//! Badges awarded for reaching milestones, e.g. logging a first transaction.

mod core;
mod metrics;
mod page;

pub use core::{
    Achievement, AchievementId, EarnedAchievement, award_achievements, create_achievement_tables,
    get_all_achievements, get_earned_achievements, seed_default_achievements,
};
pub use metrics::{UserMetrics, best_monthly_savings, longest_daily_streak};
pub use page::{AchievementsPageState, get_achievements_page};
