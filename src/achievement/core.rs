use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error,
    achievement::UserMetrics,
    auth::UserID,
    endpoints,
    notification::{NewNotification, NotificationPriority, NotificationType, create_notification},
};

pub type AchievementId = i64;

/// A milestone that users can earn once.
#[derive(Debug, Clone, PartialEq)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub badge_color: String,
    /// Which metric is compared against `condition_value`, e.g. "transaction_count".
    pub condition_type: String,
    pub condition_value: f64,
    pub points: u32,
    pub is_active: bool,
}

/// An achievement a user has earned.
#[derive(Debug, Clone, PartialEq)]
pub struct EarnedAchievement {
    pub achievement_id: AchievementId,
    pub earned_at: Date,
    /// The user's metric value when the achievement was earned.
    pub progress: f64,
}

struct DefaultAchievement {
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    badge_color: &'static str,
    points: u32,
    condition_type: &'static str,
    condition_value: f64,
}

const DEFAULT_ACHIEVEMENTS: [DefaultAchievement; 12] = [
    DefaultAchievement {
        name: "First Steps",
        description: "Add your first transaction",
        icon: "baby",
        badge_color: "#28a745",
        points: 10,
        condition_type: "transaction_count",
        condition_value: 1.0,
    },
    DefaultAchievement {
        name: "Getting Started",
        description: "Add 10 transactions",
        icon: "seedling",
        badge_color: "#20c997",
        points: 25,
        condition_type: "transaction_count",
        condition_value: 10.0,
    },
    DefaultAchievement {
        name: "Transaction Master",
        description: "Add 100 transactions",
        icon: "chart-line",
        badge_color: "#17a2b8",
        points: 100,
        condition_type: "transaction_count",
        condition_value: 100.0,
    },
    DefaultAchievement {
        name: "Budget Planner",
        description: "Create your first budget goal",
        icon: "bullseye",
        badge_color: "#6f42c1",
        points: 20,
        condition_type: "budget_goals_count",
        condition_value: 1.0,
    },
    DefaultAchievement {
        name: "Budget Master",
        description: "Stay within budget for 30 days",
        icon: "crown",
        badge_color: "#ffc107",
        points: 50,
        condition_type: "budget_success_days",
        condition_value: 30.0,
    },
    DefaultAchievement {
        name: "Savings Champion",
        description: "Save $1000 in a single month",
        icon: "piggy-bank",
        badge_color: "#28a745",
        points: 100,
        condition_type: "monthly_savings",
        condition_value: 1000.0,
    },
    DefaultAchievement {
        name: "Category Explorer",
        description: "Use 8 different categories",
        icon: "tags",
        badge_color: "#fd7e14",
        points: 30,
        condition_type: "categories_used",
        condition_value: 8.0,
    },
    DefaultAchievement {
        name: "AI Enthusiast",
        description: "Apply 10 smart recommendations",
        icon: "robot",
        badge_color: "#6f42c1",
        points: 75,
        condition_type: "ai_recommendations_used",
        condition_value: 10.0,
    },
    DefaultAchievement {
        name: "Receipt Scanner Pro",
        description: "Scan 25 receipts",
        icon: "camera",
        badge_color: "#fd7e14",
        points: 60,
        condition_type: "receipts_scanned",
        condition_value: 25.0,
    },
    DefaultAchievement {
        name: "Consistency King",
        description: "Log transactions for 30 consecutive days",
        icon: "calendar-check",
        badge_color: "#20c997",
        points: 80,
        condition_type: "consecutive_days",
        condition_value: 30.0,
    },
    DefaultAchievement {
        name: "Power User",
        description: "Use all major features of the app",
        icon: "star",
        badge_color: "#ffc107",
        points: 150,
        condition_type: "features_used",
        condition_value: 5.0,
    },
    DefaultAchievement {
        name: "Financial Guru",
        description: "Maintain positive balance for 90 days",
        icon: "gem",
        badge_color: "#6f42c1",
        points: 200,
        condition_type: "positive_balance_days",
        condition_value: 90.0,
    },
];

pub fn create_achievement_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS achievement (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            icon TEXT NOT NULL,
            badge_color TEXT NOT NULL,
            condition_type TEXT NOT NULL,
            condition_value REAL NOT NULL,
            points INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS user_achievement (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            achievement_id INTEGER NOT NULL,
            earned_at TEXT NOT NULL,
            progress REAL NOT NULL DEFAULT 0,
            UNIQUE(user_id, achievement_id),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(achievement_id) REFERENCES achievement(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )
}

/// Insert the built-in achievements. Existing achievements with the same
/// name are left alone.
pub fn seed_default_achievements(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement = connection.prepare(
        "INSERT OR IGNORE INTO achievement
            (name, description, icon, badge_color, condition_type, condition_value, points)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    for achievement in &DEFAULT_ACHIEVEMENTS {
        statement.execute((
            achievement.name,
            achievement.description,
            achievement.icon,
            achievement.badge_color,
            achievement.condition_type,
            achievement.condition_value,
            achievement.points,
        ))?;
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<Achievement, rusqlite::Error> {
    Ok(Achievement {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        badge_color: row.get(4)?,
        condition_type: row.get(5)?,
        condition_value: row.get(6)?,
        points: row.get(7)?,
        is_active: row.get(8)?,
    })
}

pub fn get_all_achievements(connection: &Connection) -> Result<Vec<Achievement>, Error> {
    connection
        .prepare(
            "SELECT id, name, description, icon, badge_color, condition_type, condition_value,
                points, is_active
            FROM achievement
            ORDER BY id ASC",
        )?
        .query_map((), map_row)?
        .map(|maybe_achievement| maybe_achievement.map_err(Error::from))
        .collect()
}

pub fn get_earned_achievements(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<EarnedAchievement>, Error> {
    connection
        .prepare(
            "SELECT achievement_id, earned_at, progress FROM user_achievement
            WHERE user_id = ?1
            ORDER BY earned_at ASC, id ASC",
        )?
        .query_map([user_id.as_i64()], |row| {
            Ok(EarnedAchievement {
                achievement_id: row.get(0)?,
                earned_at: row.get(1)?,
                progress: row.get(2)?,
            })
        })?
        .map(|maybe_earned| maybe_earned.map_err(Error::from))
        .collect()
}

/// Award every active achievement whose condition `user_id` now meets and
/// has not earned yet, sending a notification for each.
///
/// Returns the newly earned achievements.
///
/// # Errors
/// Returns an [Error::SqlError] if the metrics cannot be loaded or an award
/// cannot be stored.
pub fn award_achievements(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<Vec<Achievement>, Error> {
    let metrics = UserMetrics::load(user_id, connection)?;
    let earned = get_earned_achievements(user_id, connection)?;

    let mut awarded = Vec::new();

    for achievement in get_all_achievements(connection)? {
        if !achievement.is_active
            || earned
                .iter()
                .any(|earned| earned.achievement_id == achievement.id)
        {
            continue;
        }

        let Some(value) = metrics.value_for(&achievement.condition_type) else {
            continue;
        };

        if value < achievement.condition_value {
            continue;
        }

        let inserted = connection.execute(
            "INSERT OR IGNORE INTO user_achievement (user_id, achievement_id, earned_at, progress)
            VALUES (?1, ?2, ?3, ?4)",
            (user_id.as_i64(), achievement.id, today, value),
        )?;

        if inserted == 0 {
            continue;
        }

        tracing::info!("User {user_id} earned achievement {}", achievement.name);

        create_notification(
            user_id,
            &NewNotification {
                notification_type: NotificationType::Achievement,
                title: format!("Achievement unlocked: {}", achievement.name),
                message: format!("{} (+{} points)", achievement.description, achievement.points),
                priority: NotificationPriority::Normal,
                action_url: Some(endpoints::ACHIEVEMENTS_VIEW.to_owned()),
                action_text: Some("View achievements".to_owned()),
            },
            connection,
        )?;

        awarded.push(achievement);
    }

    Ok(awarded)
}
