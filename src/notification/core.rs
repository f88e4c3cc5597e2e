use std::str::FromStr;

use rusqlite::{Connection, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, auth::UserID, db::impl_text_column};

/// What caused a notification to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    BudgetAlert,
    Achievement,
    Recommendation,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::BudgetAlert => "budget_alert",
            NotificationType::Achievement => "achievement",
            NotificationType::Recommendation => "recommendation",
        }
    }
}

impl FromStr for NotificationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "budget_alert" => Ok(NotificationType::BudgetAlert),
            "achievement" => Ok(NotificationType::Achievement),
            "recommendation" => Ok(NotificationType::Recommendation),
            other => Err(Error::InvalidEnumValue {
                kind: "notification type",
                value: other.to_owned(),
            }),
        }
    }
}

/// How prominently a notification is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Normal => "normal",
            NotificationPriority::High => "high",
            NotificationPriority::Urgent => "urgent",
        }
    }
}

impl FromStr for NotificationPriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(NotificationPriority::Low),
            "normal" => Ok(NotificationPriority::Normal),
            "high" => Ok(NotificationPriority::High),
            "urgent" => Ok(NotificationPriority::Urgent),
            other => Err(Error::InvalidEnumValue {
                kind: "notification priority",
                value: other.to_owned(),
            }),
        }
    }
}

impl_text_column!(NotificationType);
impl_text_column!(NotificationPriority);

pub type NotificationId = i64;

/// A message shown in the user's notification centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserID,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub is_read: bool,
    /// A page the user can visit to act on the notification.
    pub action_url: Option<String>,
    pub action_text: Option<String>,
    pub created_at: OffsetDateTime,
    pub read_at: Option<OffsetDateTime>,
}

/// The fields needed to send a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub action_url: Option<String>,
    pub action_text: Option<String>,
}

pub fn create_notification_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS notification (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            type TEXT NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            priority TEXT NOT NULL DEFAULT 'normal',
            is_read INTEGER NOT NULL DEFAULT 0,
            action_url TEXT,
            action_text TEXT,
            created_at TEXT NOT NULL,
            read_at TEXT,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_notification_user_created
        ON notification(user_id, created_at)",
        (),
    )?;

    Ok(())
}

/// Store a new unread notification for `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if the insert fails.
pub fn create_notification(
    user_id: UserID,
    notification: &NewNotification,
    connection: &Connection,
) -> Result<Notification, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection
        .prepare(
            "INSERT INTO notification
                (user_id, type, title, message, priority, action_url, action_text, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING id, user_id, type, title, message, priority, is_read, action_url,
                action_text, created_at, read_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                notification.notification_type,
                &notification.title,
                &notification.message,
                notification.priority,
                &notification.action_url,
                &notification.action_text,
                created_at,
            ),
            map_row,
        )
        .map_err(Error::from)
}

fn map_row(row: &Row) -> Result<Notification, rusqlite::Error> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        notification_type: row.get(2)?,
        title: row.get(3)?,
        message: row.get(4)?,
        priority: row.get(5)?,
        is_read: row.get(6)?,
        action_url: row.get(7)?,
        action_text: row.get(8)?,
        created_at: row.get(9)?,
        read_at: row.get(10)?,
    })
}

/// All of `user_id`'s notifications, newest first.
pub fn get_notifications(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Notification>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, type, title, message, priority, is_read, action_url,
                action_text, created_at, read_at
            FROM notification
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC",
        )?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_notification| maybe_notification.map_err(Error::from))
        .collect()
}

pub fn count_unread_notifications(user_id: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(1) FROM notification WHERE user_id = ?1 AND is_read = 0",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Mark every unread notification of `user_id` as read at `read_at`.
///
/// Returns the number of notifications that changed.
pub fn mark_all_notifications_read(
    user_id: UserID,
    read_at: OffsetDateTime,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE notification SET is_read = 1, read_at = ?1
            WHERE user_id = ?2 AND is_read = 0",
            (read_at, user_id.as_i64()),
        )
        .map_err(Error::from)
}
