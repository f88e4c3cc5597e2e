//! In-app notifications for budget alerts, achievements and recommendations.

mod core;
mod page;

pub use core::{
    NewNotification, Notification, NotificationId, NotificationPriority, NotificationType,
    count_unread_notifications, create_notification, create_notification_table,
    get_notifications, mark_all_notifications_read,
};
pub use page::{NotificationsPageState, get_notifications_page};
