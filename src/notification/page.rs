//! The notification centre.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{OffsetDateTime, UtcOffset, macros::format_description};

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    html::{CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, page_header},
    navigation::NavBar,
    notification::{
        Notification, NotificationPriority, get_notifications, mark_all_notifications_read,
    },
    timezone::get_local_offset,
};

/// The state needed for the notification centre.
#[derive(Debug, Clone)]
pub struct NotificationsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for NotificationsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// List the user's notifications, newest first, and mark them as read.
///
/// Notifications that were unread before the page was opened are highlighted.
pub async fn get_notifications_page(
    State(state): State<NotificationsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let notifications = get_notifications(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get notifications: {error}"))?;

    let marked = mark_all_notifications_read(user_id, OffsetDateTime::now_utc(), &connection)
        .inspect_err(|error| tracing::error!("Could not mark notifications as read: {error}"))?;
    tracing::debug!("Marked {marked} notifications as read for user {user_id}");

    Ok(notifications_view(&notifications, local_offset).into_response())
}

fn priority_style(priority: NotificationPriority) -> &'static str {
    match priority {
        NotificationPriority::Low => "border-l-4 border-gray-300",
        NotificationPriority::Normal => "border-l-4 border-blue-400",
        NotificationPriority::High => "border-l-4 border-orange-500",
        NotificationPriority::Urgent => "border-l-4 border-red-600",
    }
}

fn notification_card(notification: &Notification, local_offset: UtcOffset) -> Markup {
    let created_at = notification
        .created_at
        .to_offset(local_offset)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_default();

    html!(
        li
            class={ (CARD_STYLE) " " (priority_style(notification.priority)) }
            data-notification="true"
            data-unread=[(!notification.is_read).then_some("true")]
        {
            div class="flex items-start justify-between gap-3"
            {
                h2 class="font-semibold"
                {
                    @if !notification.is_read {
                        span class="mr-2 inline-block h-2 w-2 rounded-full bg-blue-500" {}
                    }
                    (notification.title)
                }

                span class="text-xs text-gray-500 dark:text-gray-400" { (created_at) }
            }

            p class="mt-1 text-sm text-gray-700 dark:text-gray-300" { (notification.message) }

            @if let Some(action_url) = &notification.action_url {
                a href=(action_url) class={ "mt-2 inline-block text-sm " (LINK_STYLE) }
                {
                    (notification.action_text.as_deref().unwrap_or("View"))
                }
            }
        }
    )
}

fn notifications_view(notifications: &[Notification], local_offset: UtcOffset) -> Markup {
    let nav_bar = NavBar::new(endpoints::NOTIFICATIONS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-2xl space-y-4"
            {
                (page_header("Notifications", None))

                @if notifications.is_empty() {
                    p class="text-gray-500 dark:text-gray-400" { "You have no notifications." }
                } @else {
                    ul class="space-y-3"
                    {
                        @for notification in notifications {
                            (notification_card(notification, local_offset))
                        }
                    }
                }
            }
        }
    );

    base("Notifications", &[], &content)
}
