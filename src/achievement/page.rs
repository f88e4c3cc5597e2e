//! The achievements page.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    achievement::{
        Achievement, AchievementId, award_achievements, get_all_achievements,
        get_earned_achievements,
    },
    auth::UserID,
    endpoints,
    html::{CARD_STYLE, PAGE_CONTAINER_STYLE, base, page_header},
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed for the achievements page.
#[derive(Debug, Clone)]
pub struct AchievementsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for AchievementsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Check for newly met achievements, then list all achievements with the
/// ones the user has earned highlighted.
pub async fn get_achievements_page(
    State(state): State<AchievementsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    if let Err(error) = award_achievements(user_id, today, &connection) {
        tracing::error!("Could not award achievements to user {user_id}: {error}");
    }

    let achievements = get_all_achievements(&connection)
        .inspect_err(|error| tracing::error!("Could not get achievements: {error}"))?;
    let earned = get_earned_achievements(user_id, &connection)?
        .into_iter()
        .map(|earned| (earned.achievement_id, earned.earned_at))
        .collect::<HashMap<_, _>>();

    Ok(achievements_view(&achievements, &earned).into_response())
}

fn achievement_card(achievement: &Achievement, earned_at: Option<&Date>) -> Markup {
    let card_style = if earned_at.is_some() {
        "border-2"
    } else {
        "border-2 border-dashed opacity-60"
    };

    html!(
        li
            class={ (CARD_STYLE) " " (card_style) }
            style=(format!("border-color: {}", achievement.badge_color))
            data-achievement=(achievement.name)
            data-earned=[earned_at.map(|_| "true")]
        {
            div class="flex items-center justify-between gap-2"
            {
                h2 class="font-semibold" { (achievement.name) }
                span
                    class="rounded-full px-2 py-0.5 text-xs font-semibold text-white"
                    style=(format!("background-color: {}", achievement.badge_color))
                {
                    (achievement.points) " pts"
                }
            }

            p class="mt-1 text-sm text-gray-600 dark:text-gray-300" { (achievement.description) }

            @if let Some(earned_at) = earned_at {
                p class="mt-2 text-xs text-gray-500 dark:text-gray-400" { "Earned " (earned_at) }
            }
        }
    )
}

fn achievements_view(achievements: &[Achievement], earned: &HashMap<AchievementId, Date>) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACHIEVEMENTS_VIEW).into_html();
    let total_points: u32 = achievements
        .iter()
        .filter(|achievement| earned.contains_key(&achievement.id))
        .map(|achievement| achievement.points)
        .sum();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-5xl space-y-4"
            {
                (page_header("Achievements", None))

                p class="text-sm text-gray-600 dark:text-gray-300"
                {
                    (earned.len()) " of " (achievements.len()) " earned, "
                    span data-total-points="true" class="font-semibold" { (total_points) }
                    " points"
                }

                ul class="grid gap-4 md:grid-cols-2 lg:grid-cols-3"
                {
                    @for achievement in achievements {
                        (achievement_card(achievement, earned.get(&achievement.id)))
                    }
                }
            }
        }
    );

    base("Achievements", &[], &content)
}

#[cfg(test)]
mod achievements_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use scraper::Selector;
    use time::OffsetDateTime;

    use crate::{
        test_utils::{
            assert_valid_html, create_test_user, get_test_connection, parse_html_document,
        },
        transaction::{Transaction, TransactionType, create_transaction},
    };

    use super::{AchievementsPageState, get_achievements_page};

    #[tokio::test]
    async fn awards_and_highlights_earned_achievements() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        create_transaction(
            Transaction::build(
                5.0,
                TransactionType::Expense,
                OffsetDateTime::now_utc().date(),
                1,
            )
            .description("Coffee"),
            user.id,
            &connection,
        )
        .unwrap();
        let state = AchievementsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = get_achievements_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let all = html
            .select(&Selector::parse("[data-achievement]").unwrap())
            .count();
        assert_eq!(all, 12);
        let earned = html
            .select(&Selector::parse("[data-earned]").unwrap())
            .map(|element| element.value().attr("data-achievement").unwrap().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(earned, ["First Steps"]);
        let points = html
            .select(&Selector::parse("[data-total-points]").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert_eq!(points, "10");
    }
}
