use rusqlite::{Connection, Row};
use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    analytics::{
        Priority, RecommendationDraft, RecommendationType, analyze_spending_patterns,
        calculate_balance, generate_recommendations,
    },
    auth::UserID,
    transaction::query::TransactionRow,
};

/// How long a stored recommendation stays relevant.
const RECOMMENDATION_LIFETIME: Duration = Duration::days(7);

pub type RecommendationId = i64;

/// A recommendation that has been saved for a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecommendation {
    pub id: RecommendationId,
    #[serde(skip)]
    pub user_id: UserID,
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub impact_score: f64,
    pub is_read: bool,
    pub is_applied: bool,
    #[serde(skip)]
    pub created_at: OffsetDateTime,
    #[serde(skip)]
    pub expires_at: OffsetDateTime,
}

pub fn create_recommendation_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recommendation (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            type TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            priority TEXT NOT NULL DEFAULT 'medium',
            impact_score REAL NOT NULL DEFAULT 0,
            is_read INTEGER NOT NULL DEFAULT 0,
            is_applied INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_recommendation_user ON recommendation(user_id)",
        (),
    )?;

    // One row per distinct piece of advice a user has acted on.
    connection.execute(
        "CREATE TABLE IF NOT EXISTS applied_recommendation (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            type TEXT NOT NULL,
            title TEXT NOT NULL,
            applied_at TEXT NOT NULL,
            UNIQUE(user_id, type, title),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

const COLUMNS: &str =
    "id, user_id, type, title, description, priority, impact_score, is_read, is_applied, created_at, expires_at";

fn map_row(row: &Row) -> Result<StoredRecommendation, rusqlite::Error> {
    Ok(StoredRecommendation {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        recommendation_type: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        priority: row.get(5)?,
        impact_score: row.get(6)?,
        is_read: row.get(7)?,
        is_applied: row.get(8)?,
        created_at: row.get(9)?,
        expires_at: row.get(10)?,
    })
}

/// Save `draft` for `user_id`, expiring a week from now.
///
/// Advice the user has applied before is stored as already read and applied.
///
/// # Errors
/// Returns an [Error::SqlError] if the insert fails.
pub fn store_recommendation(
    user_id: UserID,
    draft: &RecommendationDraft,
    connection: &Connection,
) -> Result<StoredRecommendation, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO recommendation
                (user_id, type, title, description, priority, impact_score, created_at, expires_at,
                 is_read, is_applied)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, applied, applied
            FROM (SELECT EXISTS(
                SELECT 1 FROM applied_recommendation
                WHERE user_id = ?1 AND type = ?2 AND title = ?3
            ) AS applied)
            RETURNING {COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                draft.recommendation_type,
                &draft.title,
                &draft.description,
                draft.priority,
                draft.impact_score,
                created_at,
                created_at + RECOMMENDATION_LIFETIME,
            ),
            map_row,
        )
        .map_err(Error::from)
}

/// Replace all of the user's stored recommendations with fresh ones computed
/// from `ledger`, returning the new set highest impact first.
///
/// The tally of applied advice lives in its own table and survives this.
///
/// # Errors
/// Returns an [Error::SqlError] if the database could not be updated. No
/// changes are made in that case.
pub fn regenerate_recommendations(
    user_id: UserID,
    ledger: &[TransactionRow],
    connection: &Connection,
) -> Result<Vec<StoredRecommendation>, Error> {
    let patterns = analyze_spending_patterns(ledger);
    let drafts = generate_recommendations(&patterns, calculate_balance(ledger));

    let transaction = connection.unchecked_transaction()?;
    transaction.execute(
        "DELETE FROM recommendation WHERE user_id = ?1",
        [user_id.as_i64()],
    )?;

    let stored = drafts
        .iter()
        .map(|draft| store_recommendation(user_id, draft, &transaction))
        .collect::<Result<Vec<_>, _>>()?;

    transaction.commit()?;

    Ok(stored)
}

/// The user's recommendations that have not been applied, highest impact first.
pub fn get_pending_recommendations(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<StoredRecommendation>, Error> {
    top_recommendations(user_id, None, connection)
}

/// Up to `limit` pending, unexpired recommendations, highest impact first.
/// `None` returns all of them.
pub fn top_recommendations(
    user_id: UserID,
    limit: Option<u32>,
    connection: &Connection,
) -> Result<Vec<StoredRecommendation>, Error> {
    let now = OffsetDateTime::now_utc();
    let limit = limit.map_or(usize::MAX, |limit| limit as usize);

    let pending = connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM recommendation WHERE user_id = ?1 AND is_applied = 0
            ORDER BY impact_score DESC, id ASC"
        ))?
        .query_map([user_id.as_i64()], map_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(pending
        .into_iter()
        .filter(|recommendation| recommendation.expires_at > now)
        .take(limit)
        .collect())
}

fn update_flags(
    sql: &str,
    recommendation_id: RecommendationId,
    user_id: UserID,
    connection: &Connection,
) -> Result<StoredRecommendation, Error> {
    let rows_affected = connection.execute(sql, (recommendation_id, user_id.as_i64()))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingRecommendation);
    }

    connection
        .prepare(&format!("SELECT {COLUMNS} FROM recommendation WHERE id = ?1"))?
        .query_row([recommendation_id], map_row)
        .map_err(Error::from)
}

/// Mark one of the user's recommendations as read.
///
/// # Errors
/// Returns [Error::UpdateMissingRecommendation] if the recommendation does
/// not exist or belongs to another user.
pub fn mark_recommendation_read(
    recommendation_id: RecommendationId,
    user_id: UserID,
    connection: &Connection,
) -> Result<StoredRecommendation, Error> {
    update_flags(
        "UPDATE recommendation SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
        recommendation_id,
        user_id,
        connection,
    )
}

/// Mark one of the user's recommendations as applied, which also marks it as read.
///
/// Applying the same advice again, e.g. after it was regenerated, does not
/// add to [count_applied_recommendations].
///
/// # Errors
/// Returns [Error::UpdateMissingRecommendation] if the recommendation does
/// not exist or belongs to another user.
pub fn apply_recommendation(
    recommendation_id: RecommendationId,
    user_id: UserID,
    connection: &Connection,
) -> Result<StoredRecommendation, Error> {
    let transaction = connection.unchecked_transaction()?;

    let recommendation = update_flags(
        "UPDATE recommendation SET is_applied = 1, is_read = 1 WHERE id = ?1 AND user_id = ?2",
        recommendation_id,
        user_id,
        &transaction,
    )?;

    transaction.execute(
        "INSERT OR IGNORE INTO applied_recommendation (user_id, type, title, applied_at)
        VALUES (?1, ?2, ?3, ?4)",
        (
            user_id.as_i64(),
            recommendation.recommendation_type,
            &recommendation.title,
            OffsetDateTime::now_utc(),
        ),
    )?;

    transaction.commit()?;

    Ok(recommendation)
}

/// How many distinct pieces of advice the user has applied.
pub fn count_applied_recommendations(
    user_id: UserID,
    connection: &Connection,
) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM applied_recommendation WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(Error::from)
}
