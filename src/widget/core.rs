use std::str::FromStr;

use rusqlite::{Connection, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, auth::UserID, db::impl_text_column};

/// What a dashboard widget displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetType {
    Balance,
    SpendingChart,
    Goals,
    Recommendations,
}

impl WidgetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::Balance => "balance",
            WidgetType::SpendingChart => "spending_chart",
            WidgetType::Goals => "goals",
            WidgetType::Recommendations => "recommendations",
        }
    }
}

impl FromStr for WidgetType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balance" => Ok(WidgetType::Balance),
            "spending_chart" => Ok(WidgetType::SpendingChart),
            "goals" => Ok(WidgetType::Goals),
            "recommendations" => Ok(WidgetType::Recommendations),
            other => Err(Error::InvalidEnumValue {
                kind: "widget type",
                value: other.to_owned(),
            }),
        }
    }
}

impl_text_column!(WidgetType);

pub type WidgetId = i64;

/// A widget on the user's custom dashboard, placed on a 12 column grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardWidget {
    pub id: WidgetId,
    pub user_id: UserID,
    pub widget_type: WidgetType,
    pub title: String,
    pub position_x: u8,
    pub position_y: u8,
    /// Grid columns, 1 to 12.
    pub width: u8,
    /// Grid rows.
    pub height: u8,
    /// Widget specific settings as a JSON object.
    pub config: String,
    pub is_visible: bool,
    pub created_at: OffsetDateTime,
}

/// type, title, x, y, width, height
const DEFAULT_WIDGETS: [(WidgetType, &str, u8, u8, u8, u8); 4] = [
    (WidgetType::Balance, "Current Balance", 0, 0, 4, 2),
    (WidgetType::SpendingChart, "Monthly Spending", 4, 0, 4, 3),
    (WidgetType::Goals, "Budget Goals", 8, 0, 4, 3),
    (WidgetType::Recommendations, "Smart Tips", 0, 2, 4, 2),
];

pub fn create_widget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS dashboard_widget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            widget_type TEXT NOT NULL,
            title TEXT NOT NULL,
            position_x INTEGER NOT NULL DEFAULT 0,
            position_y INTEGER NOT NULL DEFAULT 0,
            width INTEGER NOT NULL DEFAULT 4 CHECK (width BETWEEN 1 AND 12),
            height INTEGER NOT NULL DEFAULT 3,
            config TEXT NOT NULL DEFAULT '{}',
            is_visible INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<DashboardWidget, rusqlite::Error> {
    Ok(DashboardWidget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        widget_type: row.get(2)?,
        title: row.get(3)?,
        position_x: row.get(4)?,
        position_y: row.get(5)?,
        width: row.get(6)?,
        height: row.get(7)?,
        config: row.get(8)?,
        is_visible: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// The user's visible widgets ordered top to bottom, then left to right.
pub fn get_visible_widgets(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<DashboardWidget>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, widget_type, title, position_x, position_y, width, height,
                config, is_visible, created_at
            FROM dashboard_widget
            WHERE user_id = ?1 AND is_visible = 1
            ORDER BY position_y, position_x, id",
        )?
        .query_map([user_id.as_i64()], map_row)?
        .map(|result| result.map_err(Error::from))
        .collect()
}

/// The user's visible widgets, creating the default layout first if they
/// have none.
///
/// # Errors
/// Returns an [Error::SqlError] if the widgets could not be read or created.
pub fn get_or_create_widgets(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<DashboardWidget>, Error> {
    let widgets = get_visible_widgets(user_id, connection)?;

    if !widgets.is_empty() {
        return Ok(widgets);
    }

    let created_at = OffsetDateTime::now_utc();
    let transaction = connection.unchecked_transaction()?;
    {
        let mut statement = transaction.prepare(
            "INSERT INTO dashboard_widget
                (user_id, widget_type, title, position_x, position_y, width, height, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;

        for (widget_type, title, x, y, width, height) in DEFAULT_WIDGETS {
            statement.execute((
                user_id.as_i64(),
                widget_type,
                title,
                x,
                y,
                width,
                height,
                created_at,
            ))?;
        }
    }
    transaction.commit()?;

    tracing::info!("Created default dashboard widgets for user {user_id}");

    get_visible_widgets(user_id, connection)
}
