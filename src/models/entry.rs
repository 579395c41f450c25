use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub journal_content: String,
    pub mood_score: i32,
    pub ai_summary: Option<String>,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub habit_logs: Vec<HabitLog>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HabitLog {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub entry_id: Uuid,
    pub habit_name: String,
    pub completed: bool,
    #[serde(skip_serializing)]
    pub position: i64,
}

/// Body of `POST /api/entries` and `PUT /api/entries/:id`.
///
/// `habits: None` leaves an existing entry's habit logs untouched; `Some`
/// (even empty) replaces them.
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub journal: String,
    pub habits: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: Uuid,
}
