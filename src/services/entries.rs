use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::entry::{DailyEntry, EntryRequest, HabitLog};
use crate::models::user::User;
use crate::services::mood::{MoodAnalysis, MoodAnalyzer};

/// Resolve a token subject to its user row. A valid token for a user that no
/// longer exists is an internal error, not an auth failure.
pub async fn resolve_user(db: &SqlitePool, username: &str) -> AppResult<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "authenticated user '{}' has no user record",
                username
            ))
        })
}

pub async fn create_entry(
    db: &SqlitePool,
    analyzer: &MoodAnalyzer,
    username: &str,
    req: EntryRequest,
) -> AppResult<DailyEntry> {
    let user = resolve_user(db, username).await?;
    let analysis = analyzer.analyze(&req.journal).await;
    let now = Utc::now();

    let mut tx = db.begin().await?;

    let mut entry = sqlx::query_as::<_, DailyEntry>(
        r#"
        INSERT INTO daily_entries
            (id, user_id, entry_date, journal_content, mood_score, ai_summary, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(now.date_naive())
    .bind(&req.journal)
    .bind(analysis.mood_score)
    .bind(&analysis.summary)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(habits) = &req.habits {
        entry.habit_logs = replace_habit_logs(&mut tx, entry.id, habits).await?;
    }

    tx.commit().await?;

    tracing::info!(user = %username, entry_id = %entry.id, mood = entry.mood_score, "Entry created");
    Ok(entry)
}

pub async fn list_entries(db: &SqlitePool, username: &str) -> AppResult<Vec<DailyEntry>> {
    let user = resolve_user(db, username).await?;

    let mut entries = sqlx::query_as::<_, DailyEntry>(
        "SELECT * FROM daily_entries WHERE user_id = ? ORDER BY rowid ASC",
    )
    .bind(user.id)
    .fetch_all(db)
    .await?;

    let logs = sqlx::query_as::<_, HabitLog>(
        r#"
        SELECT hl.* FROM habit_logs hl
        JOIN daily_entries e ON e.id = hl.entry_id
        WHERE e.user_id = ?
        ORDER BY hl.position ASC
        "#,
    )
    .bind(user.id)
    .fetch_all(db)
    .await?;

    let mut by_entry: HashMap<Uuid, Vec<HabitLog>> = HashMap::new();
    for log in logs {
        by_entry.entry(log.entry_id).or_default().push(log);
    }
    for entry in &mut entries {
        entry.habit_logs = by_entry.remove(&entry.id).unwrap_or_default();
    }

    Ok(entries)
}

pub async fn update_entry(
    db: &SqlitePool,
    analyzer: &MoodAnalyzer,
    username: &str,
    entry_id: Uuid,
    req: EntryRequest,
) -> AppResult<DailyEntry> {
    let existing = find_owned_entry(db, username, entry_id).await?;

    let analysis = analyzer.analyze(&req.journal).await;
    let now = Utc::now();

    let mut tx = db.begin().await?;

    let mut entry =
        overwrite_entry(&mut tx, existing.id, &req.journal, &analysis, now).await?;

    entry.habit_logs = match &req.habits {
        Some(habits) => replace_habit_logs(&mut tx, entry.id, habits).await?,
        None => {
            sqlx::query_as::<_, HabitLog>(
                "SELECT * FROM habit_logs WHERE entry_id = ? ORDER BY position ASC",
            )
            .bind(entry.id)
            .fetch_all(&mut *tx)
            .await?
        }
    };

    tx.commit().await?;

    tracing::info!(user = %username, entry_id = %entry.id, mood = entry.mood_score, "Entry updated");
    Ok(entry)
}

pub async fn delete_entry(db: &SqlitePool, username: &str, entry_id: Uuid) -> AppResult<()> {
    let existing = find_owned_entry(db, username, entry_id).await?;

    // habit_logs rows go with it through ON DELETE CASCADE
    sqlx::query("DELETE FROM daily_entries WHERE id = ?")
        .bind(existing.id)
        .execute(db)
        .await?;

    tracing::info!(user = %username, entry_id = %entry_id, "Entry deleted");
    Ok(())
}

/// 404 when the entry doesn't exist, 403 when it belongs to someone else.
async fn find_owned_entry(db: &SqlitePool, username: &str, entry_id: Uuid) -> AppResult<DailyEntry> {
    let entry = sqlx::query_as::<_, DailyEntry>("SELECT * FROM daily_entries WHERE id = ?")
        .bind(entry_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("Entry not found".into()))?;

    let owner = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = ?")
        .bind(entry.user_id)
        .fetch_optional(db)
        .await?;

    if owner.as_deref() != Some(username) {
        tracing::warn!(user = %username, entry_id = %entry_id, "Rejected access to another user's entry");
        return Err(AppError::Forbidden);
    }

    Ok(entry)
}

/// The row can vanish between the ownership check and this write if a
/// concurrent delete wins; that surfaces as 404 rather than a database error.
async fn overwrite_entry(
    tx: &mut Transaction<'_, Sqlite>,
    entry_id: Uuid,
    journal: &str,
    analysis: &MoodAnalysis,
    now: DateTime<Utc>,
) -> AppResult<DailyEntry> {
    sqlx::query_as::<_, DailyEntry>(
        r#"
        UPDATE daily_entries SET
            entry_date = ?,
            journal_content = ?,
            mood_score = ?,
            ai_summary = ?,
            updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(now.date_naive())
    .bind(journal)
    .bind(analysis.mood_score)
    .bind(&analysis.summary)
    .bind(now)
    .bind(entry_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AppError::NotFound("Entry not found".into()))
}

async fn replace_habit_logs(
    tx: &mut Transaction<'_, Sqlite>,
    entry_id: Uuid,
    habits: &[String],
) -> AppResult<Vec<HabitLog>> {
    sqlx::query("DELETE FROM habit_logs WHERE entry_id = ?")
        .bind(entry_id)
        .execute(&mut **tx)
        .await?;

    let mut logs = Vec::with_capacity(habits.len());
    for (position, habit_name) in habits.iter().enumerate() {
        let log = sqlx::query_as::<_, HabitLog>(
            r#"
            INSERT INTO habit_logs (id, entry_id, habit_name, completed, position)
            VALUES (?, ?, ?, 1, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry_id)
        .bind(habit_name)
        .bind(position as i64)
        .fetch_one(&mut **tx)
        .await?;
        logs.push(log);
    }

    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn test_overwrite_of_vanished_entry_is_not_found() {
        let pool = db::create_memory_pool().await.unwrap();
        db::run_migrations(&pool).await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        let result = overwrite_entry(
            &mut tx,
            Uuid::new_v4(),
            "too late",
            &MoodAnalysis::fallback(),
            Utc::now(),
        )
        .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
