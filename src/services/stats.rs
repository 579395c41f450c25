use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::entry::DailyEntry;

const RECENT_MOOD_WINDOW: usize = 7;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalStats {
    pub total_entries: usize,
    pub average_mood: f64,
    pub recent_moods: Vec<MoodPoint>,
    pub habit_streaks: BTreeMap<String, u32>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MoodPoint {
    pub date: NaiveDate,
    pub score: i32,
}

/// Summarise a user's entries in chronological order.
///
/// A habit's streak is the number of consecutive entries, counting back from
/// the most recent, that include it. Entries on the same date keep their
/// stored order.
pub fn compute_stats(entries: &[DailyEntry]) -> JournalStats {
    let mut ordered: Vec<&DailyEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| e.entry_date);

    let average_mood = if ordered.is_empty() {
        0.0
    } else {
        let sum: i64 = ordered.iter().map(|e| e.mood_score as i64).sum();
        let avg = sum as f64 / ordered.len() as f64;
        (avg * 10.0).round() / 10.0
    };

    let recent_moods = ordered
        .iter()
        .skip(ordered.len().saturating_sub(RECENT_MOOD_WINDOW))
        .map(|e| MoodPoint {
            date: e.entry_date,
            score: e.mood_score,
        })
        .collect();

    let mut habit_streaks = BTreeMap::new();
    for entry in &ordered {
        for log in &entry.habit_logs {
            habit_streaks.entry(log.habit_name.clone()).or_insert(0);
        }
    }
    for (name, streak) in habit_streaks.iter_mut() {
        *streak = ordered
            .iter()
            .rev()
            .take_while(|e| e.habit_logs.iter().any(|h| &h.habit_name == name))
            .count() as u32;
    }

    JournalStats {
        total_entries: ordered.len(),
        average_mood,
        recent_moods,
        habit_streaks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::HabitLog;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(day: u32, mood: i32, habits: &[&str]) -> DailyEntry {
        let id = Uuid::new_v4();
        DailyEntry {
            id,
            user_id: Uuid::nil(),
            entry_date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            journal_content: format!("day {}", day),
            mood_score: mood,
            ai_summary: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            habit_logs: habits
                .iter()
                .enumerate()
                .map(|(i, name)| HabitLog {
                    id: Uuid::new_v4(),
                    entry_id: id,
                    habit_name: name.to_string(),
                    completed: true,
                    position: i as i64,
                })
                .collect(),
        }
    }

    #[test]
    fn test_empty_stats() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.average_mood, 0.0);
        assert!(stats.recent_moods.is_empty());
        assert!(stats.habit_streaks.is_empty());
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        let stats = compute_stats(&[entry(1, 7, &[]), entry(2, 8, &[]), entry(3, 8, &[])]);
        assert_eq!(stats.average_mood, 7.7);
    }

    #[test]
    fn test_recent_moods_keeps_last_seven_in_date_order() {
        let entries: Vec<DailyEntry> = (1..=10).rev().map(|d| entry(d, d as i32, &[])).collect();
        let stats = compute_stats(&entries);
        assert_eq!(stats.recent_moods.len(), 7);
        assert_eq!(stats.recent_moods.first().unwrap().score, 4);
        assert_eq!(stats.recent_moods.last().unwrap().score, 10);
    }

    #[test]
    fn test_streak_counts_back_from_latest_entry() {
        let entries = vec![
            entry(1, 5, &["exercise", "reading"]),
            entry(2, 5, &["reading"]),
            entry(3, 5, &["exercise", "reading"]),
            entry(4, 5, &["exercise", "reading"]),
        ];
        let stats = compute_stats(&entries);
        assert_eq!(stats.habit_streaks["reading"], 4);
        assert_eq!(stats.habit_streaks["exercise"], 2);
    }

    #[test]
    fn test_broken_habit_reports_zero() {
        let entries = vec![entry(1, 5, &["meditation"]), entry(2, 5, &[])];
        let stats = compute_stats(&entries);
        assert_eq!(stats.habit_streaks["meditation"], 0);
    }
}
