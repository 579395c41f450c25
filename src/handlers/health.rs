use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

const REQUIRED_TABLES: [&str; 3] = ["users", "daily_entries", "habit_logs"];

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    pub status: &'static str,
    pub missing_tables: Vec<&'static str>,
}

pub async fn health_check() -> Json<Liveness> {
    Json(Liveness {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Ready once the journal schema has been migrated into the database.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let present = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN (?, ?, ?)",
    )
    .bind(REQUIRED_TABLES[0])
    .bind(REQUIRED_TABLES[1])
    .bind(REQUIRED_TABLES[2])
    .fetch_all(&state.db)
    .await;

    let missing_tables = match present {
        Ok(present) => REQUIRED_TABLES
            .into_iter()
            .filter(|t| !present.iter().any(|p| p == t))
            .collect(),
        Err(e) => {
            tracing::error!(error = %e, "Readiness check could not reach the database");
            REQUIRED_TABLES.to_vec()
        }
    };

    if missing_tables.is_empty() {
        (
            StatusCode::OK,
            Json(Readiness {
                status: "ready",
                missing_tables,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(Readiness {
                status: "not_ready",
                missing_tables,
            }),
        )
    }
}
