use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    jwt::create_token,
    password::{dummy_hash, hash_password, verify_password},
};
use crate::error::{AppError, AppResult};
use crate::models::user::User;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(&body.username)
        .fetch_one(&state.db)
        .await?;

    if existing > 0 {
        return Err(AppError::UsernameTaken);
    }

    let pwd_hash = hash_password(&body.password)?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO users (id, username, password_hash, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&body.username)
    .bind(&pwd_hash)
    .bind(Utc::now())
    .execute(&state.db)
    .await;

    match inserted {
        Ok(_) => {}
        // Lost a race with a concurrent registration of the same name
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::UsernameTaken)
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user = %body.username, "User registered");
    Ok(Json(MessageResponse {
        message: "User registered successfully".into(),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<Json<TokenResponse>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(&body.username)
        .fetch_optional(&state.db)
        .await?;

    let Some(user) = user else {
        let _ = verify_password(&body.password, dummy_hash());
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&body.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = create_token(&user.username, &state.config)?;
    Ok(Json(TokenResponse { token }))
}
