use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::AppState;

/// Identity of the caller, taken from the token subject. The matching user
/// row is resolved by the entry service, not here.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::Unauthorized)?;

    let token_data = verify_token(bearer.token(), &state.config)?;

    let auth_user = AuthUser {
        username: token_data.claims.sub,
    };

    req.extensions_mut().insert(auth_user);
    Ok(next.run(req).await)
}
