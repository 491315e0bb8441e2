//! User registration and profile endpoints

use axum::{extract::State, Extension, Json};

use crate::error::{ApiError, Result};
use crate::models::{RankTitle, RegisterUserRequest, RegisterUserResponse, UserProfileResponse};
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

const MAX_USERNAME_LEN: usize = 32;

/// POST /api/users/register
/// Creates a new user and returns its token
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<RegisterUserResponse>> {
    let username = validate_username(&payload.username)?;

    if state.db.username_exists(username).await? {
        return Err(ApiError::BadRequest(format!(
            "Username {username:?} is already taken"
        )));
    }

    let user = state.db.create_user(username).await?;

    tracing::info!("Registered new user: {}", user.id);

    Ok(Json(RegisterUserResponse {
        user_id: user.id,
        token: user.token,
    }))
}

/// GET /api/users/me
pub async fn me(
    Extension(auth): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> Result<Json<UserProfileResponse>> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfileResponse {
        user_id: user.id,
        username: user.username,
        xp: user.xp,
        streak_count: user.streak_count,
        last_active_at: user.last_active_at,
        title: RankTitle::for_xp(user.xp.max(0) as u64),
    }))
}

fn validate_username(raw: &str) -> Result<&str> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username must not be empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "Username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(username)
}
