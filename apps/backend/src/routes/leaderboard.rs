//! Leaderboard endpoint

use axum::{extract::State, Extension, Json};
use learntocode_core::percentile_label;

use crate::db::LEADERBOARD_SIZE;
use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// GET /api/leaderboard
pub async fn standings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<LeaderboardResponse>> {
    let me = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let users = state
        .db
        .top_users(LEADERBOARD_SIZE)
        .await?
        .into_iter()
        .enumerate()
        .map(|(i, row)| LeaderboardEntry {
            rank: i as u64 + 1,
            title: RankTitle::for_xp(row.xp.max(0) as u64),
            is_current_user: row.id == auth.user_id,
            user_id: row.id,
            username: row.username,
            xp: row.xp,
            streak_count: row.streak_count,
        })
        .collect();

    let rank = state.db.count_users_above(me.xp).await? + 1;
    let total_users = state.db.count_users().await?;

    Ok(Json(LeaderboardResponse {
        users,
        user_stats: UserStanding {
            rank,
            percentile: percentile_label(rank, total_users),
            total_users,
        },
    }))
}
