//! Leaderboard ranking helpers.

use serde::{Deserialize, Serialize};

/// Title shown next to a user on the leaderboard, by XP band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RankTitle {
    JuniorArchitect,
    KernelContributor,
    ProLogicist,
}

impl RankTitle {
    pub fn for_xp(xp: u64) -> Self {
        match xp {
            5000.. => Self::ProLogicist,
            1000.. => Self::KernelContributor,
            _ => Self::JuniorArchitect,
        }
    }
}

/// Label for a user's standing, e.g. `"Top 5%"` or `"Bottom 20%"`.
///
/// `rank` is 1-based. The percentile is rounded up and never below 1.
pub fn percentile_label(rank: u64, total_users: u64) -> String {
    if total_users == 0 {
        return "Top 100%".to_string();
    }
    let percentile = rank.saturating_mul(100).div_ceil(total_users).max(1);
    if percentile > 50 {
        format!("Bottom {}%", 100u64.saturating_sub(percentile))
    } else {
        format!("Top {}%", percentile)
    }
}
