use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{pick::PickSummary, profile::ProfileSummary};

/// Season standings for the rushing pick'em.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Season target used for `progress`.
    pub goal_yards: i64,
    /// Users ordered by total yards.
    pub entries: Vec<LeaderboardEntry>,
}

/// One user on the leaderboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// 1-based rank.
    pub rank: usize,
    /// Profile.
    pub user: ProfileSummary,
    /// Season total.
    pub total_yards: i64,
    /// Fraction of the goal reached, capped at 1.
    pub progress: f64,
    /// Picks of the user, newest week first.
    pub weekly_picks: Vec<PickSummary>,
}

/// Playoff fantasy team standings.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayoffsLeaderboardEntry {
    /// 1-based rank.
    pub rank: usize,
    /// Team id.
    pub team_id: Uuid,
    /// Team name.
    pub team_name: String,
    /// Owner, if any.
    pub user_id: Option<Uuid>,
    /// Sum of roster points.
    pub total_points: f64,
    /// Rostered players not yet eliminated.
    pub players_remaining: usize,
}
