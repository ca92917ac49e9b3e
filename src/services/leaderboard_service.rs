use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    dao::models::{FantasyPlayerEntity, FantasyTeamEntity, PickEntity, PickFilter},
    dto::leaderboard::{LeaderboardEntry, LeaderboardResponse, PlayoffsLeaderboardEntry},
    error::ServiceError,
    services::pick_service,
    state::SharedState,
};

/// Profiles ranked by total yards with their picks attached.
pub async fn leaderboard(state: &SharedState) -> Result<LeaderboardResponse, ServiceError> {
    let store = state.require_store().await?;
    let goal_yards = state.config().goal_yards;

    let mut profiles = store.list_profiles().await?;
    profiles.sort_by(|a, b| {
        b.total_yards
            .cmp(&a.total_yards)
            .then_with(|| a.team_name.cmp(&b.team_name))
    });

    let mut picks_by_user: HashMap<Uuid, Vec<PickEntity>> = HashMap::new();
    for pick in store.list_picks(PickFilter::default()).await? {
        picks_by_user.entry(pick.user_id).or_default().push(pick);
    }

    let entries = profiles
        .into_iter()
        .enumerate()
        .map(|(index, profile)| {
            let mut picks = picks_by_user.remove(&profile.id).unwrap_or_default();
            pick_service::sort_newest_first(&mut picks);
            LeaderboardEntry {
                rank: index + 1,
                total_yards: profile.total_yards,
                progress: progress(profile.total_yards, goal_yards),
                user: profile.into(),
                weekly_picks: picks.into_iter().map(Into::into).collect(),
            }
        })
        .collect();

    Ok(LeaderboardResponse {
        goal_yards,
        entries,
    })
}

fn progress(total_yards: i64, goal_yards: i64) -> f64 {
    if goal_yards <= 0 {
        return 1.0;
    }
    (total_yards as f64 / goal_yards as f64).clamp(0.0, 1.0)
}

/// Points of a roster: the sum of its players' stored totals.
pub(crate) fn team_points(
    team: &FantasyTeamEntity,
    players: &HashMap<Uuid, FantasyPlayerEntity>,
) -> f64 {
    team.roster
        .iter()
        .filter_map(|slot| players.get(&slot.player_id))
        .map(|player| player.tot_pts)
        .sum()
}

/// Teams ordered by points, highest first; ties keep the older team ahead.
pub(crate) fn rank_teams(
    teams: Vec<FantasyTeamEntity>,
    players: &HashMap<Uuid, FantasyPlayerEntity>,
) -> Vec<(usize, f64, FantasyTeamEntity)> {
    let mut scored: Vec<(f64, FantasyTeamEntity)> = teams
        .into_iter()
        .map(|team| (team_points(&team, players), team))
        .collect();
    scored.sort_by(|(a_pts, a), (b_pts, b)| {
        b_pts
            .total_cmp(a_pts)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    scored
        .into_iter()
        .enumerate()
        .map(|(index, (points, team))| (index + 1, points, team))
        .collect()
}

/// Playoff teams ranked by roster points.
pub async fn playoffs_leaderboard(
    state: &SharedState,
) -> Result<Vec<PlayoffsLeaderboardEntry>, ServiceError> {
    let store = state.require_store().await?;
    let players: HashMap<Uuid, FantasyPlayerEntity> = store
        .list_fantasy_players()
        .await?
        .into_iter()
        .map(|player| (player.id, player))
        .collect();
    let teams = store.list_fantasy_teams().await?;

    Ok(rank_teams(teams, &players)
        .into_iter()
        .map(|(rank, total_points, team)| PlayoffsLeaderboardEntry {
            rank,
            players_remaining: team
                .roster
                .iter()
                .filter(|slot| {
                    players
                        .get(&slot.player_id)
                        .is_some_and(|player| !player.eliminated)
                })
                .count(),
            team_id: team.id,
            team_name: team.team_name,
            user_id: team.user_id,
            total_points,
        })
        .collect())
}
