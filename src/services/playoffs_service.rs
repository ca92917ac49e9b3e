//! Playoffs fantasy mode: the player pool and user-drafted rosters.

use std::{cmp::Ordering, collections::HashMap};

use futures::future::join_all;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{FantasyPlayerEntity, FantasyTeamEntity, RosterSlotEntity},
    dto::playoffs::{
        BulkImportReport, BulkPlayersRequest, CreateFantasyPlayerRequest,
        CreateFantasyTeamRequest, FantasyPlayerQuery, FantasyPlayerSummary, FantasyTeamQuery,
        FantasyTeamSummary, PlayerSortKey, RosterSlotInput, RosteredPlayer, SortOrder,
        UpdateFantasyPlayerRequest, UpdateFantasyTeamRequest,
    },
    error::ServiceError,
    services::leaderboard_service,
    state::{
        SharedState,
        roster::{self, Position, PositionSlot, RosterCandidate},
        scoring::StatLine,
    },
};

/// Playoff players after the query's filters and ordering.
pub async fn list_players(
    state: &SharedState,
    query: FantasyPlayerQuery,
) -> Result<Vec<FantasyPlayerSummary>, ServiceError> {
    let store = state.require_store().await?;
    let team = query.team.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let mut players: Vec<FantasyPlayerEntity> = store
        .list_fantasy_players()
        .await?
        .into_iter()
        .filter(|player| query.position.is_none_or(|position| player.position == position))
        .filter(|player| team.is_none_or(|team| player.nfl_team.eq_ignore_ascii_case(team)))
        .collect();

    let key = query.sort_by.unwrap_or_default();
    let order = query.sort_order.unwrap_or_default();
    players.sort_by(|a, b| {
        let ordering = compare_players(a, b, key);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    Ok(players.into_iter().map(Into::into).collect())
}

fn compare_players(a: &FantasyPlayerEntity, b: &FantasyPlayerEntity, key: PlayerSortKey) -> Ordering {
    match key {
        PlayerSortKey::TotPts => a.tot_pts.total_cmp(&b.tot_pts),
        PlayerSortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        PlayerSortKey::Position => a.position.as_str().cmp(b.position.as_str()),
        PlayerSortKey::NflTeam => a.nfl_team.cmp(&b.nfl_team),
    }
}

fn new_player(
    state: &SharedState,
    name: String,
    position: Position,
    nfl_team: String,
    eliminated: bool,
    stats: StatLine,
) -> FantasyPlayerEntity {
    FantasyPlayerEntity {
        id: Uuid::new_v4(),
        name: name.trim().to_string(),
        position,
        nfl_team: nfl_team.trim().to_ascii_uppercase(),
        eliminated,
        tot_pts: state.config().scoring.points(&stats),
        stats,
        updated_at: state.now(),
    }
}

/// Validate and store a new playoff player.
pub async fn create_player(
    state: &SharedState,
    request: CreateFantasyPlayerRequest,
) -> Result<FantasyPlayerSummary, ServiceError> {
    request.validate()?;
    let store = state.require_store().await?;
    let player = new_player(
        state,
        request.name,
        request.position,
        request.nfl_team,
        request.eliminated,
        request.stats,
    );
    store.save_fantasy_player(player.clone()).await?;
    info!(player_id = %player.id, name = %player.name, "fantasy player created");
    Ok(player.into())
}

/// Apply a partial update and recompute the player's points.
pub async fn update_player(
    state: &SharedState,
    id: Uuid,
    request: UpdateFantasyPlayerRequest,
) -> Result<FantasyPlayerSummary, ServiceError> {
    request.validate()?;
    let store = state.require_store().await?;
    let mut player = store
        .find_fantasy_player(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("player {id} not found")))?;

    if let Some(name) = request.name {
        player.name = name.trim().to_string();
    }
    if let Some(position) = request.position {
        player.position = position;
    }
    if let Some(nfl_team) = request.nfl_team {
        player.nfl_team = nfl_team.trim().to_ascii_uppercase();
    }
    if let Some(eliminated) = request.eliminated {
        player.eliminated = eliminated;
    }
    if let Some(stats) = request.stats {
        player.stats = stats;
    }
    player.tot_pts = state.config().scoring.points(&player.stats);
    player.updated_at = state.now();

    store.save_fantasy_player(player.clone()).await?;
    Ok(player.into())
}

const NAME_HEADERS: &[&str] = &["name", "Player Name", "Name"];
const POSITION_HEADERS: &[&str] = &["position", "POS"];
const TEAM_HEADERS: &[&str] = &["nfl_team", "NFL Team", "Team", "NFL"];
const ELIMINATED_HEADERS: &[&str] = &["eliminated", "Eliminated"];

fn lookup<'a>(row: &'a IndexMap<String, Value>, headers: &[&str]) -> Option<&'a Value> {
    headers
        .iter()
        .filter_map(|header| row.get(*header))
        .find(|value| !value.is_null() && value.as_str().is_none_or(|s| !s.trim().is_empty()))
}

fn text(row: &IndexMap<String, Value>, headers: &[&str]) -> String {
    match lookup(row, headers) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Numeric cell; blanks and junk count as zero.
fn number(row: &IndexMap<String, Value>, headers: &[&str]) -> i32 {
    let value = match lookup(row, headers) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.map_or(0, |v| v.round() as i32)
}

fn flag(row: &IndexMap<String, Value>, headers: &[&str]) -> bool {
    match lookup(row, headers) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Map one spreadsheet row onto a player, accepting the usual header spellings.
fn parse_player_row(
    state: &SharedState,
    row: &IndexMap<String, Value>,
) -> Result<FantasyPlayerEntity, String> {
    let name = text(row, NAME_HEADERS);
    let raw_position = text(row, POSITION_HEADERS);
    let nfl_team = text(row, TEAM_HEADERS);
    if name.is_empty() || raw_position.is_empty() || nfl_team.is_empty() {
        return Err(format!(
            "Invalid player data: {}",
            serde_json::to_string(row).unwrap_or_default()
        ));
    }
    let position = Position::parse(&raw_position)
        .ok_or_else(|| format!("Invalid position: {raw_position} for player {name}"))?;

    let stats = StatLine {
        passing_yds: number(row, &["passing_yds", "Passing YDS", "Pass YDS", "PY"]),
        passing_td: number(row, &["passing_td", "Passing TD", "Pass TD", "PTD"]),
        int: number(row, &["int", "INT", "Interceptions"]),
        rush_yds: number(row, &["rush_yds", "Rush YDS", "Rushing YDS", "RY"]),
        rush_td: number(row, &["rush_td", "Rush TD", "Rushing TD", "RTD"]),
        rec: number(row, &["rec", "REC", "Receptions"]),
        rec_yds: number(row, &["rec_yds", "REC YDS", "Receiving YDS", "ReY"]),
        rec_td: number(row, &["rec_td", "REC TD", "Receiving TD", "ReTD"]),
        fum: number(row, &["fum", "FUM", "Fumbles"]),
        kicking_pts: number(row, &["kicking_pts", "Kicking", "Kicking PTS", "KP"]),
    };

    Ok(new_player(
        state,
        name,
        position,
        nfl_team,
        flag(row, ELIMINATED_HEADERS),
        stats,
    ))
}

/// Import players from spreadsheet rows.
///
/// Every row is checked before anything is written; rows are then saved in
/// batches and a failed batch is reported without stopping the others.
pub async fn bulk_import_players(
    state: &SharedState,
    request: BulkPlayersRequest,
) -> Result<BulkImportReport, ServiceError> {
    if request.players.is_empty() {
        return Err(ServiceError::InvalidInput("No players to import".into()));
    }
    let store = state.require_store().await?;

    let players = request
        .players
        .iter()
        .map(|row| parse_player_row(state, row))
        .collect::<Result<Vec<_>, _>>()
        .map_err(ServiceError::InvalidInput)?;

    let batch_size = state.config().import_batch_size;
    let mut report = BulkImportReport::default();
    for (index, batch) in players.chunks(batch_size).enumerate() {
        let results = join_all(
            batch
                .iter()
                .map(|player| store.save_fantasy_player(player.clone())),
        )
        .await;

        let failed: Vec<String> = results
            .into_iter()
            .filter_map(Result::err)
            .map(|err| err.to_string())
            .collect();
        report.inserted += batch.len() - failed.len();
        if let Some(first) = failed.first() {
            warn!(batch = index + 1, failures = failed.len(), error = %first, "player batch failed");
            report
                .errors
                .push(format!("Error inserting batch {}: {first}", index + 1));
        }
    }

    info!(inserted = report.inserted, errors = report.errors.len(), "players imported");
    Ok(report)
}

fn slot_order(slot: PositionSlot) -> usize {
    PositionSlot::ALL
        .iter()
        .position(|candidate| *candidate == slot)
        .unwrap_or(PositionSlot::ALL.len())
}

async fn player_index(
    state: &SharedState,
) -> Result<HashMap<Uuid, FantasyPlayerEntity>, ServiceError> {
    let store = state.require_store().await?;
    Ok(store
        .list_fantasy_players()
        .await?
        .into_iter()
        .map(|player| (player.id, player))
        .collect())
}

/// Check a submitted roster against the pool and the composition rules.
fn build_roster(
    slots: &[RosterSlotInput],
    players: &HashMap<Uuid, FantasyPlayerEntity>,
) -> Result<Vec<RosterSlotEntity>, ServiceError> {
    let candidates = slots
        .iter()
        .map(|input| {
            players
                .get(&input.player_id)
                .map(|player| RosterCandidate {
                    slot: input.slot,
                    player_id: player.id,
                    name: &player.name,
                    position: player.position,
                    nfl_team: &player.nfl_team,
                })
                .ok_or_else(|| ServiceError::InvalidInput("Invalid player IDs".into()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    roster::validate_composition(&candidates).map_err(|errors| {
        ServiceError::InvalidInput(format!("Invalid team composition: {}", errors.join("; ")))
    })?;

    let mut entries: Vec<RosterSlotEntity> = slots
        .iter()
        .map(|input| RosterSlotEntity {
            slot: input.slot,
            player_id: input.player_id,
        })
        .collect();
    entries.sort_by_key(|entry| slot_order(entry.slot));
    Ok(entries)
}

fn rostered_players(
    team: &FantasyTeamEntity,
    players: &HashMap<Uuid, FantasyPlayerEntity>,
) -> Vec<RosteredPlayer> {
    let mut rostered: Vec<RosteredPlayer> = team
        .roster
        .iter()
        .filter_map(|entry| {
            players.get(&entry.player_id).map(|player| RosteredPlayer {
                slot: entry.slot,
                player: player.clone().into(),
            })
        })
        .collect();
    rostered.sort_by_key(|entry| slot_order(entry.slot));
    rostered
}

fn summary(team: FantasyTeamEntity) -> FantasyTeamSummary {
    FantasyTeamSummary {
        id: team.id,
        user_id: team.user_id,
        team_name: team.team_name,
        is_locked: team.is_locked,
        created_at: team.created_at,
        players: None,
        total_points: None,
        rank: None,
    }
}

fn ensure_teams_open(state: &SharedState) -> Result<(), ServiceError> {
    if roster::teams_locked(state.config().team_lock_at, state.now()) {
        return Err(ServiceError::Forbidden(
            "Teams are locked. Cannot edit teams.".into(),
        ));
    }
    Ok(())
}

/// Teams, newest first, optionally for one user and with their players.
pub async fn list_teams(
    state: &SharedState,
    query: FantasyTeamQuery,
) -> Result<Vec<FantasyTeamSummary>, ServiceError> {
    let store = state.require_store().await?;
    let mut teams: Vec<FantasyTeamEntity> = store
        .list_fantasy_teams()
        .await?
        .into_iter()
        .filter(|team| query.user_id.is_none_or(|user_id| team.user_id == Some(user_id)))
        .collect();
    teams.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    if !query.include_players {
        return Ok(teams.into_iter().map(summary).collect());
    }

    let players = player_index(state).await?;
    Ok(teams
        .into_iter()
        .map(|team| {
            let rostered = rostered_players(&team, &players);
            let points = leaderboard_service::team_points(&team, &players);
            FantasyTeamSummary {
                players: Some(rostered),
                total_points: Some(points),
                ..summary(team)
            }
        })
        .collect())
}

/// One team with players, points and its rank among all teams.
pub async fn get_team(state: &SharedState, id: Uuid) -> Result<FantasyTeamSummary, ServiceError> {
    let store = state.require_store().await?;
    let players = player_index(state).await?;
    let teams = store.list_fantasy_teams().await?;

    leaderboard_service::rank_teams(teams, &players)
        .into_iter()
        .find(|(_, _, team)| team.id == id)
        .map(|(rank, points, team)| FantasyTeamSummary {
            players: Some(rostered_players(&team, &players)),
            total_points: Some(points),
            rank: Some(rank),
            ..summary(team)
        })
        .ok_or_else(|| ServiceError::NotFound("Team not found".into()))
}

/// Draft a roster for the caller.
pub async fn create_team(
    state: &SharedState,
    user_id: Uuid,
    request: CreateFantasyTeamRequest,
) -> Result<FantasyTeamSummary, ServiceError> {
    ensure_teams_open(state)?;
    request.validate()?;
    let store = state.require_store().await?;
    let players = player_index(state).await?;
    let roster = build_roster(&request.players, &players)?;

    let now = state.now();
    let team = FantasyTeamEntity {
        id: Uuid::new_v4(),
        user_id: Some(user_id),
        team_name: request.team_name.trim().to_string(),
        is_locked: true,
        roster,
        created_at: now,
        updated_at: now,
    };
    store.save_fantasy_team(team.clone()).await?;

    info!(team_id = %team.id, %user_id, "fantasy team created");
    Ok(summary(team))
}

async fn owned_team(
    state: &SharedState,
    user_id: Uuid,
    id: Uuid,
) -> Result<FantasyTeamEntity, ServiceError> {
    let store = state.require_store().await?;
    store
        .find_fantasy_team(id)
        .await?
        .filter(|team| team.user_id == Some(user_id))
        .ok_or_else(|| ServiceError::NotFound("Team not found or unauthorized".into()))
}

/// Apply a partial edit to one of the caller's teams.
pub async fn update_team(
    state: &SharedState,
    user_id: Uuid,
    id: Uuid,
    request: UpdateFantasyTeamRequest,
) -> Result<FantasyTeamSummary, ServiceError> {
    ensure_teams_open(state)?;
    request.validate()?;
    let store = state.require_store().await?;
    let mut team = owned_team(state, user_id, id).await?;

    if let Some(team_name) = request.team_name {
        team.team_name = team_name.trim().to_string();
    }
    if let Some(slots) = request.players {
        let players = player_index(state).await?;
        team.roster = build_roster(&slots, &players)?;
    }
    team.updated_at = state.now();

    store.save_fantasy_team(team.clone()).await?;
    Ok(summary(team))
}

/// Delete one of the caller's teams before the roster lock.
pub async fn delete_team(state: &SharedState, user_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
    ensure_teams_open(state)?;
    let store = state.require_store().await?;
    owned_team(state, user_id, id).await?;
    if !store.delete_fantasy_team(id).await? {
        return Err(ServiceError::NotFound("Team not found".into()));
    }
    info!(team_id = %id, %user_id, "fantasy team deleted");
    Ok(())
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::{Duration, macros::datetime};

    use super::{fixtures::valid_pool, *};
    use crate::{
        config::AppConfig,
        dao::pickem_store::PickemStore,
        provider::fake::FakeProvider,
        state::test_support::{Harness, harness_with_config},
    };

    const LOCK_AT: time::OffsetDateTime = datetime!(2026-01-10 18:00 UTC);

    async fn setup(now: time::OffsetDateTime) -> (Harness, Vec<RosterSlotInput>) {
        let config = AppConfig {
            team_lock_at: LOCK_AT,
            import_batch_size: 2,
            ..AppConfig::default()
        };
        let h = harness_with_config(FakeProvider::default(), now, config).await;
        let mut slots = Vec::new();
        for (slot, player) in valid_pool() {
            slots.push(RosterSlotInput {
                slot,
                player_id: player.id,
            });
            h.store.save_fantasy_player(player).await.unwrap();
        }
        (h, slots)
    }

    fn create(name: &str, players: Vec<RosterSlotInput>) -> CreateFantasyTeamRequest {
        CreateFantasyTeamRequest {
            team_name: name.into(),
            players,
        }
    }

    #[tokio::test]
    async fn player_points_follow_scoring_rules() {
        let (h, _) = setup(LOCK_AT - Duration::days(3)).await;
        let created = create_player(
            &h.state,
            CreateFantasyPlayerRequest {
                name: " Saquon Barkley ".into(),
                position: Position::Rb,
                nfl_team: "phi".into(),
                eliminated: false,
                stats: StatLine {
                    rush_yds: 205,
                    rush_td: 2,
                    rec: 2,
                    ..StatLine::default()
                },
            },
        )
        .await
        .unwrap();
        assert_eq!(created.name, "Saquon Barkley");
        assert_eq!(created.nfl_team, "PHI");
        assert_eq!(created.tot_pts, 34.5);

        let updated = update_player(
            &h.state,
            created.id,
            UpdateFantasyPlayerRequest {
                name: None,
                position: None,
                nfl_team: None,
                eliminated: Some(true),
                stats: Some(StatLine {
                    rush_yds: 100,
                    ..StatLine::default()
                }),
            },
        )
        .await
        .unwrap();
        assert!(updated.eliminated);
        assert_eq!(updated.tot_pts, 10.0);
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let (h, _) = setup(LOCK_AT - Duration::days(3)).await;
        let qbs = list_players(
            &h.state,
            FantasyPlayerQuery {
                position: Some(Position::Qb),
                sort_by: Some(PlayerSortKey::Name),
                sort_order: Some(SortOrder::Asc),
                ..FantasyPlayerQuery::default()
            },
        )
        .await
        .unwrap();
        let names: Vec<_> = qbs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Jalen Hurts", "Josh Allen", "Patrick Mahomes"]);

        let kc = list_players(
            &h.state,
            FantasyPlayerQuery {
                team: Some("kc".into()),
                ..FantasyPlayerQuery::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(kc.len(), 3);
    }

    #[tokio::test]
    async fn bulk_import_accepts_header_aliases() {
        let (h, _) = setup(LOCK_AT - Duration::days(3)).await;
        let row = |value: serde_json::Value| -> IndexMap<String, Value> {
            serde_json::from_value(value).unwrap()
        };
        let request = BulkPlayersRequest {
            players: vec![
                row(json!({ "Player Name": "Bijan Robinson", "POS": "rb", "NFL Team": "ATL", "RY": "120", "RTD": 1 })),
                row(json!({ "name": "Drake London", "position": "WR", "Team": "ATL", "REC": 7, "REC YDS": "98" })),
                row(json!({ "Name": "Younghoe Koo", "POS": "K", "NFL": "ATL", "Kicking": "9.0", "Eliminated": "TRUE" })),
            ],
        };
        let report = bulk_import_players(&h.state, request).await.unwrap();
        assert_eq!(report.inserted, 3);
        assert!(report.errors.is_empty());

        let falcons = list_players(
            &h.state,
            FantasyPlayerQuery {
                team: Some("ATL".into()),
                ..FantasyPlayerQuery::default()
            },
        )
        .await
        .unwrap();
        let bijan = falcons.iter().find(|p| p.name == "Bijan Robinson").unwrap();
        assert_eq!(bijan.stats.rush_yds, 120);
        assert_eq!(bijan.tot_pts, 18.0);
        assert!(falcons.iter().any(|p| p.name == "Younghoe Koo" && p.eliminated));
    }

    #[tokio::test]
    async fn bulk_import_rejects_bad_position() {
        let (h, _) = setup(LOCK_AT - Duration::days(3)).await;
        let request = BulkPlayersRequest {
            players: vec![
                serde_json::from_value(json!({ "name": "Someone", "position": "LB", "nfl_team": "NYJ" }))
                    .unwrap(),
            ],
        };
        match bulk_import_players(&h.state, request).await {
            Err(ServiceError::InvalidInput(message)) => assert!(message.contains("Invalid position")),
            other => panic!("expected invalid input, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn team_lifecycle_before_lock() {
        let (h, slots) = setup(LOCK_AT - Duration::days(3)).await;
        let user = Uuid::new_v4();
        let team = create_team(&h.state, user, create("Playoff Push", slots.clone()))
            .await
            .unwrap();
        assert!(team.is_locked);

        let duplicate = create_team(&h.state, Uuid::new_v4(), create("playoff push", slots.clone())).await;
        assert!(matches!(duplicate, Err(ServiceError::InvalidState(_))));

        let detail = get_team(&h.state, team.id).await.unwrap();
        assert_eq!(detail.rank, Some(1));
        assert_eq!(detail.total_points, Some(170.0));
        assert_eq!(detail.players.as_ref().map(Vec::len), Some(17));

        let renamed = update_team(
            &h.state,
            user,
            team.id,
            UpdateFantasyTeamRequest {
                team_name: Some("Deep Run".into()),
                players: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.team_name, "Deep Run");

        assert!(matches!(
            delete_team(&h.state, Uuid::new_v4(), team.id).await,
            Err(ServiceError::NotFound(_))
        ));
        delete_team(&h.state, user, team.id).await.unwrap();
        assert!(h.store.find_fantasy_team(team.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_composition_is_rejected() {
        let (h, mut slots) = setup(LOCK_AT - Duration::days(3)).await;
        slots.pop();
        match create_team(&h.state, Uuid::new_v4(), create("Short Bench", slots)).await {
            Err(ServiceError::InvalidInput(message)) => {
                assert!(message.contains("Must have exactly 3 FLEX players"));
            }
            other => panic!("expected invalid input, got {other:?}"),
        }

        let unknown = vec![RosterSlotInput {
            slot: PositionSlot::QB1,
            player_id: Uuid::new_v4(),
        }];
        assert!(matches!(
            create_team(&h.state, Uuid::new_v4(), create("Ghosts", unknown)).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn edits_are_forbidden_after_lock_date() {
        let (h, slots) = setup(LOCK_AT - Duration::hours(1)).await;
        let user = Uuid::new_v4();
        let team = create_team(&h.state, user, create("Last Minute", slots.clone()))
            .await
            .unwrap();

        h.clock.set(LOCK_AT);
        assert!(matches!(
            create_team(&h.state, user, create("Too Late", slots)).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            delete_team(&h.state, user, team.id).await,
            Err(ServiceError::Forbidden(_))
        ));

        let listed = list_teams(
            &h.state,
            FantasyTeamQuery {
                user_id: Some(user),
                include_players: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].total_points, Some(170.0));
    }
}
