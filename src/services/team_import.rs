use std::collections::HashMap;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{FantasyPlayerEntity, FantasyTeamEntity, RosterSlotEntity},
        storage::StorageError,
    },
    dto::playoffs::{BulkImportReport, BulkTeamRow, BulkTeamsRequest},
    error::ServiceError,
    state::{
        SharedState,
        roster::{PositionSlot, ROSTER_SIZE},
    },
};

/// Import pre-drafted teams whose players are listed by name in slot order.
///
/// Imported teams belong to no user and are locked. A team is skipped, with a
/// report line, when its name is taken or any of its players is unknown.
pub async fn bulk_import_teams(
    state: &SharedState,
    request: BulkTeamsRequest,
) -> Result<BulkImportReport, ServiceError> {
    if request.teams.is_empty() {
        return Err(ServiceError::InvalidInput("No teams to import".into()));
    }
    let store = state.require_store().await?;

    let by_name: HashMap<String, FantasyPlayerEntity> = store
        .list_fantasy_players()
        .await?
        .into_iter()
        .map(|player| (player.name.trim().to_lowercase(), player))
        .collect();

    let mut report = BulkImportReport::default();
    for row in request.teams {
        let team_name = row.team_name.trim().to_string();
        let roster = match resolve_roster(&row, &by_name) {
            Ok(roster) => roster,
            Err(message) => {
                report.errors.push(message);
                continue;
            }
        };

        let now = state.now();
        let team = FantasyTeamEntity {
            id: Uuid::new_v4(),
            user_id: None,
            team_name: team_name.clone(),
            is_locked: true,
            roster,
            created_at: now,
            updated_at: now,
        };
        match store.save_fantasy_team(team).await {
            Ok(()) => report.inserted += 1,
            Err(StorageError::Conflict { .. }) => {
                report
                    .errors
                    .push(format!("Team \"{team_name}\" already exists"));
            }
            Err(err) => {
                warn!(team = %team_name, error = %err, "failed to import team");
                report
                    .errors
                    .push(format!("Error creating team \"{team_name}\": {err}"));
            }
        }
    }

    info!(inserted = report.inserted, errors = report.errors.len(), "teams imported");
    Ok(report)
}

fn resolve_roster(
    row: &BulkTeamRow,
    by_name: &HashMap<String, FantasyPlayerEntity>,
) -> Result<Vec<RosterSlotEntity>, String> {
    let team_name = row.team_name.trim();
    if team_name.is_empty() {
        return Err("Team name is required".into());
    }
    if row.players.len() != ROSTER_SIZE {
        return Err(format!(
            "Team \"{team_name}\": expected {ROSTER_SIZE} players, found {}",
            row.players.len()
        ));
    }

    let mut roster = Vec::with_capacity(ROSTER_SIZE);
    let mut missing = Vec::new();
    for (slot, name) in PositionSlot::ALL.into_iter().zip(&row.players) {
        match by_name.get(&name.trim().to_lowercase()) {
            Some(player) => roster.push(RosterSlotEntity {
                slot,
                player_id: player.id,
            }),
            None => missing.push(format!("{} (Slot: {slot:?})", name.trim())),
        }
    }

    if missing.is_empty() {
        Ok(roster)
    } else {
        Err(format!(
            "Team \"{team_name}\": Missing players - {}",
            missing.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::{
        dao::pickem_store::PickemStore,
        provider::fake::FakeProvider,
        services::playoffs_service::fixtures::valid_pool,
        state::test_support::{Harness, harness},
    };

    async fn setup() -> (Harness, Vec<String>) {
        let h = harness(FakeProvider::default(), datetime!(2026-01-12 12:00 UTC)).await;
        let mut names = Vec::new();
        for (_, player) in valid_pool() {
            names.push(player.name.to_uppercase());
            h.store.save_fantasy_player(player).await.unwrap();
        }
        (h, names)
    }

    fn row(name: &str, players: Vec<String>) -> BulkTeamRow {
        BulkTeamRow {
            team_name: name.into(),
            players,
        }
    }

    #[tokio::test]
    async fn imports_locked_unowned_teams_matching_names_case_insensitively() {
        let (h, names) = setup().await;
        let report = bulk_import_teams(
            &h.state,
            BulkTeamsRequest {
                teams: vec![row("Office Pool", names)],
            },
        )
        .await
        .unwrap();
        assert_eq!(report.inserted, 1);
        assert!(report.errors.is_empty());

        let teams = h.store.list_fantasy_teams().await.unwrap();
        assert_eq!(teams.len(), 1);
        assert!(teams[0].is_locked);
        assert_eq!(teams[0].user_id, None);
        assert_eq!(teams[0].roster[0].slot, PositionSlot::QB1);
        assert_eq!(teams[0].roster[16].slot, PositionSlot::FLEX3);
    }

    #[tokio::test]
    async fn reports_missing_players_and_taken_names() {
        let (h, names) = setup().await;
        let mut with_ghost = names.clone();
        with_ghost[0] = "Nobody Known".into();

        let report = bulk_import_teams(
            &h.state,
            BulkTeamsRequest {
                teams: vec![
                    row("First", names.clone()),
                    row("first", names.clone()),
                    row("Haunted", with_ghost),
                    row("Short", names[..16].to_vec()),
                ],
            },
        )
        .await
        .unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.errors[0], "Team \"first\" already exists");
        assert_eq!(
            report.errors[1],
            "Team \"Haunted\": Missing players - Nobody Known (Slot: QB1)"
        );
        assert!(report.errors[2].contains("expected 17 players"));
    }
}
