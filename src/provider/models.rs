//! Wire types for the Sportradar NFL feed and the domain types they map to.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use super::error::{ProviderError, ProviderResult};

/// Lifecycle of an NFL game as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Not started.
    Scheduled,
    /// Listed but not yet scheduled.
    Created,
    /// Being played.
    Inprogress,
    /// Live, at the break.
    Halftime,
    /// Over; stats may still be corrected.
    Complete,
    /// Over and final.
    Closed,
    /// Moved to a later date.
    Postponed,
    /// Start pushed back.
    Delayed,
    /// Will not be played.
    Cancelled,
    /// Any status this client does not know.
    #[serde(other)]
    Unknown,
}

impl GameStatus {
    /// Game is being played.
    pub fn is_live(self) -> bool {
        matches!(self, GameStatus::Inprogress | GameStatus::Halftime)
    }

    /// Box score is final and yards will not change.
    pub fn is_final(self) -> bool {
        matches!(self, GameStatus::Complete | GameStatus::Closed)
    }

    /// Live or final.
    pub fn has_started(self) -> bool {
        self.is_live() || self.is_final()
    }
}

/// One game on the weekly schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScheduledGame {
    /// Provider game id.
    pub id: String,
    /// Status at schedule time.
    pub status: GameStatus,
    /// Scheduled kickoff, when published.
    #[serde(with = "time::serde::rfc3339::option")]
    pub kickoff: Option<OffsetDateTime>,
    /// Home team alias.
    pub home: String,
    /// Away team alias.
    pub away: String,
    /// Provider id of the home team, needed for roster lookups.
    pub home_id: Option<String>,
    /// Provider id of the away team.
    pub away_id: Option<String>,
}

impl ScheduledGame {
    /// `team` plays in this game (alias, case-insensitive).
    pub fn involves(&self, team: &str) -> bool {
        self.home.eq_ignore_ascii_case(team) || self.away.eq_ignore_ascii_case(team)
    }

    /// Both sides as `(alias, provider id)` pairs.
    pub fn sides(&self) -> [(&str, Option<&str>); 2] {
        [
            (self.home.as_str(), self.home_id.as_deref()),
            (self.away.as_str(), self.away_id.as_deref()),
        ]
    }

    /// Opponent of `team` in this game.
    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        if self.home.eq_ignore_ascii_case(team) {
            Some(&self.away)
        } else if self.away.eq_ignore_ascii_case(team) {
            Some(&self.home)
        } else {
            None
        }
    }
}

/// Games of one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WeekSchedule {
    /// Season year.
    pub season: u16,
    /// Week number.
    pub week: u8,
    /// Games in provider order.
    pub games: Vec<ScheduledGame>,
}

impl WeekSchedule {
    /// Game that `team` plays this week.
    pub fn game_for_team(&self, team: &str) -> Option<&ScheduledGame> {
        self.games.iter().find(|game| game.involves(team))
    }
}

/// Rushing line of a single player in one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RushingLine {
    /// Provider player id.
    pub player_id: String,
    /// Display name.
    pub name: String,
    /// Team alias.
    pub team: String,
    /// Carries.
    pub attempts: i32,
    /// Rushing yards, possibly negative.
    pub yards: i32,
    /// Rushing touchdowns.
    pub touchdowns: i32,
}

/// Box score reduced to rushing lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct GameStatistics {
    /// Provider game id.
    pub game_id: String,
    /// Status when the box score was read.
    pub status: GameStatus,
    /// Rushers of both teams.
    pub rushers: Vec<RushingLine>,
}

/// Player listed on a team's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RosterPlayer {
    /// Provider player id.
    pub player_id: String,
    /// Display name.
    pub name: String,
    /// Position abbreviation as published, e.g. `RB`.
    pub position: String,
}

impl RosterPlayer {
    /// Listed at `RB`.
    pub fn is_running_back(&self) -> bool {
        self.position.trim().eq_ignore_ascii_case("RB")
    }
}

/// Roster of one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TeamRoster {
    /// Team alias.
    pub team: String,
    /// Players with a usable name.
    pub players: Vec<RosterPlayer>,
}

impl GameStatistics {
    /// Find a rusher by provider id, falling back to a case-insensitive name match.
    pub fn find_rusher(&self, player_id: &str, name: &str) -> Option<&RushingLine> {
        self.rushers
            .iter()
            .find(|line| line.player_id == player_id)
            .or_else(|| {
                self.rushers
                    .iter()
                    .find(|line| line.name.eq_ignore_ascii_case(name.trim()))
            })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct RawScheduleResponse {
    pub week: Option<RawWeek>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawWeek {
    #[serde(default)]
    pub games: Vec<RawGame>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawGame {
    pub id: String,
    pub status: Option<GameStatus>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub scheduled: Option<OffsetDateTime>,
    pub home: Option<RawTeamRef>,
    pub away: Option<RawTeamRef>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawTeamRef {
    pub id: Option<String>,
    pub alias: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawRosterResponse {
    pub alias: Option<String>,
    #[serde(default)]
    pub players: Vec<RawRosterPlayer>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawRosterPlayer {
    pub id: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawStatisticsResponse {
    pub id: Option<String>,
    pub status: Option<GameStatus>,
    pub statistics: Option<RawStatistics>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawStatistics {
    pub home: Option<RawTeamStatistics>,
    pub away: Option<RawTeamStatistics>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawTeamStatistics {
    pub alias: Option<String>,
    pub rushing: Option<RawRushing>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawRushing {
    #[serde(default)]
    pub players: Vec<RawRusher>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawRusher {
    pub id: String,
    pub name: String,
    pub attempts: Option<i32>,
    pub yards: Option<i32>,
    pub touchdowns: Option<i32>,
}

fn shape(endpoint: &str, detail: impl Into<String>) -> ProviderError {
    ProviderError::UnexpectedShape {
        endpoint: endpoint.to_string(),
        detail: detail.into(),
    }
}

impl RawScheduleResponse {
    pub(super) fn into_schedule(
        self,
        endpoint: &str,
        season: u16,
        week: u8,
    ) -> ProviderResult<WeekSchedule> {
        let raw_week = self
            .week
            .ok_or_else(|| shape(endpoint, "missing `week` section"))?;

        let games = raw_week
            .games
            .into_iter()
            .map(|game| {
                let (home, home_id) = game.home.map_or((None, None), |t| (t.alias, t.id));
                let (away, away_id) = game.away.map_or((None, None), |t| (t.alias, t.id));
                match (home, away) {
                    (Some(home), Some(away)) => Ok(ScheduledGame {
                        id: game.id,
                        status: game.status.unwrap_or(GameStatus::Unknown),
                        kickoff: game.scheduled,
                        home,
                        away,
                        home_id,
                        away_id,
                    }),
                    _ => Err(shape(
                        endpoint,
                        format!("game `{}` is missing a team alias", game.id),
                    )),
                }
            })
            .collect::<ProviderResult<Vec<_>>>()?;

        Ok(WeekSchedule {
            season,
            week,
            games,
        })
    }
}

impl RawRosterResponse {
    /// Players without a usable name are dropped rather than failing the roster.
    pub(super) fn into_roster(self, endpoint: &str) -> ProviderResult<TeamRoster> {
        let team = self
            .alias
            .ok_or_else(|| shape(endpoint, "roster without team alias"))?;
        let players = self
            .players
            .into_iter()
            .filter_map(|player| {
                let name = player.name.or_else(|| match (player.first_name, player.last_name) {
                    (Some(first), Some(last)) => Some(format!("{first} {last}")),
                    _ => None,
                })?;
                Some(RosterPlayer {
                    player_id: player.id,
                    name,
                    position: player.position.unwrap_or_default(),
                })
            })
            .collect();
        Ok(TeamRoster { team, players })
    }
}

impl RawStatisticsResponse {
    pub(super) fn into_statistics(
        self,
        endpoint: &str,
        game_id: &str,
    ) -> ProviderResult<GameStatistics> {
        let statistics = self
            .statistics
            .ok_or_else(|| shape(endpoint, "missing `statistics` section"))?;

        let mut rushers = Vec::new();
        for side in [statistics.home, statistics.away] {
            let side = side.ok_or_else(|| shape(endpoint, "missing team statistics"))?;
            let team = side
                .alias
                .ok_or_else(|| shape(endpoint, "team statistics without alias"))?;
            let players = side.rushing.map(|r| r.players).unwrap_or_default();
            rushers.extend(players.into_iter().map(|p| RushingLine {
                player_id: p.id,
                name: p.name,
                team: team.clone(),
                attempts: p.attempts.unwrap_or(0),
                yards: p.yards.unwrap_or(0),
                touchdowns: p.touchdowns.unwrap_or(0),
            }));
        }

        Ok(GameStatistics {
            game_id: self.id.unwrap_or_else(|| game_id.to_string()),
            status: self.status.unwrap_or(GameStatus::Unknown),
            rushers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schedule_maps_games_and_aliases() {
        let raw: RawScheduleResponse = serde_json::from_value(json!({
            "week": { "games": [{
                "id": "g1",
                "status": "scheduled",
                "scheduled": "2024-09-08T17:00:00Z",
                "home": { "id": "team-kc", "alias": "KC" },
                "away": { "alias": "BAL" }
            }]}
        }))
        .unwrap();

        let schedule = raw.into_schedule("schedule", 2024, 1).unwrap();
        let game = schedule.game_for_team("bal").unwrap();
        assert_eq!(game.opponent_of("BAL"), Some("KC"));
        assert_eq!(game.status, GameStatus::Scheduled);
        assert!(game.kickoff.is_some());
        assert_eq!(game.sides(), [("KC", Some("team-kc")), ("BAL", None)]);
    }

    #[test]
    fn roster_keeps_named_players_with_positions() {
        let raw: RawRosterResponse = serde_json::from_value(json!({
            "id": "team-phi",
            "alias": "PHI",
            "players": [
                { "id": "p1", "name": "Saquon Barkley", "position": "RB" },
                { "id": "p2", "first_name": "Kenneth", "last_name": "Gainwell", "position": "rb" },
                { "id": "p3", "name": "Jalen Hurts", "position": "QB" },
                { "id": "p4", "position": "RB" }
            ]
        }))
        .unwrap();

        let roster = raw.into_roster("roster").unwrap();
        assert_eq!(roster.team, "PHI");
        let backs: Vec<&str> = roster
            .players
            .iter()
            .filter(|p| p.is_running_back())
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(backs, vec!["Saquon Barkley", "Kenneth Gainwell"]);
    }

    #[test]
    fn schedule_without_week_is_unexpected_shape() {
        let raw: RawScheduleResponse = serde_json::from_value(json!({ "games": [] })).unwrap();
        let err = raw.into_schedule("schedule", 2024, 1).unwrap_err();
        assert!(matches!(err, ProviderError::UnexpectedShape { .. }));
    }

    #[test]
    fn statistics_flatten_both_sides() {
        let raw: RawStatisticsResponse = serde_json::from_value(json!({
            "id": "g1",
            "status": "closed",
            "statistics": {
                "home": { "alias": "KC", "rushing": { "players": [
                    { "id": "p1", "name": "Isiah Pacheco", "attempts": 14, "yards": 68, "touchdowns": 1 }
                ]}},
                "away": { "alias": "BAL", "rushing": { "players": [
                    { "id": "p2", "name": "Derrick Henry", "attempts": 13, "yards": 46 }
                ]}}
            }
        }))
        .unwrap();

        let stats = raw.into_statistics("stats", "g1").unwrap();
        assert!(stats.status.is_final());
        assert_eq!(stats.rushers.len(), 2);
        let henry = stats.find_rusher("unknown", "derrick henry").unwrap();
        assert_eq!(henry.team, "BAL");
        assert_eq!(henry.touchdowns, 0);
    }

    #[test]
    fn unknown_status_does_not_fail_decoding() {
        let status: GameStatus = serde_json::from_value(json!("flex-schedule")).unwrap();
        assert_eq!(status, GameStatus::Unknown);
    }
}
