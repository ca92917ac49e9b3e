//! Playoff roster layout: the 17 position slots and the composition rules a
//! fantasy team must satisfy.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Number of players on a playoff roster.
pub const ROSTER_SIZE: usize = 17;

/// On-field position of a fantasy player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    /// Quarterback.
    Qb,
    /// Running back.
    Rb,
    /// Wide receiver.
    Wr,
    /// Tight end.
    Te,
    /// Kicker.
    K,
}

impl Position {
    /// Parse a position label, tolerating case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "QB" => Some(Position::Qb),
            "RB" => Some(Position::Rb),
            "WR" => Some(Position::Wr),
            "TE" => Some(Position::Te),
            "K" => Some(Position::K),
            _ => None,
        }
    }

    /// Uppercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Position::Qb => "QB",
            Position::Rb => "RB",
            Position::Wr => "WR",
            Position::Te => "TE",
            Position::K => "K",
        }
    }

    /// Whether the position may fill a FLEX slot.
    pub fn is_flex_eligible(self) -> bool {
        matches!(self, Position::Rb | Position::Wr | Position::Te)
    }

    /// Number of non-FLEX slots reserved for this position.
    fn required_count(self) -> usize {
        match self {
            Position::Qb | Position::Rb => 3,
            Position::Wr => 4,
            Position::Te | Position::K => 2,
        }
    }
}

/// What a roster slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Only the given position.
    Fixed(Position),
    /// Any RB, WR or TE.
    Flex,
}

/// One of the 17 roster slots, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum PositionSlot {
    /// Quarterback slot 1.
    QB1,
    /// Quarterback slot 2.
    QB2,
    /// Quarterback slot 3.
    QB3,
    /// Running back slot 1.
    RB1,
    /// Running back slot 2.
    RB2,
    /// Running back slot 3.
    RB3,
    /// Wide receiver slot 1.
    WR1,
    /// Wide receiver slot 2.
    WR2,
    /// Wide receiver slot 3.
    WR3,
    /// Wide receiver slot 4.
    WR4,
    /// Tight end slot 1.
    TE1,
    /// Tight end slot 2.
    TE2,
    /// Kicker slot 1.
    K1,
    /// Kicker slot 2.
    K2,
    /// Flex slot 1.
    FLEX1,
    /// Flex slot 2.
    FLEX2,
    /// Flex slot 3.
    FLEX3,
}

impl PositionSlot {
    /// Slots in the order used by spreadsheets and bulk imports.
    pub const ALL: [PositionSlot; ROSTER_SIZE] = [
        PositionSlot::QB1,
        PositionSlot::QB2,
        PositionSlot::QB3,
        PositionSlot::RB1,
        PositionSlot::RB2,
        PositionSlot::RB3,
        PositionSlot::WR1,
        PositionSlot::WR2,
        PositionSlot::WR3,
        PositionSlot::WR4,
        PositionSlot::TE1,
        PositionSlot::TE2,
        PositionSlot::K1,
        PositionSlot::K2,
        PositionSlot::FLEX1,
        PositionSlot::FLEX2,
        PositionSlot::FLEX3,
    ];

    /// Positions the slot accepts.
    pub fn kind(self) -> SlotKind {
        use PositionSlot::*;
        match self {
            QB1 | QB2 | QB3 => SlotKind::Fixed(Position::Qb),
            RB1 | RB2 | RB3 => SlotKind::Fixed(Position::Rb),
            WR1 | WR2 | WR3 | WR4 => SlotKind::Fixed(Position::Wr),
            TE1 | TE2 => SlotKind::Fixed(Position::Te),
            K1 | K2 => SlotKind::Fixed(Position::K),
            FLEX1 | FLEX2 | FLEX3 => SlotKind::Flex,
        }
    }

    /// Whether the slot is a FLEX slot.
    pub fn is_flex(self) -> bool {
        self.kind() == SlotKind::Flex
    }

    /// Human readable label ("QB 1", "FLEX 2").
    pub fn label(self) -> String {
        let raw = format!("{self:?}");
        let split = raw
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(raw.len());
        format!("{} {}", &raw[..split], &raw[split..])
    }
}

/// Player information needed to validate a roster entry.
#[derive(Debug, Clone)]
pub struct RosterCandidate<'a> {
    /// Requested slot.
    pub slot: PositionSlot,
    /// Player id.
    pub player_id: Uuid,
    /// Player name, for error messages.
    pub name: &'a str,
    /// Player position.
    pub position: Position,
    /// NFL team abbreviation.
    pub nfl_team: &'a str,
}

/// Validate a full roster, collecting every rule violation.
///
/// Non-FLEX slots must match their position and come from distinct NFL teams;
/// the position counts must be 3 QB, 3 RB, 4 WR, 2 TE and 2 K; the three FLEX
/// slots take RB, WR or TE. Slots and players may each appear only once.
pub fn validate_composition(entries: &[RosterCandidate<'_>]) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let mut seen_slots = HashSet::new();
    let mut seen_players = HashSet::new();
    for entry in entries {
        if !seen_slots.insert(entry.slot) {
            errors.push(format!("{} is assigned more than once", entry.slot.label()));
        }
        if !seen_players.insert(entry.player_id) {
            errors.push(format!("{} appears in more than one slot", entry.name));
        }
    }

    let mut nfl_teams = HashSet::new();
    let mut counts: HashMap<Position, usize> = HashMap::new();
    let mut flex_count = 0;

    for entry in entries {
        match entry.slot.kind() {
            SlotKind::Fixed(expected) => {
                if !nfl_teams.insert(entry.nfl_team) {
                    errors.push(format!(
                        "Multiple players from {} in non-FLEX positions",
                        entry.nfl_team
                    ));
                }
                if expected != entry.position {
                    errors.push(format!(
                        "{} must be a {}, but {} is a {}",
                        entry.slot.label(),
                        expected.as_str(),
                        entry.name,
                        entry.position.as_str()
                    ));
                }
                *counts.entry(entry.position).or_default() += 1;
            }
            SlotKind::Flex => {
                flex_count += 1;
                if !entry.position.is_flex_eligible() {
                    errors.push(format!(
                        "FLEX positions must be RB, WR, or TE, but {} is a {}",
                        entry.name,
                        entry.position.as_str()
                    ));
                }
            }
        }
    }

    for position in [
        Position::Qb,
        Position::Rb,
        Position::Wr,
        Position::Te,
        Position::K,
    ] {
        let found = counts.get(&position).copied().unwrap_or(0);
        let required = position.required_count();
        if found != required {
            errors.push(format!(
                "Must have exactly {required} {}s, found {found}",
                position.as_str()
            ));
        }
    }

    if flex_count != 3 {
        errors.push(format!("Must have exactly 3 FLEX players, found {flex_count}"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether roster edits are closed at `now` given the configured lock instant.
pub fn teams_locked(lock_at: OffsetDateTime, now: OffsetDateTime) -> bool {
    now >= lock_at
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        id: Uuid,
        name: String,
        position: Position,
        team: String,
    }

    fn fixture(name: &str, position: Position, team: &str) -> Fixture {
        Fixture {
            id: Uuid::new_v4(),
            name: name.into(),
            position,
            team: team.into(),
        }
    }

    fn valid_roster() -> Vec<(PositionSlot, Fixture)> {
        use Position::*;
        let players = [
            ("QB A", Qb, "KC"),
            ("QB B", Qb, "BUF"),
            ("QB C", Qb, "PHI"),
            ("RB A", Rb, "DET"),
            ("RB B", Rb, "BAL"),
            ("RB C", Rb, "SF"),
            ("WR A", Wr, "MIA"),
            ("WR B", Wr, "DAL"),
            ("WR C", Wr, "CIN"),
            ("WR D", Wr, "MIN"),
            ("TE A", Te, "LV"),
            ("TE B", Te, "GB"),
            ("K A", K, "HOU"),
            ("K B", K, "LAR"),
            ("FLEX A", Rb, "KC"),
            ("FLEX B", Wr, "KC"),
            ("FLEX C", Te, "BUF"),
        ];
        PositionSlot::ALL
            .iter()
            .zip(players)
            .map(|(slot, (name, pos, team))| (*slot, fixture(name, pos, team)))
            .collect()
    }

    fn candidates(roster: &[(PositionSlot, Fixture)]) -> Vec<RosterCandidate<'_>> {
        roster
            .iter()
            .map(|(slot, f)| RosterCandidate {
                slot: *slot,
                player_id: f.id,
                name: &f.name,
                position: f.position,
                nfl_team: &f.team,
            })
            .collect()
    }

    #[test]
    fn full_roster_passes() {
        let roster = valid_roster();
        assert!(validate_composition(&candidates(&roster)).is_ok());
    }

    #[test]
    fn flex_players_may_share_nfl_teams_with_fixed_slots() {
        let roster = valid_roster();
        let flex_teams: Vec<_> = roster
            .iter()
            .filter(|(slot, _)| slot.is_flex())
            .map(|(_, f)| f.team.as_str())
            .collect();
        assert!(flex_teams.contains(&"KC"));
        assert!(validate_composition(&candidates(&roster)).is_ok());
    }

    #[test]
    fn duplicate_nfl_team_in_fixed_slots_is_rejected() {
        let mut roster = valid_roster();
        roster[1].1.team = "KC".into();
        let errors = validate_composition(&candidates(&roster)).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("Multiple players from KC")));
    }

    #[test]
    fn kicker_in_flex_is_rejected() {
        let mut roster = valid_roster();
        roster[16].1.position = Position::K;
        let errors = validate_composition(&candidates(&roster)).unwrap_err();
        assert!(errors.iter().any(|e| e.starts_with("FLEX positions")));
    }

    #[test]
    fn wrong_position_in_slot_reports_slot_and_counts() {
        let mut roster = valid_roster();
        roster[0].1.position = Position::Wr;
        let errors = validate_composition(&candidates(&roster)).unwrap_err();
        assert!(errors.iter().any(|e| e.starts_with("QB 1 must be a QB")));
        assert!(errors.iter().any(|e| e == "Must have exactly 3 QBs, found 2"));
        assert!(errors.iter().any(|e| e == "Must have exactly 4 WRs, found 5"));
    }

    #[test]
    fn short_roster_reports_missing_flex() {
        let roster = valid_roster();
        let errors = validate_composition(&candidates(&roster[..15])).unwrap_err();
        assert!(errors.iter().any(|e| e == "Must have exactly 3 FLEX players, found 1"));
    }

    #[test]
    fn slot_labels_are_readable() {
        assert_eq!(PositionSlot::QB1.label(), "QB 1");
        assert_eq!(PositionSlot::FLEX3.label(), "FLEX 3");
        assert_eq!(PositionSlot::K2.label(), "K 2");
    }

    #[test]
    fn position_parse_is_lenient() {
        assert_eq!(Position::parse(" rb "), Some(Position::Rb));
        assert_eq!(Position::parse("DST"), None);
    }
}
