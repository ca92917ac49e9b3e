//! Fantasy point computation for playoff players.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Box-score line tracked for a fantasy player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct StatLine {
    /// Passing yards.
    pub passing_yds: i32,
    /// Passing touchdowns.
    pub passing_td: i32,
    /// Interceptions thrown.
    pub int: i32,
    /// Rushing yards.
    pub rush_yds: i32,
    /// Rushing touchdowns.
    pub rush_td: i32,
    /// Receptions.
    pub rec: i32,
    /// Receiving yards.
    pub rec_yds: i32,
    /// Receiving touchdowns.
    pub rec_td: i32,
    /// Fumbles lost.
    pub fum: i32,
    /// Points scored by kicking.
    pub kicking_pts: i32,
}

/// Point values applied to a [`StatLine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringRules {
    /// Passing yards worth one point.
    pub passing_yards_per_point: f64,
    /// Points per passing touchdown.
    pub passing_td: f64,
    /// Points per interception, negative.
    pub interception: f64,
    /// Rushing yards worth one point.
    pub rushing_yards_per_point: f64,
    /// Points per rushing touchdown.
    pub rushing_td: f64,
    /// Points per reception.
    pub reception: f64,
    /// Receiving yards worth one point.
    pub receiving_yards_per_point: f64,
    /// Points per receiving touchdown.
    pub receiving_td: f64,
    /// Points per fumble lost, negative.
    pub fumble: f64,
    /// Fantasy points per kicking point.
    pub kicking_point: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            passing_yards_per_point: 25.0,
            passing_td: 4.0,
            interception: -2.0,
            rushing_yards_per_point: 10.0,
            rushing_td: 6.0,
            reception: 1.0,
            receiving_yards_per_point: 10.0,
            receiving_td: 6.0,
            fumble: -2.0,
            kicking_point: 1.0,
        }
    }
}

impl ScoringRules {
    /// Total fantasy points for a line, rounded to two decimals.
    pub fn points(&self, line: &StatLine) -> f64 {
        let per = |value: i32, divisor: f64| {
            if divisor > 0.0 {
                value as f64 / divisor
            } else {
                0.0
            }
        };

        let total = per(line.passing_yds, self.passing_yards_per_point)
            + line.passing_td as f64 * self.passing_td
            + line.int as f64 * self.interception
            + per(line.rush_yds, self.rushing_yards_per_point)
            + line.rush_td as f64 * self.rushing_td
            + line.rec as f64 * self.reception
            + per(line.rec_yds, self.receiving_yards_per_point)
            + line.rec_td as f64 * self.receiving_td
            + line.fum as f64 * self.fumble
            + line.kicking_pts as f64 * self.kicking_point;

        (total * 100.0).round() / 100.0
    }
}
