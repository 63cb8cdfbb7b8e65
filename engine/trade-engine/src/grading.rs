//! Positional grading
//!
//! Buckets a roster by position and grades each bucket from its average
//! overall rating. Depth is reported separately from the grade so callers
//! can tell "few elite players" from "many mediocre ones".

use crate::config::{DepthPolicy, GradingConfig};
use crate::models::{Player, PlayerId, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Letter grade, ordered F < D < C < B < A
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    F,
    D,
    C,
    B,
    A,
}

impl Grade {
    /// Numeric rank, F = 0 through A = 4
    pub fn rank(self) -> u8 {
        match self {
            Grade::F => 0,
            Grade::D => 1,
            Grade::C => 2,
            Grade::B => 3,
            Grade::A => 4,
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Grade::F => "F",
            Grade::D => "D",
            Grade::C => "C",
            Grade::B => "B",
            Grade::A => "A",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// One rostered player inside a position group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub player_id: PlayerId,
    pub overall: u32,
}

/// All players a roster carries at one position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionGroup {
    pub position: Position,
    /// Sorted by overall rating, highest first (ties by player id)
    pub players: Vec<GroupMember>,
    pub average_rating: f64,
    pub grade: Grade,
    /// Raw player count
    pub depth: usize,
}

/// Position groups for one roster; positions with no players are absent
pub type PositionGrades = BTreeMap<Position, PositionGroup>;

/// A position flagged as weak or strong
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionNeed {
    pub position: Position,
    /// Grade of the counted players
    pub grade: Grade,
    pub counted_depth: usize,
    pub required_depth: usize,
    pub counted_average: f64,
}

/// Weak and strong positions of one roster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeedsReport {
    pub weak: Vec<PositionNeed>,
    pub strong: Vec<PositionNeed>,
}

impl NeedsReport {
    pub fn is_weak(&self, position: &Position) -> bool {
        self.weak.iter().any(|n| &n.position == position)
    }
}

pub struct PositionalGrader {
    config: GradingConfig,
    default_overall: u32,
}

impl PositionalGrader {
    /// `default_overall` stands in for players whose snapshot has no rating
    pub fn new(config: GradingConfig, default_overall: u32) -> Self {
        Self { config, default_overall }
    }

    /// Group a roster by position and grade each group
    pub fn grade(&self, roster: &[&Player]) -> PositionGrades {
        let mut buckets: BTreeMap<Position, Vec<GroupMember>> = BTreeMap::new();
        for player in roster {
            buckets.entry(player.position.clone()).or_default().push(GroupMember {
                player_id: player.id.clone(),
                overall: player.overall_or(self.default_overall),
            });
        }

        let mut grades = PositionGrades::new();
        for (position, mut players) in buckets {
            let Some(average_rating) = average(&players) else {
                continue;
            };
            players.sort_by(|a, b| b.overall.cmp(&a.overall).then_with(|| a.player_id.cmp(&b.player_id)));

            let grade = self.config.cutoffs.grade_for(average_rating);
            debug!(
                "Graded {}: {} (average: {:.2}, depth: {})",
                position,
                grade,
                average_rating,
                players.len()
            );

            grades.insert(
                position.clone(),
                PositionGroup { depth: players.len(), position, players, average_rating, grade },
            );
        }
        grades
    }

    /// Classify positions as weak or strong under the configured depth policy.
    ///
    /// Positions with a depth requirement but no players are weak.
    pub fn needs(&self, grades: &PositionGrades) -> NeedsReport {
        let mut positions: Vec<&Position> = grades.keys().collect();
        for position in self.config.required_depth.keys() {
            if !grades.contains_key(position) {
                positions.push(position);
            }
        }
        positions.sort();

        let mut report = NeedsReport::default();
        for position in positions {
            let counted: &[GroupMember] = match grades.get(position) {
                Some(group) => match self.config.depth {
                    DepthPolicy::All => group.players.as_slice(),
                    DepthPolicy::TopN { n } => &group.players[..n.min(group.players.len())],
                },
                None => &[],
            };

            let counted_average = average(counted).unwrap_or(0.0);
            let need = PositionNeed {
                position: position.clone(),
                grade: self.config.cutoffs.grade_for(counted_average),
                counted_depth: counted.len(),
                required_depth: self.config.required_depth(position),
                counted_average,
            };

            let deep_enough = need.counted_depth >= need.required_depth;
            if need.grade <= self.config.weak_grade || !deep_enough {
                report.weak.push(need);
            } else if need.grade >= self.config.strong_grade {
                report.strong.push(need);
            }
        }
        report
    }
}

/// Mean overall rating; `None` for an empty group
fn average(players: &[GroupMember]) -> Option<f64> {
    if players.is_empty() {
        return None;
    }
    let total: u64 = players.iter().map(|m| m.overall as u64).sum();
    Some(total as f64 / players.len() as f64)
}
