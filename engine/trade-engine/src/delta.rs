//! Before/after comparison of positional grades

use crate::grading::{Grade, PositionGrades};
use crate::models::Position;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Letter-grade change at one position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeChange {
    pub position: Position,
    pub grade_before: Grade,
    pub grade_after: Grade,
    /// After-average minus before-average
    pub rating_delta: f64,
}

impl GradeChange {
    /// Signed number of letter steps, positive for an improvement
    pub fn rank_jump(&self) -> i8 {
        self.grade_after.rank() as i8 - self.grade_before.rank() as i8
    }

    /// e.g. "C → A"
    pub fn describe(&self) -> String {
        format!("{} → {}", self.grade_before, self.grade_after)
    }
}

/// Improvements and downgrades for one team
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeDelta {
    pub improvements: Vec<GradeChange>,
    pub downgrades: Vec<GradeChange>,
    /// Average-rating delta for every position, including unchanged grades
    pub rating_shifts: BTreeMap<Position, f64>,
}

pub struct GradeDeltaAnalyzer;

impl GradeDeltaAnalyzer {
    /// Diff two snapshots of the same team.
    ///
    /// A position missing from a snapshot compares as grade F with average 0.0.
    pub fn analyze(before: &PositionGrades, after: &PositionGrades) -> GradeDelta {
        let positions: BTreeSet<&Position> = before.keys().chain(after.keys()).collect();
        let mut delta = GradeDelta::default();

        for position in positions {
            let (grade_before, average_before) = snapshot(before, position);
            let (grade_after, average_after) = snapshot(after, position);
            let rating_delta = average_after - average_before;
            delta.rating_shifts.insert(position.clone(), rating_delta);

            let change = GradeChange { position: position.clone(), grade_before, grade_after, rating_delta };
            if grade_after > grade_before {
                delta.improvements.push(change);
            } else if grade_after < grade_before {
                delta.downgrades.push(change);
            }
        }
        delta
    }
}

fn snapshot(grades: &PositionGrades, position: &Position) -> (Grade, f64) {
    grades
        .get(position)
        .map(|group| (group.grade, group.average_rating))
        .unwrap_or((Grade::F, 0.0))
}
