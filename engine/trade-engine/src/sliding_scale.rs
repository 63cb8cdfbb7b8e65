//! Sliding-scale re-pricing
//!
//! A player whose arrival lifts a position's letter grade is worth more to
//! the receiving team. The bonus grows with the size of the grade jump.
//! Downgrades never reduce a value here.

use crate::calculator::{round_value, ValueBreakdown};
use crate::config::SlidingScaleConfig;
use crate::delta::GradeChange;
use crate::grading::Grade;
use crate::models::{PlayerId, Position};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bonus applied to one incoming player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub player_id: PlayerId,
    pub position: Position,
    /// e.g. "C → A"
    pub grade_jump: String,
    pub grade_before: Grade,
    pub grade_after: Grade,
    /// Bonus as a fraction of base value (0.10 = 10%)
    pub adjustment_percentage: f64,
    pub base_value: i64,
    pub adjusted_value: i64,
    /// `adjusted_value - base_value`
    pub value_increase: i64,
}

/// Adjustments for one side of a trade
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlidingScaleSummary {
    pub adjustments: Vec<Adjustment>,
    pub total_adjustments: usize,
    pub total_value_increase: i64,
}

impl SlidingScaleSummary {
    /// Adjusted value for a player, or `None` if the player earned no bonus
    pub fn adjusted_value(&self, player_id: &str) -> Option<i64> {
        self.adjustments
            .iter()
            .find(|a| a.player_id == player_id)
            .map(|a| a.adjusted_value)
    }
}

pub struct SlidingScaleAdjuster {
    config: SlidingScaleConfig,
}

impl SlidingScaleAdjuster {
    pub fn new(config: SlidingScaleConfig) -> Self {
        Self { config }
    }

    /// Re-price the incoming players attributable to each improvement.
    ///
    /// `incoming` holds the base valuations of the players the team receives;
    /// a player is attributable to an improvement when it plays that position.
    pub fn adjust(&self, improvements: &[GradeChange], incoming: &[ValueBreakdown]) -> SlidingScaleSummary {
        let mut adjustments = Vec::new();

        for change in improvements {
            let jump = change.rank_jump();
            if jump <= 0 {
                continue;
            }
            let percentage = self.config.bonus_for(jump as u8);

            for breakdown in incoming.iter().filter(|b| b.position == change.position) {
                let base_value = breakdown.final_value;
                let adjusted_value = round_value(base_value as f64 * (1.0 + percentage)).max(base_value);

                debug!(
                    "Sliding-scale bonus for {} at {}: {} -> {} ({})",
                    breakdown.player_id,
                    change.position,
                    base_value,
                    adjusted_value,
                    change.describe()
                );

                adjustments.push(Adjustment {
                    player_id: breakdown.player_id.clone(),
                    position: change.position.clone(),
                    grade_jump: change.describe(),
                    grade_before: change.grade_before,
                    grade_after: change.grade_after,
                    adjustment_percentage: percentage,
                    base_value,
                    adjusted_value,
                    value_increase: adjusted_value - base_value,
                });
            }
        }

        SlidingScaleSummary {
            total_adjustments: adjustments.len(),
            total_value_increase: adjustments.iter().map(|a| a.value_increase).sum(),
            adjustments,
        }
    }
}
