use crate::config::ValuationConfig;
use crate::models::{Player, PlayerId, Position};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One audited step of a value calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationStep {
    pub label: String,
    pub formula: String,
    /// Unrounded stage result
    pub result: f64,
}

impl CalculationStep {
    fn new(label: &str, formula: String, result: f64) -> Self {
        Self { label: label.to_string(), formula, result }
    }
}

/// Full value calculation for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBreakdown {
    pub player_id: PlayerId,
    pub position: Position,
    pub base_rating: u32,
    pub age_factor: f64,
    pub dev_multiplier: f64,
    pub position_multiplier: f64,
    /// `base × age_factor`, rounded for display only
    pub after_age: i64,
    /// `base × age_factor × dev_multiplier`, rounded for display only
    pub after_dev: i64,
    pub steps: Vec<CalculationStep>,
    pub final_value: i64,
}

/// Scores single players into trade values
pub struct ValueCalculator {
    config: ValuationConfig,
}

impl ValueCalculator {
    pub fn new(config: ValuationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// `max(floor, 1 - (age - pivot) × decay)`; unknown age is neutral.
    /// Players younger than the pivot score above 1.0.
    pub fn age_factor(&self, age: Option<u32>) -> f64 {
        match age {
            Some(age) => {
                let years = age as f64 - self.config.age_pivot as f64;
                (1.0 - years * self.config.age_decay_per_year).max(self.config.age_floor)
            }
            None => 1.0,
        }
    }

    /// Calculate a player's trade value.
    ///
    /// Stages chain without intermediate rounding; only the final value is
    /// rounded. The rounded `after_age`/`after_dev` are never fed forward.
    pub fn calculate(&self, player: &Player) -> ValueBreakdown {
        if player.overall.is_none() {
            warn!(
                "Player {} has no overall rating, using default {}",
                player.id, self.config.default_overall
            );
        }

        let base = player.overall_or(self.config.default_overall);
        let age_factor = self.age_factor(player.age);
        let dev_trait = player.dev_trait();
        let dev_multiplier = self.config.dev_multiplier(dev_trait);
        let position_multiplier = self.config.position_multiplier(&player.position);

        let after_age = base as f64 * age_factor;
        let after_dev = after_age * dev_multiplier;
        let raw = after_dev * position_multiplier;
        let final_value = round_value(raw);

        let age_formula = match player.age {
            Some(age) => format!(
                "max({:.2}, 1.00 - ({} - {}) × {:.2})",
                self.config.age_floor, age, self.config.age_pivot, self.config.age_decay_per_year
            ),
            None => "age unknown".to_string(),
        };

        let steps = vec![
            CalculationStep::new("Base Rating", format!("overall = {base}"), base as f64),
            CalculationStep::new("Age Factor", age_formula, age_factor),
            CalculationStep::new("After Age", format!("{base} × {age_factor:.2}"), after_age),
            CalculationStep::new(
                "After Development",
                format!("{after_age:.2} × {dev_multiplier:.2} ({})", dev_trait.label()),
                after_dev,
            ),
            CalculationStep::new(
                "After Position",
                format!("{after_dev:.2} × {position_multiplier:.2} ({})", player.position),
                raw,
            ),
            CalculationStep::new("Final Value", format!("round({raw:.2})"), final_value as f64),
        ];

        debug!(
            "Valued player {}: {} (base: {}, age: {:.2}, dev: {:.2}, pos: {:.2})",
            player.id, final_value, base, age_factor, dev_multiplier, position_multiplier
        );

        ValueBreakdown {
            player_id: player.id.clone(),
            position: player.position.clone(),
            base_rating: base,
            age_factor,
            dev_multiplier,
            position_multiplier,
            after_age: round_value(after_age),
            after_dev: round_value(after_dev),
            steps,
            final_value,
        }
    }
}

/// Round to the nearest whole value, never below zero (NaN becomes zero)
pub(crate) fn round_value(raw: f64) -> i64 {
    raw.round().max(0.0) as i64
}

/// Value of one side of a trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideValue {
    pub breakdowns: Vec<ValueBreakdown>,
    pub total: i64,
}

/// Sums player values for one side of a trade
pub struct TeamValuator<'a> {
    calculator: &'a ValueCalculator,
}

impl<'a> TeamValuator<'a> {
    pub fn new(calculator: &'a ValueCalculator) -> Self {
        Self { calculator }
    }

    pub fn value(&self, players: &[&Player]) -> SideValue {
        let breakdowns: Vec<ValueBreakdown> = players.iter().map(|p| self.calculator.calculate(p)).collect();
        let total = Self::total(&breakdowns);
        SideValue { breakdowns, total }
    }

    /// Sum of final values; an empty side is worth 0
    pub fn total(breakdowns: &[ValueBreakdown]) -> i64 {
        breakdowns.iter().map(|b| b.final_value).sum()
    }
}
