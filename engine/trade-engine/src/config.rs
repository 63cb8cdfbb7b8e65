use crate::error::{Result, TradeEngineError};
use crate::grading::Grade;
use crate::models::{DevTrait, Position};
use crate::risk::RiskLevel;
use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Environment prefix for configuration overrides, e.g. `TRADE_ENGINE__RISK__LOW=12`
pub const ENV_PREFIX: &str = "TRADE_ENGINE";

/// League-tunable configuration for the trade engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    /// Version tag of this rule set, echoed for auditability
    pub version: String,

    /// Player valuation tables
    pub valuation: ValuationConfig,

    /// Positional grading cutoffs and depth rules
    pub grading: GradingConfig,

    /// Sliding-scale bonus curve
    pub sliding_scale: SlidingScaleConfig,

    /// Risk / balance bands
    pub risk: RiskThresholds,

    /// Verdict bands
    pub verdict: VerdictThresholds,

    /// Confidence curve
    pub confidence: ConfidenceCurve,

    /// Auto-approval gate
    pub approval: ApprovalPolicy,

    /// Trade-suggestion search
    pub suggestions: SuggestionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// Rating used when a player snapshot has none
    pub default_overall: u32,

    /// Age at which the age factor is exactly 1.0
    pub age_pivot: u32,

    /// Factor lost per year past the pivot (gained per year before it)
    pub age_decay_per_year: f64,

    /// Lower bound of the age factor; there is no upper bound
    pub age_floor: f64,

    pub dev_multipliers: DevMultipliers,

    /// Per-position multipliers; listed positions override the defaults
    #[serde(deserialize_with = "overlay::position_multipliers")]
    pub position_multipliers: BTreeMap<Position, f64>,

    /// Multiplier for positions missing from the table
    pub default_position_multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevMultipliers {
    pub normal: f64,
    pub star: f64,
    pub superstar: f64,
    pub hidden: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    pub cutoffs: GradeCutoffs,

    /// Which players count toward depth for weak/strong classification
    pub depth: DepthPolicy,

    /// Minimum counted depth per position; listed positions override the defaults
    #[serde(deserialize_with = "overlay::required_depth")]
    pub required_depth: BTreeMap<Position, usize>,

    /// Required depth for positions missing from the table
    pub default_required_depth: usize,

    /// Positions graded at or below this are weak
    pub weak_grade: Grade,

    /// Positions graded at or above this (with enough depth) are strong
    pub strong_grade: Grade,
}

/// Minimum average rating for each letter grade; anything below `d` is F
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeCutoffs {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

/// Depth counting policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DepthPolicy {
    /// Every rostered player counts
    #[default]
    All,
    /// Only the top `n` players by overall rating count
    TopN { n: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidingScaleConfig {
    /// Bonus fraction indexed by grade-rank jump minus one (0.10 = 10%)
    pub bonus_by_jump: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// |net gain| below this is Low risk / Balanced
    pub low: i64,
    /// |net gain| below this is Medium risk / Slightly Unbalanced
    pub mid: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictThresholds {
    /// |net gain| up to and including this is Fair
    pub fair: i64,
    /// When set, |net gain| above this is a Big win/loss
    pub big: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceCurve {
    /// Confidence at a verdict boundary, in percent
    pub floor: f64,
    /// Maximum confidence, in percent
    pub ceiling: f64,
    /// Percentage points gained per value point past the fair threshold
    pub slope: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalPolicy {
    /// Only Fair verdicts may be auto-approved
    pub require_fair: bool,
    /// Highest risk level that may be auto-approved
    pub max_risk: RiskLevel,
    /// Minimum confidence, in percent
    pub min_confidence: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    pub max_candidates: usize,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            version: "2025.1".to_string(),
            valuation: ValuationConfig::default(),
            grading: GradingConfig::default(),
            sliding_scale: SlidingScaleConfig::default(),
            risk: RiskThresholds::default(),
            verdict: VerdictThresholds::default(),
            confidence: ConfidenceCurve::default(),
            approval: ApprovalPolicy::default(),
            suggestions: SuggestionConfig::default(),
        }
    }
}

impl Default for ValuationConfig {
    fn default() -> Self {
        let position_multipliers = [
            (Position::QB, 1.2),
            (Position::HB, 1.0),
            (Position::FB, 0.7),
            (Position::WR, 1.1),
            (Position::TE, 0.9),
            (Position::LT, 0.9),
            (Position::LG, 0.7),
            (Position::C, 0.7),
            (Position::RG, 0.7),
            (Position::RT, 0.8),
            (Position::LE, 0.9),
            (Position::RE, 0.9),
            (Position::DT, 0.8),
            (Position::LOLB, 0.9),
            (Position::MLB, 1.0),
            (Position::ROLB, 0.9),
            (Position::CB, 1.0),
            (Position::FS, 0.9),
            (Position::SS, 0.9),
            (Position::K, 0.5),
            (Position::P, 0.4),
        ]
        .into_iter()
        .collect();

        Self {
            default_overall: 75,
            age_pivot: 22,
            age_decay_per_year: 0.02,
            age_floor: 0.7,
            dev_multipliers: DevMultipliers::default(),
            position_multipliers,
            default_position_multiplier: 1.0,
        }
    }
}

impl Default for DevMultipliers {
    fn default() -> Self {
        Self { normal: 1.0, star: 1.2, superstar: 1.3, hidden: 1.1 }
    }
}

impl Default for GradingConfig {
    fn default() -> Self {
        let required_depth = [
            (Position::QB, 2),
            (Position::HB, 2),
            (Position::WR, 3),
            (Position::TE, 2),
            (Position::DT, 2),
            (Position::CB, 3),
        ]
        .into_iter()
        .collect();

        Self {
            cutoffs: GradeCutoffs::default(),
            depth: DepthPolicy::All,
            required_depth,
            default_required_depth: 1,
            weak_grade: Grade::D,
            strong_grade: Grade::B,
        }
    }
}

impl Default for GradeCutoffs {
    fn default() -> Self {
        Self { a: 85.0, b: 78.0, c: 72.0, d: 65.0 }
    }
}

impl Default for SlidingScaleConfig {
    fn default() -> Self {
        Self { bonus_by_jump: vec![0.10, 0.20, 0.35, 0.50] }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self { low: 10, mid: 25 }
    }
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self { fair: 15, big: None }
    }
}

impl Default for ConfidenceCurve {
    fn default() -> Self {
        Self { floor: 50.0, ceiling: 95.0, slope: 2.0 }
    }
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self { require_fair: true, max_risk: RiskLevel::Medium, min_confidence: 60 }
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self { max_candidates: 3 }
    }
}

impl LeagueConfig {
    /// Load configuration from an optional TOML/JSON file, then
    /// `TRADE_ENGINE__*` environment variables. Missing keys take defaults,
    /// per-position tables merge over the default tables, and a list given
    /// by a source replaces the default list.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config: LeagueConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a complete or partial configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LeagueConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the monotonicity and range rules every rule set must satisfy
    pub fn validate(&self) -> Result<()> {
        let v = &self.valuation;
        if !(v.age_floor > 0.0 && v.age_floor <= 1.0) {
            return Err(TradeEngineError::invalid_config(format!(
                "age_floor must be in (0, 1], got {}",
                v.age_floor
            )));
        }
        if !(v.age_decay_per_year >= 0.0) {
            return Err(TradeEngineError::invalid_config("age_decay_per_year must be non-negative"));
        }

        let d = &v.dev_multipliers;
        let mut multipliers = vec![
            ("dev_multipliers.normal".to_string(), d.normal),
            ("dev_multipliers.star".to_string(), d.star),
            ("dev_multipliers.superstar".to_string(), d.superstar),
            ("dev_multipliers.hidden".to_string(), d.hidden),
            ("default_position_multiplier".to_string(), v.default_position_multiplier),
        ];
        multipliers.extend(
            v.position_multipliers
                .iter()
                .map(|(position, m)| (format!("position_multipliers.{position}"), *m)),
        );
        if let Some((name, m)) = multipliers.iter().find(|(_, m)| !(m.is_finite() && *m >= 0.0)) {
            return Err(TradeEngineError::invalid_config(format!(
                "{name} must be a non-negative number, got {m}"
            )));
        }

        let c = &self.grading.cutoffs;
        if !(c.a > c.b && c.b > c.c && c.c > c.d) {
            return Err(TradeEngineError::invalid_config(format!(
                "grade cutoffs must be strictly decreasing (A > B > C > D), got {}/{}/{}/{}",
                c.a, c.b, c.c, c.d
            )));
        }
        if let DepthPolicy::TopN { n: 0 } = self.grading.depth {
            return Err(TradeEngineError::invalid_config("depth policy top_n requires n >= 1"));
        }
        if self.grading.weak_grade >= self.grading.strong_grade {
            return Err(TradeEngineError::invalid_config("weak_grade must be below strong_grade"));
        }

        let curve = &self.sliding_scale.bonus_by_jump;
        if curve.iter().any(|b| !(b.is_finite() && *b >= 0.0)) {
            return Err(TradeEngineError::invalid_config("sliding-scale bonuses must be non-negative"));
        }
        if curve.windows(2).any(|w| w[1] <= w[0]) {
            return Err(TradeEngineError::invalid_config(
                "sliding-scale bonuses must increase with the grade jump",
            ));
        }

        if !(0 <= self.risk.low && self.risk.low < self.risk.mid) {
            return Err(TradeEngineError::invalid_config(format!(
                "risk thresholds must satisfy 0 <= low < mid, got {} / {}",
                self.risk.low, self.risk.mid
            )));
        }

        if self.verdict.fair < 0 {
            return Err(TradeEngineError::invalid_config("fair threshold must be non-negative"));
        }
        if let Some(big) = self.verdict.big {
            if big <= self.verdict.fair {
                return Err(TradeEngineError::invalid_config(format!(
                    "big threshold ({big}) must exceed the fair threshold ({})",
                    self.verdict.fair
                )));
            }
        }

        let conf = &self.confidence;
        if !(0.0 <= conf.floor && conf.floor <= conf.ceiling && conf.ceiling <= 100.0 && conf.slope >= 0.0) {
            return Err(TradeEngineError::invalid_config(
                "confidence curve must satisfy 0 <= floor <= ceiling <= 100 and slope >= 0",
            ));
        }

        Ok(())
    }
}

impl ValuationConfig {
    /// Multiplier for a position, falling back to the default for unlisted ones
    pub fn position_multiplier(&self, position: &Position) -> f64 {
        self.position_multipliers
            .get(position)
            .copied()
            .unwrap_or(self.default_position_multiplier)
    }

    pub fn dev_multiplier(&self, dev_trait: DevTrait) -> f64 {
        let d = &self.dev_multipliers;
        match dev_trait {
            DevTrait::Normal => d.normal,
            DevTrait::Star => d.star,
            DevTrait::Superstar => d.superstar,
            DevTrait::Hidden => d.hidden,
        }
    }
}

impl GradeCutoffs {
    /// Map an average rating to its letter grade
    pub fn grade_for(&self, average: f64) -> Grade {
        if average >= self.a {
            Grade::A
        } else if average >= self.b {
            Grade::B
        } else if average >= self.c {
            Grade::C
        } else if average >= self.d {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl GradingConfig {
    pub fn required_depth(&self, position: &Position) -> usize {
        self.required_depth
            .get(position)
            .copied()
            .unwrap_or(self.default_required_depth)
    }
}

impl SlidingScaleConfig {
    /// Bonus fraction for a grade-rank jump; jumps past the table use its last entry
    pub fn bonus_for(&self, jump: u8) -> f64 {
        if jump == 0 {
            return 0.0;
        }
        let idx = (jump as usize - 1).min(self.bonus_by_jump.len().saturating_sub(1));
        self.bonus_by_jump.get(idx).copied().unwrap_or(0.0)
    }
}

/// Per-position tables read from a source extend the default table
mod overlay {
    use super::*;

    pub fn position_multipliers<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<Position, f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut table = ValuationConfig::default().position_multipliers;
        table.extend(BTreeMap::<Position, f64>::deserialize(deserializer)?);
        Ok(table)
    }

    pub fn required_depth<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<Position, usize>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut table = GradingConfig::default().required_depth;
        table.extend(BTreeMap::<Position, usize>::deserialize(deserializer)?);
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = LeagueConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.valuation.position_multiplier(&Position::QB), 1.2);
        assert_eq!(config.valuation.position_multiplier(&Position::P), 0.4);
        assert_eq!(config.valuation.position_multiplier(&Position::Other("EDGE".into())), 1.0);
        assert_eq!(config.valuation.dev_multiplier(DevTrait::Superstar), 1.3);
    }

    #[test]
    fn test_grade_cutoffs() {
        let cutoffs = GradeCutoffs::default();
        assert_eq!(cutoffs.grade_for(85.0), Grade::A);
        assert_eq!(cutoffs.grade_for(84.99), Grade::B);
        assert_eq!(cutoffs.grade_for(72.0), Grade::C);
        assert_eq!(cutoffs.grade_for(65.0), Grade::D);
        assert_eq!(cutoffs.grade_for(64.9), Grade::F);
        assert_eq!(cutoffs.grade_for(0.0), Grade::F);
    }

    #[test]
    fn test_bonus_curve_lookup() {
        let scale = SlidingScaleConfig::default();
        assert_eq!(scale.bonus_for(0), 0.0);
        assert_eq!(scale.bonus_for(1), 0.10);
        assert_eq!(scale.bonus_for(2), 0.20);
        assert_eq!(scale.bonus_for(4), 0.50);
        assert_eq!(scale.bonus_for(9), 0.50);
        assert_eq!(SlidingScaleConfig { bonus_by_jump: vec![] }.bonus_for(2), 0.0);
    }

    #[test]
    fn test_validate_rejects_non_monotone_cutoffs() {
        let mut config = LeagueConfig::default();
        config.grading.cutoffs.c = 80.0;
        assert!(matches!(config.validate(), Err(TradeEngineError::InvalidConfig { .. })));
    }

    #[test]
    fn test_validate_rejects_flat_bonus_curve() {
        let mut config = LeagueConfig::default();
        config.sliding_scale.bonus_by_jump = vec![0.1, 0.1];
        assert!(matches!(config.validate(), Err(TradeEngineError::InvalidConfig { .. })));
    }

    #[test]
    fn test_validate_rejects_negative_multiplier() {
        let mut config = LeagueConfig::default();
        config.valuation.position_multipliers.insert(Position::K, -0.5);
        assert!(matches!(config.validate(), Err(TradeEngineError::InvalidConfig { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let mut config = LeagueConfig::default();
        config.risk = RiskThresholds { low: 25, mid: 10 };
        assert!(config.validate().is_err());

        let mut config = LeagueConfig::default();
        config.verdict.big = Some(10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_config() {
        let json = r#"{
            "version": "test-league",
            "verdict": { "fair": 10, "big": 30 },
            "grading": { "depth": { "mode": "top_n", "n": 2 } },
            "valuation": { "position_multipliers": { "qb": 1.5 } }
        }"#;

        let config = LeagueConfig::from_json(json).unwrap();
        assert_eq!(config.version, "test-league");
        assert_eq!(config.verdict.fair, 10);
        assert_eq!(config.verdict.big, Some(30));
        assert_eq!(config.grading.depth, DepthPolicy::TopN { n: 2 });
        assert_eq!(config.valuation.position_multiplier(&Position::QB), 1.5);
        assert_eq!(config.valuation.position_multiplier(&Position::WR), 1.1);
        assert_eq!(config.valuation.position_multiplier(&Position::K), 0.5);
        assert_eq!(config.risk, RiskThresholds::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
version = "file-league"

[risk]
low = 5
mid = 20

[sliding_scale]
bonus_by_jump = [0.05, 0.15]
"#
        )
        .unwrap();

        let config = LeagueConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.version, "file-league");
        assert_eq!(config.risk, RiskThresholds { low: 5, mid: 20 });
        assert_eq!(config.sliding_scale.bonus_by_jump, vec![0.05, 0.15]);
        assert_eq!(config.verdict.fair, 15);
        assert_eq!(config.grading.cutoffs, GradeCutoffs::default());
    }

    #[test]
    fn test_partial_tables_keep_default_entries() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[valuation.position_multipliers]
QB = 1.5

[grading.required_depth]
WR = 4
"#
        )
        .unwrap();

        let config = LeagueConfig::load(Some(file.path())).unwrap();
        let valuation = &config.valuation;
        assert_eq!(valuation.position_multiplier(&Position::QB), 1.5);
        assert_eq!(valuation.position_multiplier(&Position::WR), 1.1);
        assert_eq!(valuation.position_multiplier(&Position::K), 0.5);
        assert_eq!(valuation.position_multiplier(&Position::P), 0.4);

        assert_eq!(config.grading.required_depth(&Position::WR), 4);
        assert_eq!(config.grading.required_depth(&Position::CB), 3);
        assert_eq!(config.grading.required_depth(&Position::QB), 2);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[suggestions]\nmax_candidates = 2").unwrap();

        std::env::set_var("TRADE_ENGINE__SUGGESTIONS__MAX_CANDIDATES", "7");
        let loaded = LeagueConfig::load(Some(file.path()));
        std::env::remove_var("TRADE_ENGINE__SUGGESTIONS__MAX_CANDIDATES");

        let config = loaded.unwrap();
        assert_eq!(config.suggestions.max_candidates, 7);
        assert_eq!(config.verdict, VerdictThresholds::default());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[risk]\nlow = 30\nmid = 20").unwrap();

        assert!(matches!(
            LeagueConfig::load(Some(file.path())),
            Err(TradeEngineError::InvalidConfig { .. })
        ));
    }
}
