//! Trade Evaluation Engine
//!
//! Values the players on both sides of a proposed trade, grades each team's
//! position groups before and after, re-prices incoming players whose arrival
//! lifts a position grade, and returns a verdict with a full audit trail.

pub mod calculator;
pub mod config;
pub mod delta;
pub mod engine;
pub mod error;
pub mod grading;
pub mod models;
pub mod risk;
pub mod sliding_scale;
pub mod suggestions;
pub mod verdict;

pub use calculator::{TeamValuator, ValueBreakdown, ValueCalculator};
pub use config::LeagueConfig;
pub use delta::{GradeChange, GradeDelta, GradeDeltaAnalyzer};
pub use engine::{EvaluationStage, TradeAssessment, TradeEvaluation, TradeEvaluator};
pub use error::{Result, TradeEngineError};
pub use grading::{Grade, PositionalGrader, PositionGrades};
pub use models::*;
pub use risk::{Balance, RiskClassifier, RiskLevel};
pub use sliding_scale::{SlidingScaleAdjuster, SlidingScaleSummary};
pub use suggestions::TradeSuggestion;
pub use verdict::Verdict;
