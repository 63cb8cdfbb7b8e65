use crate::config::RiskThresholds;
use serde::{Deserialize, Serialize};

/// Risk level, ordered Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Balance {
    Balanced,
    #[serde(rename = "Slightly Unbalanced")]
    SlightlyUnbalanced,
    Unbalanced,
}

impl Balance {
    pub fn label(&self) -> &'static str {
        match self {
            Balance::Balanced => "Balanced",
            Balance::SlightlyUnbalanced => "Slightly Unbalanced",
            Balance::Unbalanced => "Unbalanced",
        }
    }
}

/// Risk and balance of a trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub risk_level: RiskLevel,
    pub balance: Balance,
    pub net_gain: i64,
    /// `received / given`; `None` when nothing of value is given
    pub value_ratio: Option<f64>,
}

/// `received / given`, undefined (`None`) for a zero denominator
pub fn value_ratio(given: i64, received: i64) -> Option<f64> {
    if given == 0 {
        None
    } else {
        Some(received as f64 / given as f64)
    }
}

pub struct RiskClassifier {
    thresholds: RiskThresholds,
}

impl RiskClassifier {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn risk_level(&self, net_gain: i64) -> RiskLevel {
        let magnitude = net_gain.unsigned_abs();
        if magnitude < self.thresholds.low as u64 {
            RiskLevel::Low
        } else if magnitude < self.thresholds.mid as u64 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    /// Same bands as the risk level
    pub fn balance(&self, net_gain: i64) -> Balance {
        match self.risk_level(net_gain) {
            RiskLevel::Low => Balance::Balanced,
            RiskLevel::Medium => Balance::SlightlyUnbalanced,
            RiskLevel::High => Balance::Unbalanced,
        }
    }

    pub fn classify(&self, net_gain: i64, value_ratio: Option<f64>) -> RiskSummary {
        RiskSummary {
            risk_level: self.risk_level(net_gain),
            balance: self.balance(net_gain),
            net_gain,
            value_ratio,
        }
    }
}
