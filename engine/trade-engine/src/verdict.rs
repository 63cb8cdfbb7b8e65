//! Verdict, confidence and the auto-approval gate.
//!
//! All verdicts are from the requesting (receiving) team's perspective.

use crate::config::{ApprovalPolicy, ConfidenceCurve, VerdictThresholds};
use crate::risk::RiskLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Fair,
    #[serde(rename = "You Win")]
    YouWin,
    #[serde(rename = "You Lose")]
    YouLose,
    #[serde(rename = "Big Win")]
    BigWin,
    #[serde(rename = "Big Loss")]
    BigLoss,
}

impl Verdict {
    /// `|net| <= fair` is Fair (inclusive); Big tiers only when configured
    pub fn from_net_gain(net_gain: i64, thresholds: &VerdictThresholds) -> Self {
        let magnitude = net_gain.unsigned_abs();
        if magnitude <= thresholds.fair as u64 {
            return Verdict::Fair;
        }
        let big = thresholds.big.is_some_and(|big| magnitude > big as u64);
        match (net_gain > 0, big) {
            (true, false) => Verdict::YouWin,
            (true, true) => Verdict::BigWin,
            (false, false) => Verdict::YouLose,
            (false, true) => Verdict::BigLoss,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Fair => "Fair",
            Verdict::YouWin => "You Win",
            Verdict::YouLose => "You Lose",
            Verdict::BigWin => "Big Win",
            Verdict::BigLoss => "Big Loss",
        }
    }

    pub fn is_fair(&self) -> bool {
        matches!(self, Verdict::Fair)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Confidence in percent: how decisively the net gain clears (or sits
/// inside) the fair band.
///
/// Fair trades score `ceiling` at zero net gain, falling linearly to `floor`
/// at the fair threshold. Wins and losses start at `floor` just past the
/// threshold and gain `slope` points per value point, capped at `ceiling`.
pub fn confidence(net_gain: i64, thresholds: &VerdictThresholds, curve: &ConfidenceCurve) -> u8 {
    let magnitude = net_gain.unsigned_abs() as f64;
    let fair = thresholds.fair as f64;

    let score = if magnitude <= fair {
        if fair == 0.0 {
            curve.ceiling
        } else {
            curve.ceiling - (magnitude / fair) * (curve.ceiling - curve.floor)
        }
    } else {
        (curve.floor + (magnitude - fair) * curve.slope).min(curve.ceiling)
    };

    score.round().clamp(0.0, 100.0) as u8
}

/// Whether a trade may skip manual review. Pure over already-computed fields.
pub fn auto_approve(verdict: Verdict, confidence: u8, risk_level: RiskLevel, policy: &ApprovalPolicy) -> bool {
    (!policy.require_fair || verdict.is_fair())
        && risk_level <= policy.max_risk
        && confidence >= policy.min_confidence
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_boundaries() {
        let t = VerdictThresholds::default();
        assert_eq!(Verdict::from_net_gain(0, &t), Verdict::Fair);
        assert_eq!(Verdict::from_net_gain(15, &t), Verdict::Fair);
        assert_eq!(Verdict::from_net_gain(-15, &t), Verdict::Fair);
        assert_eq!(Verdict::from_net_gain(16, &t), Verdict::YouWin);
        assert_eq!(Verdict::from_net_gain(-16, &t), Verdict::YouLose);
        assert_eq!(Verdict::from_net_gain(500, &t), Verdict::YouWin);
    }

    #[test]
    fn test_three_tier_verdicts() {
        let t = VerdictThresholds { fair: 15, big: Some(30) };
        assert_eq!(Verdict::from_net_gain(30, &t), Verdict::YouWin);
        assert_eq!(Verdict::from_net_gain(31, &t), Verdict::BigWin);
        assert_eq!(Verdict::from_net_gain(-31, &t), Verdict::BigLoss);
        assert_eq!(Verdict::from_net_gain(-20, &t), Verdict::YouLose);
        assert_eq!(Verdict::from_net_gain(10, &t), Verdict::Fair);
    }

    #[test]
    fn test_verdict_labels() {
        assert_eq!(serde_json::to_string(&Verdict::YouWin).unwrap(), "\"You Win\"");
        assert_eq!(Verdict::BigLoss.to_string(), "Big Loss");
    }

    #[test]
    fn test_confidence_curve() {
        let t = VerdictThresholds::default();
        let curve = ConfidenceCurve::default();
        assert_eq!(confidence(0, &t, &curve), 95);
        assert_eq!(confidence(15, &t, &curve), 50);
        assert_eq!(confidence(-15, &t, &curve), 50);
        assert_eq!(confidence(16, &t, &curve), 52);
        assert_eq!(confidence(-25, &t, &curve), 70);
        assert_eq!(confidence(1000, &t, &curve), 95);
        assert_eq!(confidence(0, &VerdictThresholds { fair: 0, big: None }, &curve), 95);
    }

    #[test]
    fn test_confidence_monotone_past_threshold() {
        let t = VerdictThresholds::default();
        let curve = ConfidenceCurve::default();
        let mut last = 0;
        for net in 16..200 {
            let c = confidence(net, &t, &curve);
            assert!(c >= last);
            last = c;
        }
    }

    #[test]
    fn test_auto_approve_gate() {
        let policy = ApprovalPolicy::default();
        assert!(auto_approve(Verdict::Fair, 90, RiskLevel::Low, &policy));
        assert!(auto_approve(Verdict::Fair, 60, RiskLevel::Medium, &policy));
        assert!(!auto_approve(Verdict::Fair, 59, RiskLevel::Low, &policy));
        assert!(!auto_approve(Verdict::YouWin, 90, RiskLevel::Low, &policy));
        assert!(!auto_approve(Verdict::Fair, 90, RiskLevel::High, &policy));

        let lenient = ApprovalPolicy { require_fair: false, max_risk: RiskLevel::High, min_confidence: 0 };
        assert!(auto_approve(Verdict::BigLoss, 95, RiskLevel::High, &lenient));
    }
}
