use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    calculator::{SideValue, TeamValuator, ValueBreakdown, ValueCalculator},
    config::LeagueConfig,
    delta::{GradeDelta, GradeDeltaAnalyzer},
    error::{Result, TradeEngineError},
    grading::{NeedsReport, PositionGrades, PositionalGrader},
    models::{Player, PlayerId, Position, Roster, TeamId, TradeEvaluationInput, TradeProposal, TradeRequest},
    risk::{value_ratio, Balance, RiskClassifier, RiskLevel, RiskSummary},
    sliding_scale::{SlidingScaleAdjuster, SlidingScaleSummary},
    suggestions::{self, TradeSuggestion},
    verdict::{auto_approve, confidence, Verdict},
};

/// Pipeline stages of one evaluation, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvaluationStage {
    Received,
    Validated,
    Priced,
    Graded,
    Adjusted,
    Classified,
    Assembled,
}

impl fmt::Display for EvaluationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvaluationStage::Received => "received",
            EvaluationStage::Validated => "validated",
            EvaluationStage::Priced => "priced",
            EvaluationStage::Graded => "graded",
            EvaluationStage::Adjusted => "adjusted",
            EvaluationStage::Classified => "classified",
            EvaluationStage::Assembled => "assembled",
        };
        f.write_str(name)
    }
}

/// Headline judgment of a trade, from the requesting team's perspective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAssessment {
    pub verdict: Verdict,
    /// Enhanced value the requesting team sends away
    pub team_gives: i64,
    /// Enhanced value the requesting team acquires
    pub team_receives: i64,
    /// `team_receives - team_gives`
    pub net_gain: i64,
    /// Percent
    pub confidence: u8,
    pub risk_level: RiskLevel,
    pub balance: Balance,
    pub value_ratio: Option<f64>,
    pub auto_approved: bool,
}

/// How the trade changes one team's positional picture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamImpact {
    pub team_id: TeamId,
    pub before: PositionGrades,
    pub after: PositionGrades,
    pub changes: GradeDelta,
    /// Sliding-scale bonuses for the players this team acquires
    pub adjustments: SlidingScaleSummary,
    /// Weak and strong positions on the current roster
    pub needs: NeedsReport,
}

/// One line of the itemization ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemizedPlayer {
    pub player_id: PlayerId,
    pub position: Position,
    pub base_value: i64,
    pub value_increase: i64,
    pub enhanced_value: i64,
    pub breakdown: ValueBreakdown,
}

/// Base vs. enhanced value on both sides of the trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itemization {
    pub players_out: Vec<ItemizedPlayer>,
    pub players_in: Vec<ItemizedPlayer>,
    pub base_gives: i64,
    pub base_receives: i64,
    pub enhanced_gives: i64,
    pub enhanced_receives: i64,
}

impl Itemization {
    fn reconcile(
        gives: SideValue,
        partner_adjustments: &SlidingScaleSummary,
        receives: SideValue,
        team_adjustments: &SlidingScaleSummary,
    ) -> Self {
        let players_out = itemize(gives.breakdowns, partner_adjustments);
        let players_in = itemize(receives.breakdowns, team_adjustments);

        Self {
            base_gives: gives.total,
            base_receives: receives.total,
            enhanced_gives: players_out.iter().map(|p| p.enhanced_value).sum(),
            enhanced_receives: players_in.iter().map(|p| p.enhanced_value).sum(),
            players_out,
            players_in,
        }
    }
}

fn itemize(breakdowns: Vec<ValueBreakdown>, adjustments: &SlidingScaleSummary) -> Vec<ItemizedPlayer> {
    breakdowns
        .into_iter()
        .map(|breakdown| {
            let base_value = breakdown.final_value;
            let enhanced_value = adjustments.adjusted_value(&breakdown.player_id).unwrap_or(base_value);
            ItemizedPlayer {
                player_id: breakdown.player_id.clone(),
                position: breakdown.position.clone(),
                base_value,
                value_increase: enhanced_value - base_value,
                enhanced_value,
                breakdown,
            }
        })
        .collect()
}

/// Complete, auditable result of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvaluation {
    /// Version of the league rule set used
    pub config_version: String,
    pub assessment: TradeAssessment,
    pub risk: RiskSummary,
    /// Requesting team
    pub team: TeamImpact,
    /// Trade partner
    pub partner: TeamImpact,
    pub itemization: Itemization,
    /// Balancing suggestions, only when requested and the trade is not Fair
    pub suggestions: Vec<TradeSuggestion>,
}

/// Trade evaluator.
///
/// Holds only immutable configuration; evaluations share nothing and may run
/// concurrently from any number of threads.
pub struct TradeEvaluator {
    config: LeagueConfig,
    calculator: ValueCalculator,
    grader: PositionalGrader,
    adjuster: SlidingScaleAdjuster,
    risk: RiskClassifier,
}

impl TradeEvaluator {
    /// Create an evaluator from a validated rule set
    pub fn new(config: LeagueConfig) -> Result<Self> {
        config.validate()?;
        info!("Creating trade evaluator with league rules {}", config.version);

        Ok(Self {
            calculator: ValueCalculator::new(config.valuation.clone()),
            grader: PositionalGrader::new(config.grading.clone(), config.valuation.default_overall),
            adjuster: SlidingScaleAdjuster::new(config.sliding_scale.clone()),
            risk: RiskClassifier::new(config.risk),
            config,
        })
    }

    pub fn config(&self) -> &LeagueConfig {
        &self.config
    }

    pub fn calculator(&self) -> &ValueCalculator {
        &self.calculator
    }

    pub fn grader(&self) -> &PositionalGrader {
        &self.grader
    }

    pub fn evaluate_input(&self, input: &TradeEvaluationInput) -> Result<TradeEvaluation> {
        self.evaluate(&input.request, &input.team_roster, &input.partner_roster)
    }

    /// Evaluate a trade request against both current rosters
    pub fn evaluate(&self, request: &TradeRequest, team: &Roster, partner: &Roster) -> Result<TradeEvaluation> {
        debug!("Trade for team {} {}", request.team_id, EvaluationStage::Received);

        let proposal = self.validate(request, team, partner).map_err(|e| {
            warn!(
                "Trade evaluation for team {} failed before {}: {}",
                request.team_id,
                EvaluationStage::Validated,
                e
            );
            e
        })?;
        debug!("Trade for team {} {}", request.team_id, EvaluationStage::Validated);

        let mut evaluation = self.assess(&proposal);

        if request.suggest && !evaluation.assessment.verdict.is_fair() {
            evaluation.suggestions =
                suggestions::search(self, &proposal, &evaluation, self.config.suggestions.max_candidates);
        }
        debug!("Trade for team {} {}", request.team_id, EvaluationStage::Assembled);

        let a = &evaluation.assessment;
        info!(
            "Evaluated trade for team {} with {}: {} (gives: {}, receives: {}, net: {}, confidence: {}%, risk: {:?})",
            team.team_id, partner.team_id, a.verdict, a.team_gives, a.team_receives, a.net_gain, a.confidence, a.risk_level
        );
        Ok(evaluation)
    }

    /// Resolve the request's ids against their owning rosters
    fn validate<'a>(&self, request: &TradeRequest, team: &'a Roster, partner: &'a Roster) -> Result<TradeProposal<'a>> {
        for roster in [team, partner] {
            if roster.is_empty() {
                return Err(TradeEngineError::EmptyRoster { team_id: roster.team_id.clone() });
            }
        }
        if request.team_id != team.team_id {
            return Err(TradeEngineError::TeamMismatch {
                expected: request.team_id.clone(),
                found: team.team_id.clone(),
            });
        }
        if team.team_id == partner.team_id {
            return Err(TradeEngineError::malformed(format!(
                "both rosters belong to team {}",
                team.team_id
            )));
        }
        if request.give.is_empty() && request.receive.is_empty() {
            return Err(TradeEngineError::malformed("trade moves no players"));
        }

        let mut rostered = HashSet::new();
        for roster in [team, partner] {
            for player in &roster.players {
                if !rostered.insert(player.id.as_str()) {
                    return Err(TradeEngineError::malformed(format!(
                        "player {} is rostered more than once",
                        player.id
                    )));
                }
            }
        }

        let mut listed = HashSet::new();
        for id in request.give.iter().chain(&request.receive) {
            if !listed.insert(id.as_str()) {
                let reason = if request.give.contains(id) && request.receive.contains(id) {
                    format!("player {id} is on both sides of the trade")
                } else {
                    format!("player {id} is listed more than once")
                };
                return Err(TradeEngineError::malformed(reason));
            }
        }

        Ok(TradeProposal {
            team,
            partner,
            give: resolve(&request.give, team, partner)?,
            receive: resolve(&request.receive, partner, team)?,
        })
    }

    /// Run the pricing, grading, adjustment and classification stages
    pub(crate) fn assess(&self, proposal: &TradeProposal<'_>) -> TradeEvaluation {
        let valuator = TeamValuator::new(&self.calculator);
        let gives = valuator.value(&proposal.give);
        let receives = valuator.value(&proposal.receive);
        debug!(
            "Trade for team {} {} (base gives: {}, base receives: {})",
            proposal.team.team_id,
            EvaluationStage::Priced,
            gives.total,
            receives.total
        );

        let team_current: Vec<&Player> = proposal.team.players.iter().collect();
        let partner_current: Vec<&Player> = proposal.partner.players.iter().collect();
        let team_before = self.grader.grade(&team_current);
        let team_after = self.grader.grade(&proposal.team_after());
        let partner_before = self.grader.grade(&partner_current);
        let partner_after = self.grader.grade(&proposal.partner_after());
        let team_changes = GradeDeltaAnalyzer::analyze(&team_before, &team_after);
        let partner_changes = GradeDeltaAnalyzer::analyze(&partner_before, &partner_after);
        debug!(
            "Trade for team {} {} ({} improvements, {} downgrades)",
            proposal.team.team_id,
            EvaluationStage::Graded,
            team_changes.improvements.len(),
            team_changes.downgrades.len()
        );

        // Each team's improvements re-price the players that team acquires
        let team_adjustments = self.adjuster.adjust(&team_changes.improvements, &receives.breakdowns);
        let partner_adjustments = self.adjuster.adjust(&partner_changes.improvements, &gives.breakdowns);
        let itemization = Itemization::reconcile(gives, &partner_adjustments, receives, &team_adjustments);
        debug!(
            "Trade for team {} {} (+{} received, +{} given)",
            proposal.team.team_id,
            EvaluationStage::Adjusted,
            team_adjustments.total_value_increase,
            partner_adjustments.total_value_increase
        );

        let team_gives = itemization.enhanced_gives;
        let team_receives = itemization.enhanced_receives;
        let net_gain = team_receives - team_gives;
        let risk = self.risk.classify(net_gain, value_ratio(team_gives, team_receives));
        let verdict = Verdict::from_net_gain(net_gain, &self.config.verdict);
        let confidence = confidence(net_gain, &self.config.verdict, &self.config.confidence);
        debug!("Trade for team {} {} as {}", proposal.team.team_id, EvaluationStage::Classified, verdict);

        let assessment = TradeAssessment {
            verdict,
            team_gives,
            team_receives,
            net_gain,
            confidence,
            risk_level: risk.risk_level,
            balance: risk.balance,
            value_ratio: risk.value_ratio,
            auto_approved: auto_approve(verdict, confidence, risk.risk_level, &self.config.approval),
        };

        TradeEvaluation {
            config_version: self.config.version.clone(),
            assessment,
            risk,
            team: TeamImpact {
                team_id: proposal.team.team_id.clone(),
                needs: self.grader.needs(&team_before),
                before: team_before,
                after: team_after,
                changes: team_changes,
                adjustments: team_adjustments,
            },
            partner: TeamImpact {
                team_id: proposal.partner.team_id.clone(),
                needs: self.grader.needs(&partner_before),
                before: partner_before,
                after: partner_after,
                changes: partner_changes,
                adjustments: partner_adjustments,
            },
            itemization,
            suggestions: Vec::new(),
        }
    }
}

fn resolve<'a>(ids: &[PlayerId], owner: &'a Roster, other: &Roster) -> Result<Vec<&'a Player>> {
    ids.iter()
        .map(|id| match owner.get(id) {
            Some(player) => {
                if player.team_id != owner.team_id {
                    warn!(
                        "Player {} is on the roster of {} but tagged with team {}",
                        player.id, owner.team_id, player.team_id
                    );
                }
                Ok(player)
            }
            None if other.contains(id) => Err(TradeEngineError::malformed(format!(
                "player {id} belongs to team {}, not {}",
                other.team_id, owner.team_id
            ))),
            None => Err(TradeEngineError::UnknownPlayer { player_id: id.clone() }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::Grade;
    use crate::models::DevTrait;

    fn evaluator() -> TradeEvaluator {
        TradeEvaluator::new(LeagueConfig::default()).unwrap()
    }

    fn home() -> Roster {
        Roster::new(
            "home",
            vec![
                Player::new("h-qb1", Position::QB, 70, "home").with_age(30),
                Player::new("h-qb2", Position::QB, 68, "home").with_age(27),
                Player::new("h-hb1", Position::HB, 88, "home").with_age(24).with_dev_trait(DevTrait::Star),
                Player::new("h-hb2", Position::HB, 80, "home").with_age(23),
                Player::new("h-wr1", Position::WR, 84, "home").with_age(26),
                Player::new("h-wr2", Position::WR, 79, "home").with_age(25),
                Player::new("h-wr3", Position::WR, 76, "home").with_age(28),
                Player::new("h-k1", Position::K, 82, "home").with_age(31),
            ],
        )
    }

    fn away() -> Roster {
        Roster::new(
            "away",
            vec![
                Player::new("a-qb1", Position::QB, 92, "away").with_age(27).with_dev_trait(DevTrait::Superstar),
                Player::new("a-qb2", Position::QB, 74, "away").with_age(24),
                Player::new("a-hb1", Position::HB, 72, "away").with_age(29),
                Player::new("a-wr1", Position::WR, 90, "away").with_age(24).with_dev_trait(DevTrait::Star),
                Player::new("a-wr2", Position::WR, 81, "away").with_age(22),
                Player::new("a-te1", Position::TE, 78, "away").with_age(26),
                Player::new("a-k1", Position::K, 70, "away").with_age(35),
            ],
        )
    }

    fn request(give: &[&str], receive: &[&str]) -> TradeRequest {
        TradeRequest {
            team_id: "home".to_string(),
            give: give.iter().map(|s| s.to_string()).collect(),
            receive: receive.iter().map(|s| s.to_string()).collect(),
            suggest: false,
        }
    }

    #[test]
    fn test_evaluator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TradeEvaluator>();
    }

    #[test]
    fn test_kicker_swap_sits_on_fair_boundary() {
        // 82 × 0.82 × 0.5 = 33.62 → 34; 70 × 0.74 × 0.5 = 25.9 → 26
        let evaluation = evaluator().evaluate(&request(&["h-k1"], &["a-k1"]), &home(), &away()).unwrap();
        let a = &evaluation.assessment;

        // Away's kicker room goes D → B, so h-k1 is re-priced 34 → 41 on the way out
        assert_eq!(evaluation.itemization.base_gives, 34);
        assert_eq!(a.team_gives, 41);
        assert_eq!(a.team_receives, 26);
        assert_eq!(a.net_gain, -15);
        assert_eq!(a.verdict, Verdict::Fair);
        assert_eq!(a.confidence, 50);
        assert_eq!(a.risk_level, RiskLevel::Medium);
        assert_eq!(a.balance, Balance::SlightlyUnbalanced);
        assert!(!a.auto_approved);
        assert!(evaluation.suggestions.is_empty());
    }

    #[test]
    fn test_downgraded_position_earns_no_bonus() {
        let evaluation = evaluator().evaluate(&request(&["h-k1"], &["a-k1"]), &home(), &away()).unwrap();

        // Home's kicker room goes B → D
        let downgrades = &evaluation.team.changes.downgrades;
        assert_eq!(downgrades.len(), 1);
        assert_eq!(downgrades[0].position, Position::K);
        assert!(evaluation.team.adjustments.adjustments.is_empty());
        assert_eq!(evaluation.itemization.players_in[0].enhanced_value, 26);
    }

    #[test]
    fn test_quarterback_upgrade_is_adjusted() {
        let evaluation = evaluator().evaluate(&request(&["h-qb2"], &["a-qb1"]), &home(), &away()).unwrap();

        // QB room goes from (70 + 68) / 2 = 69 (D) to (92 + 70) / 2 = 81 (B)
        let changes = &evaluation.team.changes;
        assert_eq!(changes.improvements.len(), 1);
        assert_eq!(changes.improvements[0].position, Position::QB);
        assert_eq!(changes.improvements[0].grade_before, Grade::D);
        assert_eq!(changes.improvements[0].grade_after, Grade::B);

        // 92 × 0.9 × 1.3 × 1.2 = 129.168 → 129; two-letter jump adds 20% → 154.8 → 155
        let adjustments = &evaluation.team.adjustments;
        assert_eq!(adjustments.total_adjustments, 1);
        assert_eq!(adjustments.adjustments[0].base_value, 129);
        assert_eq!(adjustments.adjustments[0].adjusted_value, 155);
        assert_eq!(adjustments.total_value_increase, 26);

        let itemization = &evaluation.itemization;
        assert_eq!(itemization.base_receives, 129);
        assert_eq!(itemization.enhanced_receives, 155);
        assert_eq!(evaluation.assessment.team_receives, 155);
        assert_eq!(evaluation.assessment.verdict, Verdict::YouWin);
    }

    #[test]
    fn test_itemization_reconciles_with_totals() {
        let evaluation = evaluator()
            .evaluate(&request(&["h-hb1", "h-wr3"], &["a-wr1", "a-te1"]), &home(), &away())
            .unwrap();
        let itemization = &evaluation.itemization;
        let out: i64 = itemization.players_out.iter().map(|p| p.enhanced_value).sum();
        let inn: i64 = itemization.players_in.iter().map(|p| p.enhanced_value).sum();

        assert_eq!(out, evaluation.assessment.team_gives);
        assert_eq!(inn, evaluation.assessment.team_receives);
        assert_eq!(
            itemization.enhanced_receives - itemization.base_receives,
            evaluation.team.adjustments.total_value_increase
        );
        assert_eq!(
            itemization.enhanced_gives - itemization.base_gives,
            evaluation.partner.adjustments.total_value_increase
        );
        assert_eq!(evaluation.assessment.net_gain, inn - out);
    }

    #[test]
    fn test_partner_improvements_reprice_outgoing_players() {
        // Away's HB room: 72 (C) → (88 + 72) / 2 = 80 (B)
        let evaluation = evaluator().evaluate(&request(&["h-hb1"], &["a-te1"]), &home(), &away()).unwrap();

        let partner = &evaluation.partner;
        assert!(partner.changes.improvements.iter().any(|c| c.position == Position::HB));
        assert_eq!(partner.adjustments.total_adjustments, 1);
        assert_eq!(partner.adjustments.adjustments[0].player_id, "h-hb1");
        assert_eq!(partner.adjustments.adjustments[0].adjusted_value, 111);
        assert_eq!(evaluation.itemization.base_gives, 101);
        assert_eq!(evaluation.itemization.enhanced_gives, 111);

        // Home had no TE at all: F → B
        let te = evaluation.team.changes.improvements.iter().find(|c| c.position == Position::TE).unwrap();
        assert_eq!(te.grade_before, Grade::F);
        assert_eq!(te.grade_after, Grade::B);
        assert_eq!(evaluation.assessment.team_receives, 88);
        assert_eq!(evaluation.assessment.net_gain, -23);
        assert_eq!(evaluation.assessment.verdict, Verdict::YouLose);
    }

    #[test]
    fn test_one_sided_trade_has_undefined_ratio() {
        let evaluation = evaluator().evaluate(&request(&[], &["a-k1"]), &home(), &away()).unwrap();
        assert_eq!(evaluation.assessment.team_gives, 0);
        assert_eq!(evaluation.assessment.net_gain, 26);
        assert_eq!(evaluation.assessment.risk_level, RiskLevel::High);
        assert_eq!(evaluation.assessment.value_ratio, None);
        assert_eq!(evaluation.risk.value_ratio, None);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let evaluator = evaluator();
        let mut req = request(&["h-hb1", "h-wr1"], &["a-qb1"]);
        req.suggest = true;

        let first = serde_json::to_string(&evaluator.evaluate(&req, &home(), &away()).unwrap()).unwrap();
        let second = serde_json::to_string(&evaluator.evaluate(&req, &home(), &away()).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let (team, partner) = (home(), away());
        let req = request(&["h-qb1"], &["a-qb1"]);
        evaluator().evaluate(&req, &team, &partner).unwrap();
        assert_eq!(team, home());
        assert_eq!(partner, away());
    }

    #[test]
    fn test_unknown_player_rejected() {
        let result = evaluator().evaluate(&request(&["h-qb1"], &["ghost"]), &home(), &away());
        assert!(matches!(result, Err(TradeEngineError::UnknownPlayer { player_id }) if player_id == "ghost"));
    }

    #[test]
    fn test_overlapping_lists_rejected() {
        let result = evaluator().evaluate(&request(&["h-qb1"], &["h-qb1"]), &home(), &away());
        assert!(matches!(result, Err(TradeEngineError::MalformedTrade { .. })));
    }

    #[test]
    fn test_player_on_wrong_side_rejected() {
        let result = evaluator().evaluate(&request(&["a-qb1"], &[]), &home(), &away());
        assert!(matches!(result, Err(TradeEngineError::MalformedTrade { reason }) if reason.contains("belongs to team away")));
    }

    #[test]
    fn test_structural_errors() {
        let ev = evaluator();

        let empty = Roster::new("away", vec![]);
        assert!(matches!(
            ev.evaluate(&request(&["h-qb1"], &[]), &home(), &empty),
            Err(TradeEngineError::EmptyRoster { team_id }) if team_id == "away"
        ));

        let mut req = request(&["h-qb1"], &["a-qb1"]);
        req.team_id = "elsewhere".to_string();
        assert!(matches!(ev.evaluate(&req, &home(), &away()), Err(TradeEngineError::TeamMismatch { .. })));

        assert!(matches!(
            ev.evaluate(&request(&[], &[]), &home(), &away()),
            Err(TradeEngineError::MalformedTrade { .. })
        ));

        assert!(matches!(
            ev.evaluate(&request(&["h-qb1", "h-qb1"], &[]), &home(), &away()),
            Err(TradeEngineError::MalformedTrade { .. })
        ));

        let mut shared = away();
        shared.players.push(Player::new("h-k1", Position::K, 82, "away"));
        assert!(matches!(
            ev.evaluate(&request(&["h-qb1"], &[]), &home(), &shared),
            Err(TradeEngineError::MalformedTrade { .. })
        ));
    }

    #[test]
    fn test_stages_are_ordered() {
        assert!(EvaluationStage::Received < EvaluationStage::Validated);
        assert!(EvaluationStage::Classified < EvaluationStage::Assembled);
        assert_eq!(EvaluationStage::Adjusted.to_string(), "adjusted");
    }
}
