//! Balancing suggestions for unfair trades
//!
//! Tries adding one more player to the short side and keeps the additions
//! that would bring the trade inside the fair band.

use crate::engine::{TradeEvaluation, TradeEvaluator};
use crate::models::{Player, PlayerId, Position, TradeProposal};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// Ask the partner for one more player
    AddToReceive,
    /// Offer the partner one more player
    AddToGive,
}

/// A single-player addition that would make the trade Fair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSuggestion {
    pub kind: SuggestionKind,
    pub player_id: PlayerId,
    pub position: Position,
    /// Base value of the added player
    pub player_value: i64,
    pub resulting_net_gain: i64,
    pub resulting_confidence: u8,
    /// The added player plays a position the receiving team is weak at
    pub fills_need: bool,
}

/// Search single-player additions for `proposal`.
///
/// Ranked by closeness to an even trade, then by whether the player fills a
/// need, then by player id.
pub(crate) fn search(
    evaluator: &TradeEvaluator,
    proposal: &TradeProposal<'_>,
    current: &TradeEvaluation,
    max_candidates: usize,
) -> Vec<TradeSuggestion> {
    // The losing side is owed value: a losing requester asks for more,
    // a winning requester offers more
    let (kind, pool, needs) = if current.assessment.net_gain < 0 {
        (SuggestionKind::AddToReceive, proposal.partner, &current.team.needs)
    } else {
        (SuggestionKind::AddToGive, proposal.team, &current.partner.needs)
    };
    let already_moving: &[&Player] = match kind {
        SuggestionKind::AddToReceive => proposal.receive.as_slice(),
        SuggestionKind::AddToGive => proposal.give.as_slice(),
    };

    let mut suggestions: Vec<TradeSuggestion> = pool
        .players
        .iter()
        .filter(|player| !already_moving.iter().any(|p| p.id == player.id))
        .filter_map(|player| {
            let mut candidate = proposal.clone();
            match kind {
                SuggestionKind::AddToReceive => candidate.receive.push(player),
                SuggestionKind::AddToGive => candidate.give.push(player),
            }

            let outcome = evaluator.assess(&candidate);
            if !outcome.assessment.verdict.is_fair() {
                return None;
            }

            Some(TradeSuggestion {
                kind,
                player_id: player.id.clone(),
                position: player.position.clone(),
                player_value: evaluator.calculator().calculate(player).final_value,
                resulting_net_gain: outcome.assessment.net_gain,
                resulting_confidence: outcome.assessment.confidence,
                fills_need: needs.is_weak(&player.position),
            })
        })
        .collect();

    suggestions.sort_by(|a, b| {
        a.resulting_net_gain
            .unsigned_abs()
            .cmp(&b.resulting_net_gain.unsigned_abs())
            .then_with(|| b.fills_need.cmp(&a.fills_need))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    suggestions.truncate(max_candidates);

    debug!(
        "Found {} balancing suggestions for team {} ({:?})",
        suggestions.len(),
        proposal.team.team_id,
        kind
    );
    suggestions
}
