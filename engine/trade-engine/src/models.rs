use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub type PlayerId = String;
pub type TeamId = String;

/// Football roster positions.
///
/// Positions outside the fixed table are kept as `Other` so that unfamiliar
/// data still flows through grading and valuation (with neutral multipliers).
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Position {
    QB,
    HB,
    FB,
    WR,
    TE,
    LT,
    LG,
    C,
    RG,
    RT,
    LE,
    RE,
    DT,
    LOLB,
    MLB,
    ROLB,
    CB,
    FS,
    SS,
    K,
    P,
    Other(String),
}

impl Position {
    /// Parse a position tag, case-insensitive, accepting common aliases
    pub fn parse(tag: &str) -> Self {
        let upper = tag.trim().to_ascii_uppercase();
        match upper.as_str() {
            "QB" => Position::QB,
            "HB" | "RB" => Position::HB,
            "FB" => Position::FB,
            "WR" => Position::WR,
            "TE" => Position::TE,
            "LT" => Position::LT,
            "LG" => Position::LG,
            "C" => Position::C,
            "RG" => Position::RG,
            "RT" => Position::RT,
            "LE" => Position::LE,
            "RE" => Position::RE,
            "DT" => Position::DT,
            "LOLB" => Position::LOLB,
            "MLB" | "ILB" | "LB" => Position::MLB,
            "ROLB" => Position::ROLB,
            "CB" => Position::CB,
            "FS" => Position::FS,
            "SS" => Position::SS,
            "K" => Position::K,
            "P" => Position::P,
            _ => Position::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Position::QB => "QB",
            Position::HB => "HB",
            Position::FB => "FB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::LT => "LT",
            Position::LG => "LG",
            Position::C => "C",
            Position::RG => "RG",
            Position::RT => "RT",
            Position::LE => "LE",
            Position::RE => "RE",
            Position::DT => "DT",
            Position::LOLB => "LOLB",
            Position::MLB => "MLB",
            Position::ROLB => "ROLB",
            Position::CB => "CB",
            Position::FS => "FS",
            Position::SS => "SS",
            Position::K => "K",
            Position::P => "P",
            Position::Other(tag) => tag,
        }
    }
}

impl From<String> for Position {
    fn from(tag: String) -> Self {
        Position::parse(&tag)
    }
}

impl From<&str> for Position {
    fn from(tag: &str) -> Self {
        Position::parse(tag)
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.as_str().to_string()
    }
}

impl FromStr for Position {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Position::parse(s))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Development trait describing a player's growth potential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DevTrait {
    #[default]
    Normal,
    Star,
    Superstar,
    Hidden,
}

impl DevTrait {
    /// Lenient parse: anything unrecognised is `Normal`
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "star" => DevTrait::Star,
            "superstar" | "xfactor" => DevTrait::Superstar,
            "hidden" => DevTrait::Hidden,
            _ => DevTrait::Normal,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DevTrait::Normal => "Normal",
            DevTrait::Star => "Star",
            DevTrait::Superstar => "Superstar",
            DevTrait::Hidden => "Hidden",
        }
    }
}

/// Player snapshot as supplied by the caller for one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub position: Position,

    /// Overall rating, nominally 0-99
    #[serde(default, deserialize_with = "lenient::rating")]
    pub overall: Option<u32>,

    #[serde(default, deserialize_with = "lenient::rating")]
    pub age: Option<u32>,

    #[serde(default, deserialize_with = "lenient::dev_trait")]
    pub dev_trait: Option<DevTrait>,

    pub team_id: TeamId,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, position: Position, overall: u32, team_id: impl Into<TeamId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            position,
            overall: Some(overall),
            age: None,
            dev_trait: None,
            team_id: team_id.into(),
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_dev_trait(mut self, dev_trait: DevTrait) -> Self {
        self.dev_trait = Some(dev_trait);
        self
    }

    /// Overall rating, or `default` when the snapshot has none
    pub fn overall_or(&self, default: u32) -> u32 {
        self.overall.unwrap_or(default)
    }

    pub fn dev_trait(&self) -> DevTrait {
        self.dev_trait.unwrap_or_default()
    }
}

/// Full roster snapshot for one team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub team_id: TeamId,
    #[serde(default)]
    pub players: Vec<Player>,
}

impl Roster {
    pub fn new(team_id: impl Into<TeamId>, players: Vec<Player>) -> Self {
        Self { team_id: team_id.into(), players }
    }

    pub fn get(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.get(player_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Trade-evaluation request as received from the request handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    /// Requesting team; verdicts are from this team's perspective
    pub team_id: TeamId,

    /// Players the requesting team sends away
    #[serde(default)]
    pub give: Vec<PlayerId>,

    /// Players the requesting team acquires
    #[serde(default)]
    pub receive: Vec<PlayerId>,

    /// Search for single-player additions that would balance the trade
    #[serde(default)]
    pub suggest: bool,
}

/// Validated trade: both id lists resolved against their owning rosters
#[derive(Debug, Clone)]
pub struct TradeProposal<'a> {
    pub team: &'a Roster,
    pub partner: &'a Roster,
    pub give: Vec<&'a Player>,
    pub receive: Vec<&'a Player>,
}

impl<'a> TradeProposal<'a> {
    /// Requesting team's roster with the trade applied
    pub fn team_after(&self) -> Vec<&'a Player> {
        apply_trade(self.team, &self.give, &self.receive)
    }

    /// Partner team's roster with the trade applied
    pub fn partner_after(&self) -> Vec<&'a Player> {
        apply_trade(self.partner, &self.receive, &self.give)
    }
}

fn apply_trade<'a>(roster: &'a Roster, outgoing: &[&'a Player], incoming: &[&'a Player]) -> Vec<&'a Player> {
    roster
        .players
        .iter()
        .filter(|p| !outgoing.iter().any(|o| o.id == p.id))
        .chain(incoming.iter().copied())
        .collect()
}

/// Complete engine input: the request plus both roster snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvaluationInput {
    pub request: TradeRequest,
    pub team_roster: Roster,
    pub partner_roster: Roster,
}

/// Deserializers that degrade malformed optional attributes to `None`
mod lenient {
    use super::*;
    use serde_json::Value;

    pub fn rating<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n
                .as_u64()
                .map(|v| v.min(u32::MAX as u64) as u32)
                .or_else(|| n.as_f64().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v.round() as u32)),
            Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
            _ => None,
        })
    }

    pub fn dev_trait<'de, D>(deserializer: D) -> Result<Option<DevTrait>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(DevTrait::parse(&s)),
            _ => None,
        })
    }
}
