//! Messages exchanged with the game server.
//!
//! Inbound frames are decoded into [`Inbound`], the closed set of events the
//! engine understands. Outbound intents are encoded from [`Outbound`]. Both
//! travel as JSON text frames shaped `{"event": <name>, "data": <payload>}`.

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};
use std::{
    collections::HashMap,
    fmt,
};

/// Identifier the server assigns to one live connection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoundStatus {
    Waiting,
    Running,
    Crashed,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    pub status: RoundStatus,
    pub current_multiplier: f64,
    #[serde(default, deserialize_with = "positive_or_absent")]
    pub crash_point: Option<f64>,
    #[serde(default)]
    pub history: Vec<f64>,
    #[serde(default)]
    pub time_to_next_round: Option<u32>,
}

/// One participant's bet as broadcast in the roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBetRecord {
    pub username: String,
    pub bet_amount: f64,
    #[serde(default)]
    pub auto_cashout_at: Option<f64>,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub sid: SessionId,
    pub won: bool,
    #[serde(default)]
    pub winnings: Option<f64>,
    #[serde(default)]
    pub payout: Option<f64>,
    pub balance: f64,
    #[serde(default)]
    pub current_bet_amount: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Inbound {
    #[serde(rename = "connect")]
    ConnectionEstablished { sid: SessionId },
    #[serde(rename = "gameStateUpdate")]
    FullRoundState(RoundSnapshot),
    #[serde(rename = "multiplierUpdate")]
    MultiplierTick { multiplier: f64 },
    #[serde(rename = "timerUpdate", rename_all = "camelCase")]
    CountdownTick { time_to_next_round: u32 },
    #[serde(rename = "initialLiveBets")]
    RosterFullSync(HashMap<SessionId, LiveBetRecord>),
    #[serde(rename = "liveBetUpdate")]
    RosterUpsert {
        sid: SessionId,
        data: LiveBetRecord,
    },
    #[serde(rename = "liveBetRemove")]
    RosterRemove { sid: SessionId },
    #[serde(rename = "liveBetsClear")]
    RosterClear,
    #[serde(rename = "playerUpdate")]
    PlayerSnapshot { balance: f64, username: String },
    #[serde(rename = "betPlacedAck", rename_all = "camelCase")]
    PlacementAcknowledged {
        amount: f64,
        balance: f64,
        #[serde(default)]
        auto_cashout_at: Option<f64>,
    },
    #[serde(rename = "cashedOutAck", rename_all = "camelCase")]
    CashOutAcknowledged {
        multiplier: f64,
        potential_winnings: f64,
    },
    #[serde(rename = "roundResult")]
    RoundResult(RoundResult),
    #[serde(rename = "errorMessage")]
    ErrorNotice { message: String },
}

impl Inbound {
    pub fn name(&self) -> &'static str {
        match self {
            Inbound::ConnectionEstablished { .. } => "connectionEstablished",
            Inbound::FullRoundState(_) => "fullRoundState",
            Inbound::MultiplierTick { .. } => "multiplierTick",
            Inbound::CountdownTick { .. } => "countdownTick",
            Inbound::RosterFullSync(_) => "rosterFullSync",
            Inbound::RosterUpsert { .. } => "rosterUpsert",
            Inbound::RosterRemove { .. } => "rosterRemove",
            Inbound::RosterClear => "rosterClear",
            Inbound::PlayerSnapshot { .. } => "playerSnapshot",
            Inbound::PlacementAcknowledged { .. } => "placementAcknowledged",
            Inbound::CashOutAcknowledged { .. } => "cashOutAcknowledged",
            Inbound::RoundResult(_) => "roundResult",
            Inbound::ErrorNotice { .. } => "errorNotice",
        }
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum Outbound {
    #[serde(rename = "placeBet", rename_all = "camelCase")]
    PlaceBet {
        amount: f64,
        auto_cashout_at: Option<f64>,
    },
    #[serde(rename = "cashOut")]
    CashOut,
}

impl Outbound {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// The server reports `crashPoint: 0.0` outside of CRASHED.
fn positive_or_absent<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite() && *v > 0.0))
}
