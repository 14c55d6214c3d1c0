//! The viewer's own wager.
//!
//! Local state is never optimistic: amount, target and balance only change
//! when the server acknowledges them or reports the round result.

use crate::{
    events::{
        Outbound,
        RoundResult,
        SessionId,
    },
    format,
};
use thiserror::Error;
use tracing::{
    debug,
    info,
};

/// A multiplier strictly above 1.00x at which the server cashes out for us.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct AutoCashout(f64);

impl AutoCashout {
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 1.0).then_some(Self(value))
    }

    /// Empty, non-numeric or too-low input all mean "no target".
    pub fn parse(input: &str) -> Option<Self> {
        input.trim().parse::<f64>().ok().and_then(Self::new)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BetInputError {
    #[error("Please enter a valid bet amount.")]
    InvalidAmount,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BetWarning {
    #[error("Invalid auto cashout value. Betting without auto cashout.")]
    InvalidAutoCashout,
}

pub fn parse_amount(input: &str) -> Result<f64, BetInputError> {
    let amount = input
        .trim()
        .parse::<f64>()
        .map_err(|_| BetInputError::InvalidAmount)?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(BetInputError::InvalidAmount);
    }
    Ok(amount)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocalBetState {
    pub amount: f64,
    pub auto_cashout: Option<AutoCashout>,
    pub cashed_out: bool,
}

impl LocalBetState {
    pub fn is_open(&self) -> bool {
        self.amount > 0.0 && !self.cashed_out
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub intent: Outbound,
    pub warning: Option<BetWarning>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultTone {
    Win,
    Loss,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResultBanner {
    pub text: String,
    pub tone: ResultTone,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CashOutLabel {
    Idle,
    Offer(String),
    CashedOut,
}

impl CashOutLabel {
    pub fn text(&self) -> String {
        match self {
            CashOutLabel::Idle => String::from("Cash Out!"),
            CashOutLabel::Offer(amount) => format!("Cash Out @ {amount}"),
            CashOutLabel::CashedOut => String::from("Cashed Out!"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LocalBetController {
    state: LocalBetState,
    auto_input: String,
    balance: Option<f64>,
    username: Option<String>,
    bet_status: String,
    cash_out_label: CashOutLabel,
    result: Option<ResultBanner>,
}

impl Default for LocalBetController {
    fn default() -> Self {
        Self {
            state: LocalBetState::default(),
            auto_input: String::new(),
            balance: None,
            username: None,
            bet_status: String::new(),
            cash_out_label: CashOutLabel::Idle,
            result: None,
        }
    }
}

impl LocalBetController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LocalBetState {
        self.state
    }

    pub fn balance(&self) -> Option<f64> {
        self.balance
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn bet_status(&self) -> &str {
        &self.bet_status
    }

    pub fn auto_input(&self) -> &str {
        &self.auto_input
    }

    pub fn cash_out_label(&self) -> &CashOutLabel {
        &self.cash_out_label
    }

    pub fn result(&self) -> Option<&ResultBanner> {
        self.result.as_ref()
    }

    pub fn has_open_bet(&self) -> bool {
        self.state.is_open()
    }

    pub fn on_player_snapshot(&mut self, balance: f64, username: String) {
        self.balance = Some(balance);
        self.username = Some(username);
    }

    /// Manual edit of the auto-cashout field.
    pub fn set_auto_input(&mut self, input: impl Into<String>) {
        self.auto_input = input.into();
        self.state.auto_cashout = AutoCashout::parse(&self.auto_input);
        self.refresh_bet_status();
    }

    pub fn clear_auto_cashout(&mut self) {
        self.set_auto_input(String::new());
    }

    /// Validates a placement and builds the intent; local state is untouched
    /// until the acknowledgment arrives.
    pub fn request_placement(&mut self, amount_input: &str) -> Result<Placement, BetInputError> {
        let amount = parse_amount(amount_input)?;
        let target = AutoCashout::parse(&self.auto_input);
        let warning = if target.is_none() && !self.auto_input.trim().is_empty() {
            self.auto_input.clear();
            self.state.auto_cashout = None;
            self.refresh_bet_status();
            Some(BetWarning::InvalidAutoCashout)
        } else {
            None
        };
        info!(amount, auto_cashout = ?target.map(AutoCashout::value), "requesting bet placement");
        Ok(Placement {
            intent: Outbound::PlaceBet {
                amount,
                auto_cashout_at: target.map(AutoCashout::value),
            },
            warning,
        })
    }

    pub fn on_placement_acknowledged(
        &mut self,
        amount: f64,
        balance: f64,
        auto_cashout_at: Option<f64>,
    ) {
        let target = auto_cashout_at.and_then(AutoCashout::new);
        self.state = LocalBetState {
            amount,
            auto_cashout: target,
            cashed_out: false,
        };
        self.balance = Some(balance);
        if let Some(target) = target {
            self.auto_input = format::amount(target.value());
        }
        self.refresh_bet_status();
    }

    pub fn request_cash_out(&self) -> Outbound {
        info!(amount = self.state.amount, "requesting cash out");
        Outbound::CashOut
    }

    /// Tracks the live value of the open bet for the cash-out control.
    pub fn on_visible_tick(&mut self, multiplier: f64) {
        if self.state.is_open() {
            self.cash_out_label =
                CashOutLabel::Offer(format::amount(self.state.amount * multiplier));
        }
    }

    pub fn on_cash_out_acknowledged(&mut self, multiplier: f64, potential_winnings: f64) {
        self.state.cashed_out = true;
        self.cash_out_label = CashOutLabel::CashedOut;
        self.bet_status = format!(
            "Cashed out at {} for {}",
            format::multiplier(multiplier),
            format::amount(potential_winnings)
        );
    }

    /// Applies a round result addressed to `own`; returns whether it was ours.
    pub fn on_round_result(&mut self, result: &RoundResult, own: Option<&SessionId>) -> bool {
        if own != Some(&result.sid) {
            debug!(sid = %result.sid, "discarding round result for another session");
            return false;
        }
        self.balance = Some(result.balance);
        if result.won {
            self.result = Some(ResultBanner {
                text: format!(
                    "You won {} at {}!",
                    format::amount(result.winnings.unwrap_or_default()),
                    format::multiplier(result.payout.unwrap_or_default())
                ),
                tone: ResultTone::Win,
            });
        } else if let Some(lost) = result.current_bet_amount
            && lost > 0.0
            && !self.state.cashed_out
        {
            self.result = Some(ResultBanner {
                text: format!("You lost your {} bet.", format::amount(lost)),
                tone: ResultTone::Loss,
            });
        }
        self.state.amount = 0.0;
        self.state.cashed_out = false;
        true
    }

    pub fn clear_result(&mut self) {
        self.result = None;
    }

    /// Per-round reset when a new round opens for betting.
    pub fn on_round_waiting(&mut self) {
        self.state.amount = 0.0;
        self.state.cashed_out = false;
        self.cash_out_label = CashOutLabel::Idle;
        self.result = None;
        self.refresh_bet_status();
    }

    fn refresh_bet_status(&mut self) {
        self.bet_status = if let Some(target) = self.state.auto_cashout {
            format!("Auto Cashout: {}", format::multiplier(target.value()))
        } else if self.state.is_open() {
            format!("Bet Placed: {}", format::amount(self.state.amount))
        } else {
            String::new()
        };
    }
}
