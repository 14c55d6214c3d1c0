//! One participant session: routes server events, user intents and display
//! frames to the components that own them.
//!
//! Handlers never fail and never block. Anything that must leave the engine,
//! intents for the server or delayed banner clears, is returned as an
//! [`Effect`] for the caller to carry out.

use crate::{
    bet::{
        LocalBetController,
        ResultBanner,
    },
    events::{
        Inbound,
        Outbound,
        RoundStatus,
        SessionId,
    },
    notice::{
        ErrorBanner,
        Generation,
        LONG_NOTICE,
        SHORT_NOTICE,
        ScheduledClear,
    },
    position::{
        PositionMapper,
        RocketPose,
        Surface,
    },
    roster::{
        LiveBetRegistry,
        RosterEntry,
    },
    round::{
        HistoryTone,
        MultiplierDisplay,
        RoundStateMachine,
        TickOutcome,
    },
    trail::{
        TrailParticle,
        TrailSimulator,
    },
};
use tracing::{
    debug,
    error,
    info,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Send(Outbound),
    ScheduleClear(ScheduledClear),
}

/// Which user actions are currently offered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub place_bet: bool,
    pub cash_out: bool,
}

/// Everything the presentation needs for one draw.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub username: Option<String>,
    pub balance: Option<f64>,
    pub round_status: Option<RoundStatus>,
    pub status_text: String,
    pub countdown: Option<u32>,
    pub multiplier: MultiplierDisplay,
    pub history: Vec<(f64, HistoryTone)>,
    pub roster: Vec<RosterEntry>,
    pub controls: Controls,
    pub cash_out_label: String,
    pub bet_status: String,
    pub auto_input: String,
    pub result: Option<ResultBanner>,
    pub error: Option<String>,
    pub pose: RocketPose,
    pub surface: Surface,
    pub particles: Vec<TrailParticle>,
}

pub struct Engine {
    session: Option<SessionId>,
    visible: bool,
    surface: Surface,
    controls: Controls,
    round: RoundStateMachine,
    position: PositionMapper,
    trail: TrailSimulator,
    roster: LiveBetRegistry,
    bet: LocalBetController,
    banner: ErrorBanner,
}

impl Engine {
    pub fn new(surface: Surface) -> Self {
        Self::with_trail(TrailSimulator::new(surface))
    }

    pub fn with_trail(trail: TrailSimulator) -> Self {
        let surface = trail.surface();
        Self {
            session: None,
            visible: true,
            surface,
            controls: Controls::default(),
            round: RoundStateMachine::new(),
            position: PositionMapper::new(surface),
            trail,
            roster: LiveBetRegistry::new(),
            bet: LocalBetController::new(),
            banner: ErrorBanner::default(),
        }
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn round(&self) -> &RoundStateMachine {
        &self.round
    }

    pub fn position(&self) -> &PositionMapper {
        &self.position
    }

    pub fn trail(&self) -> &TrailSimulator {
        &self.trail
    }

    pub fn roster(&self) -> &LiveBetRegistry {
        &self.roster
    }

    pub fn bet(&self) -> &LocalBetController {
        &self.bet
    }

    pub fn banner(&self) -> &ErrorBanner {
        &self.banner
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn handle(&mut self, event: Inbound) -> Vec<Effect> {
        debug!(event = event.name(), "inbound event");
        match event {
            Inbound::ConnectionEstablished { sid } => {
                info!(%sid, "connection established");
                self.session = Some(sid);
                self.round.on_connected();
            }
            Inbound::FullRoundState(snapshot) => {
                let status = self.round.apply_snapshot(snapshot);
                self.enter(status);
            }
            Inbound::MultiplierTick { multiplier } => {
                if let TickOutcome::Render(multiplier) =
                    self.round.apply_tick(multiplier, self.visible)
                {
                    if let Some(flame) = self.position.on_running(multiplier) {
                        self.trail.emit(flame);
                    }
                    if self.controls.cash_out {
                        self.bet.on_visible_tick(multiplier);
                    }
                }
            }
            Inbound::CountdownTick { time_to_next_round } => {
                self.round.apply_countdown(time_to_next_round);
            }
            Inbound::RosterFullSync(records) => self.roster.replace_all(records),
            Inbound::RosterUpsert { sid, data } => self.roster.upsert(sid, data),
            Inbound::RosterRemove { sid } => self.roster.remove(&sid),
            Inbound::RosterClear => self.roster.clear(),
            Inbound::PlayerSnapshot { balance, username } => {
                self.bet.on_player_snapshot(balance, username);
            }
            Inbound::PlacementAcknowledged {
                amount,
                balance,
                auto_cashout_at,
            } => {
                info!(amount, balance, "bet placement acknowledged");
                self.bet
                    .on_placement_acknowledged(amount, balance, auto_cashout_at);
                self.controls.place_bet = false;
                self.banner.clear();
            }
            Inbound::CashOutAcknowledged {
                multiplier,
                potential_winnings,
            } => {
                info!(multiplier, potential_winnings, "cash out acknowledged");
                self.bet
                    .on_cash_out_acknowledged(multiplier, potential_winnings);
                self.controls.cash_out = false;
                self.banner.clear();
            }
            Inbound::RoundResult(result) => {
                if self.bet.on_round_result(&result, self.session.as_ref()) {
                    info!(won = result.won, balance = result.balance, "round result");
                    self.controls.cash_out &= self.bet.has_open_bet();
                }
            }
            Inbound::ErrorNotice { message } => {
                error!(%message, "server error notice");
                let scheduled = self.banner.show(message, LONG_NOTICE);
                return vec![Effect::ScheduleClear(scheduled)];
            }
        }
        Vec::new()
    }

    fn enter(&mut self, status: RoundStatus) {
        match status {
            RoundStatus::Waiting => {
                self.controls = Controls {
                    place_bet: true,
                    cash_out: false,
                };
                self.bet.on_round_waiting();
                self.position.on_waiting();
                self.trail.set_emitting(false);
                self.trail.reinitialize(self.surface);
            }
            RoundStatus::Running => {
                self.controls = Controls {
                    place_bet: false,
                    cash_out: self.bet.has_open_bet(),
                };
                self.bet.clear_result();
                self.trail.set_emitting(true);
                if self.visible {
                    let multiplier = self.round.display().value;
                    if let Some(flame) = self.position.on_running(multiplier) {
                        self.trail.emit(flame);
                    }
                }
            }
            RoundStatus::Crashed => {
                self.controls = Controls::default();
                self.position.on_crashed();
                self.trail.set_emitting(false);
            }
        }
    }

    pub fn set_auto_cashout_input(&mut self, input: impl Into<String>) {
        self.bet.set_auto_input(input);
    }

    pub fn clear_auto_cashout(&mut self) {
        self.bet.clear_auto_cashout();
    }

    pub fn place_bet(&mut self, amount_input: &str) -> Vec<Effect> {
        if !self.controls.place_bet {
            debug!("bet placement is not available");
            return Vec::new();
        }
        match self.bet.request_placement(amount_input) {
            Ok(placement) => {
                let mut effects = vec![Effect::Send(placement.intent)];
                match placement.warning {
                    Some(warning) => {
                        let scheduled = self.banner.show(warning.to_string(), LONG_NOTICE);
                        effects.push(Effect::ScheduleClear(scheduled));
                    }
                    None => self.banner.clear(),
                }
                effects
            }
            Err(err) => {
                debug!(%err, input = amount_input, "rejected bet amount");
                let scheduled = self.banner.show(err.to_string(), SHORT_NOTICE);
                vec![Effect::ScheduleClear(scheduled)]
            }
        }
    }

    pub fn cash_out(&mut self) -> Vec<Effect> {
        if !self.controls.cash_out {
            debug!("cash out is not available");
            return Vec::new();
        }
        vec![Effect::Send(self.bet.request_cash_out())]
    }

    pub fn expire_notice(&mut self, generation: Generation) {
        self.banner.expire(generation);
    }

    /// Backgrounded sessions keep state current but skip tick rendering.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn resize(&mut self, surface: Surface) {
        if surface == self.surface {
            return;
        }
        self.surface = surface;
        self.position.resize(surface);
        self.trail.reinitialize(surface);
    }

    /// One display refresh.
    pub fn frame(&mut self) {
        self.trail.step();
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.round.state();
        Snapshot {
            username: self.bet.username().map(str::to_owned),
            balance: self.bet.balance(),
            round_status: self.round.status(),
            status_text: self.round.status_text().to_owned(),
            countdown: state.and_then(|s| s.time_to_next_round),
            multiplier: self.round.display(),
            history: self
                .round
                .history()
                .iter()
                .map(|&point| (point, HistoryTone::for_value(point)))
                .collect(),
            roster: self.roster.entries().collect(),
            controls: self.controls,
            cash_out_label: self.bet.cash_out_label().text(),
            bet_status: self.bet.bet_status().to_owned(),
            auto_input: self.bet.auto_input().to_owned(),
            result: self.bet.result().cloned(),
            error: self.banner.message().map(str::to_owned),
            pose: self.position.pose(),
            surface: self.surface,
            particles: self.trail.particles().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::events::{
        RoundResult,
        RoundSnapshot,
    };
    use rand::{
        SeedableRng,
        rngs::StdRng,
    };

    fn engine() -> Engine {
        let surface = Surface::new(80.0, 160.0, 12.0);
        Engine::with_trail(TrailSimulator::with_rng(surface, StdRng::seed_from_u64(1)))
    }

    fn round(status: RoundStatus, multiplier: f64) -> Inbound {
        Inbound::FullRoundState(RoundSnapshot {
            status,
            current_multiplier: multiplier,
            crash_point: None,
            history: vec![],
            time_to_next_round: Some(5),
        })
    }

    #[test]
    fn controls__are_disabled_before_first_round_state() {
        let engine = engine();
        assert_eq!(engine.controls(), Controls::default());
    }

    #[test]
    fn place_bet__is_refused_while_placement_disabled() {
        // given
        let mut engine = engine();
        engine.handle(round(RoundStatus::Running, 1.0));

        // when
        let effects = engine.place_bet("10");

        // then
        assert!(effects.is_empty());
    }

    #[test]
    fn place_bet__invalid_amount_schedules_short_banner() {
        // given
        let mut engine = engine();
        engine.handle(round(RoundStatus::Waiting, 1.0));

        // when
        let effects = engine.place_bet("abc");

        // then
        assert!(matches!(
            effects.as_slice(),
            [Effect::ScheduleClear(ScheduledClear { after, .. })] if *after == SHORT_NOTICE
        ));
        assert_eq!(
            engine.banner().message(),
            Some("Please enter a valid bet amount.")
        );
    }

    #[test]
    fn running__enables_cash_out_only_for_an_open_bet() {
        // given
        let mut engine = engine();
        engine.handle(round(RoundStatus::Waiting, 1.0));
        engine.handle(Inbound::PlacementAcknowledged {
            amount: 10.0,
            balance: 90.0,
            auto_cashout_at: None,
        });

        // when
        engine.handle(round(RoundStatus::Running, 1.0));

        // then
        assert_eq!(
            engine.controls(),
            Controls {
                place_bet: false,
                cash_out: true
            }
        );
        assert_eq!(engine.cash_out(), vec![Effect::Send(Outbound::CashOut)]);
    }

    #[test]
    fn round_result__own_settlement_withdraws_cash_out() {
        // given
        let mut engine = engine();
        engine.handle(Inbound::ConnectionEstablished { sid: "me".into() });
        engine.handle(round(RoundStatus::Waiting, 1.0));
        engine.handle(Inbound::PlacementAcknowledged {
            amount: 10.0,
            balance: 90.0,
            auto_cashout_at: None,
        });
        engine.handle(round(RoundStatus::Running, 1.0));

        // when
        engine.handle(Inbound::RoundResult(RoundResult {
            sid: "me".into(),
            won: false,
            winnings: None,
            payout: None,
            balance: 90.0,
            current_bet_amount: Some(10.0),
        }));

        // then
        assert!(!engine.bet().has_open_bet());
        assert!(!engine.controls().cash_out);
        assert!(engine.cash_out().is_empty());
    }

    #[test]
    fn running__while_hidden_leaves_rocket_and_trail_alone() {
        // given
        let mut engine = engine();
        engine.set_visible(false);

        // when
        engine.handle(round(RoundStatus::Running, 4.0));

        // then
        assert_eq!(engine.position().pose().bottom, 0.0);
        assert!(engine.trail().particles().is_empty());
        assert!(engine.trail().is_emitting());
    }

    #[test]
    fn multiplier_tick__hidden_skips_rendering_but_advances_state() {
        // given
        let mut engine = engine();
        engine.handle(round(RoundStatus::Running, 1.0));
        engine.set_visible(false);
        let particles_before = engine.trail().particles().len();

        // when
        engine.handle(Inbound::MultiplierTick { multiplier: 3.0 });

        // then
        assert_eq!(engine.round().state().unwrap().current_multiplier, 3.0);
        assert_eq!(engine.round().display().value, 1.0);
        assert_eq!(engine.trail().particles().len(), particles_before);
    }

    #[test]
    fn multiplier_tick__visible_moves_rocket_and_seeds_trail() {
        // given
        let mut engine = engine();
        engine.handle(round(RoundStatus::Running, 1.0));
        let particles_before = engine.trail().particles().len();

        // when
        engine.handle(Inbound::MultiplierTick { multiplier: 3.0 });

        // then
        assert!(engine.position().pose().bottom > 0.0);
        assert!(engine.trail().particles().len() > particles_before);
    }

    #[test]
    fn frame__decays_trail_without_network_activity() {
        // given
        let mut engine = engine();
        engine.handle(round(RoundStatus::Running, 1.0));
        engine.handle(Inbound::MultiplierTick { multiplier: 1.5 });
        engine.handle(round(RoundStatus::Crashed, 1.5));

        // when
        for _ in 0..60 {
            engine.frame();
        }

        // then
        assert!(engine.trail().particles().is_empty());
    }

    #[test]
    fn resize__reinitializes_the_trail() {
        // given
        let mut engine = engine();
        engine.handle(round(RoundStatus::Running, 1.0));
        engine.handle(Inbound::MultiplierTick { multiplier: 2.0 });

        // when
        engine.resize(Surface::new(40.0, 40.0, 8.0));

        // then
        assert!(engine.trail().particles().is_empty());
        assert_eq!(engine.snapshot().surface, Surface::new(40.0, 40.0, 8.0));
    }

    #[test]
    fn error_notice__supersedes_pending_clear() {
        // given
        let mut engine = engine();
        let first = engine.handle(Inbound::ErrorNotice {
            message: "Betting is closed for this round.".into(),
        });
        engine.handle(Inbound::ErrorNotice {
            message: "Insufficient balance.".into(),
        });
        let [Effect::ScheduleClear(first)] = first.as_slice() else {
            panic!("expected a scheduled clear");
        };

        // when
        engine.expire_notice(first.generation);

        // then
        assert_eq!(engine.banner().message(), Some("Insufficient balance."));
    }
}
