//! Round lifecycle as mirrored from the server.

use crate::{
    events::{
        RoundSnapshot,
        RoundStatus,
    },
    format,
};
use tracing::{
    debug,
    warn,
};

pub const HISTORY_DEPTH: usize = 15;

/// Display band of the live multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MultiplierTone {
    Waiting,
    Low,
    Medium,
    High,
    VeryHigh,
    Crashed,
}

impl MultiplierTone {
    pub fn for_value(multiplier: f64) -> Self {
        if multiplier < 1.01 {
            Self::Waiting
        } else if multiplier < 2.0 {
            Self::Low
        } else if multiplier < 5.0 {
            Self::Medium
        } else if multiplier < 10.0 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very-high",
            Self::Crashed => "crashed",
        }
    }
}

/// Display band of a past crash point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryTone {
    Low,
    Mid,
    High,
    Insane,
}

impl HistoryTone {
    pub fn for_value(crash_point: f64) -> Self {
        if crash_point < 1.5 {
            Self::Low
        } else if crash_point < 3.0 {
            Self::Mid
        } else if crash_point < 10.0 {
            Self::High
        } else {
            Self::Insane
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
            Self::Insane => "insane",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MultiplierDisplay {
    pub value: f64,
    pub tone: MultiplierTone,
}

impl MultiplierDisplay {
    pub fn text(&self) -> String {
        format::multiplier(self.value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoundState {
    pub status: RoundStatus,
    pub current_multiplier: f64,
    pub crash_point: Option<f64>,
    pub history: Vec<f64>,
    pub time_to_next_round: Option<u32>,
}

/// What a multiplier tick asks of the rest of the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// Not running, or older than what is already shown.
    Ignored,
    /// State advanced but nothing is drawn while hidden.
    Recorded,
    Render(f64),
}

#[derive(Clone, Debug)]
pub struct RoundStateMachine {
    state: Option<RoundState>,
    display: MultiplierDisplay,
    status_text: String,
}

impl Default for RoundStateMachine {
    fn default() -> Self {
        Self {
            state: None,
            display: MultiplierDisplay {
                value: 1.0,
                tone: MultiplierTone::Waiting,
            },
            status_text: String::from("Connecting..."),
        }
    }
}

impl RoundStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&RoundState> {
        self.state.as_ref()
    }

    pub fn status(&self) -> Option<RoundStatus> {
        self.state.as_ref().map(|s| s.status)
    }

    pub fn display(&self) -> MultiplierDisplay {
        self.display
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn history(&self) -> &[f64] {
        self.state.as_ref().map(|s| s.history.as_slice()).unwrap_or_default()
    }

    pub fn on_connected(&mut self) {
        if self.state.is_none() {
            self.status_text = String::from("Connected. Waiting for game...");
        }
    }

    /// Adopts a full snapshot and returns the status being entered. Entry
    /// actions run on every snapshot, the server only pushes one per
    /// transition or on connect.
    pub fn apply_snapshot(&mut self, snapshot: RoundSnapshot) -> RoundStatus {
        let RoundSnapshot {
            status,
            current_multiplier,
            crash_point,
            mut history,
            time_to_next_round,
        } = snapshot;
        if let Some(previous) = self.status()
            && !follows(previous, status)
        {
            warn!(?previous, ?status, "round status skipped a step; adopting server state");
        }
        history.truncate(HISTORY_DEPTH);

        // The crash point is fixed once announced; repeats only refresh history.
        if let Some(state) = self.state.as_mut()
            && state.status == RoundStatus::Crashed
            && status == RoundStatus::Crashed
        {
            debug!(crash_point = ?state.crash_point, "repeated crash snapshot");
            state.history = history;
            return status;
        }

        let crash_point = match status {
            RoundStatus::Crashed => crash_point.or(Some(current_multiplier)),
            _ => None,
        };
        let (value, tone) = match status {
            RoundStatus::Waiting => (current_multiplier, MultiplierTone::Waiting),
            RoundStatus::Running => (current_multiplier, MultiplierTone::for_value(current_multiplier)),
            RoundStatus::Crashed => (
                crash_point.unwrap_or(current_multiplier),
                MultiplierTone::Crashed,
            ),
        };
        self.display = MultiplierDisplay { value, tone };
        self.status_text = match status {
            RoundStatus::Waiting => countdown_text(time_to_next_round.unwrap_or_default()),
            RoundStatus::Running => String::from("Multiplying... Good luck!"),
            RoundStatus::Crashed => format!("CRASHED @ {}", format::multiplier(value)),
        };
        debug!(?status, multiplier = value, "entered round status");
        self.state = Some(RoundState {
            status,
            current_multiplier: value,
            crash_point,
            history,
            time_to_next_round,
        });
        status
    }

    pub fn apply_tick(&mut self, multiplier: f64, visible: bool) -> TickOutcome {
        let Some(state) = self.state.as_mut() else {
            return TickOutcome::Ignored;
        };
        if state.status != RoundStatus::Running
            || !multiplier.is_finite()
            || multiplier < state.current_multiplier
        {
            debug!(multiplier, status = ?state.status, "ignoring multiplier tick");
            return TickOutcome::Ignored;
        }
        state.current_multiplier = multiplier;
        if !visible {
            return TickOutcome::Recorded;
        }
        self.display = MultiplierDisplay {
            value: multiplier,
            tone: MultiplierTone::for_value(multiplier),
        };
        TickOutcome::Render(multiplier)
    }

    /// Advisory countdown; only refreshes text that still shows the countdown.
    pub fn apply_countdown(&mut self, seconds: u32) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.time_to_next_round = Some(seconds);
        if state.status == RoundStatus::Waiting
            && self.status_text.starts_with(COUNTDOWN_PREFIX)
        {
            self.status_text = countdown_text(seconds);
        }
    }
}

const COUNTDOWN_PREFIX: &str = "Next round in";

fn countdown_text(seconds: u32) -> String {
    format!("{COUNTDOWN_PREFIX} {seconds}s. Place your bets!")
}

fn follows(previous: RoundStatus, next: RoundStatus) -> bool {
    use RoundStatus::*;
    matches!(
        (previous, next),
        (Waiting, Running) | (Running, Crashed) | (Crashed, Waiting)
    ) || previous == next
}
