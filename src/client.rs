use crate::ui;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use crash_client::{
    Effect,
    Engine,
    channel::{
        EventSource,
        IntentSink,
        WsChannel,
    },
    config::AppConfig,
    notice::{
        Generation,
        ScheduledClear,
    },
};
use crossterm::event::EventStream;
use futures::StreamExt;
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{
        self,
        MissedTickBehavior,
    },
};
use tracing::{
    info,
    warn,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

const LOG_FILE_PREFIX: &str = "crash-client.log";

/// Logs go to a daily rolling file; the terminal belongs to the UI.
pub fn init_tracing(config: &AppConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir).wrap_err_with(|| {
        format!("failed to create log directory {}", config.log_dir.display())
    })?;
    let (writer, guard) =
        tracing_appender::non_blocking(rolling::daily(&config.log_dir, LOG_FILE_PREFIX));
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .wrap_err("invalid log filter")?;
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| eyre!("failed to install tracing subscriber: {err}"))?;
    Ok(guard)
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let channel = WsChannel::connect(&config.server_url)
        .await
        .wrap_err_with(|| format!("failed to connect to {}", config.server_url))?;
    info!("connected to game server");

    let mut ui_state = ui::UiState::default();
    ui::terminal_enter(&mut ui_state)?;
    info!("UI ready");
    let engine = Engine::new(ui_state.surface());
    let res = run_loop(engine, channel, &mut ui_state, config.frame_interval).await;
    ui::terminal_exit()?;
    res
}

/// Carries out what the engine asked for. Banner clears are fire-and-forget
/// sleeps that post their generation back to the loop.
fn apply_effects(
    sink: &impl IntentSink,
    notices: &mpsc::UnboundedSender<Generation>,
    effects: Vec<Effect>,
) -> Result<()> {
    for effect in effects {
        match effect {
            Effect::Send(intent) => sink.send(intent).wrap_err("sending intent failed")?,
            Effect::ScheduleClear(ScheduledClear { generation, after }) => {
                let notices = notices.clone();
                tokio::spawn(async move {
                    time::sleep(after).await;
                    let _ = notices.send(generation);
                });
            }
        }
    }
    Ok(())
}

async fn run_loop<C>(
    mut engine: Engine,
    mut channel: C,
    ui_state: &mut ui::UiState,
    frame_interval: Duration,
) -> Result<()>
where
    C: EventSource + IntentSink,
{
    info!("running app loop");
    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
    let mut input_events = EventStream::new();
    let mut frames = time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            event = channel.next_event() => {
                let event = event.wrap_err("lost connection to game server")?;
                let effects = engine.handle(event);
                apply_effects(&channel, &notice_tx, effects)?;
            }
            _ = frames.tick() => {
                engine.frame();
                ui::draw(ui_state, &engine.snapshot()).wrap_err("draw failed")?;
            }
            Some(generation) = notice_rx.recv() => {
                engine.expire_notice(generation);
            }
            raw = input_events.next() => {
                let Some(raw) = raw else {
                    warn!("terminal input stream ended");
                    break;
                };
                let raw = raw.wrap_err("reading terminal input failed")?;
                let Some(ev) = ui::interpret_event(ui_state, raw) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::PlaceBet(amount) => {
                        let effects = engine.place_bet(&amount);
                        apply_effects(&channel, &notice_tx, effects)?;
                    }
                    ui::UserEvent::CashOut => {
                        let effects = engine.cash_out();
                        apply_effects(&channel, &notice_tx, effects)?;
                    }
                    ui::UserEvent::SetAutoCashout(input) => engine.set_auto_cashout_input(input),
                    ui::UserEvent::ClearAutoCashout => engine.clear_auto_cashout(),
                    ui::UserEvent::Focus(visible) => engine.set_visible(visible),
                    ui::UserEvent::Resize => engine.resize(ui_state.surface()),
                    ui::UserEvent::Redraw => {}
                }
                ui::draw(ui_state, &engine.snapshot()).wrap_err("draw after input failed")?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    info!("leaving app loop");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crash_client::{
        Outbound,
        channel::ChannelError,
        notice::ErrorBanner,
    };
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        sent: RefCell<Vec<Outbound>>,
    }

    impl IntentSink for RecordingSink {
        fn send(&self, intent: Outbound) -> Result<(), ChannelError> {
            self.sent.borrow_mut().push(intent);
            Ok(())
        }
    }

    #[tokio::test]
    async fn apply_effects__sends_intents_and_posts_expired_generations() {
        // given
        let sink = RecordingSink::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut banner = ErrorBanner::default();
        let scheduled = banner.show("oops", Duration::from_millis(5));
        let generation = scheduled.generation;
        let effects = vec![
            Effect::Send(Outbound::CashOut),
            Effect::ScheduleClear(scheduled),
        ];

        // when
        apply_effects(&sink, &tx, effects).unwrap();

        // then
        assert_eq!(sink.sent.borrow().as_slice(), &[Outbound::CashOut]);
        assert_eq!(rx.recv().await, Some(generation));
    }
}
