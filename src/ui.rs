use color_eyre::eyre::Result;
use crash_client::{
    Snapshot,
    bet::ResultTone,
    format,
    position::{
        Surface,
        Tilt,
    },
    roster::{
        Badge,
        RosterEntry,
    },
    round::{
        HistoryTone,
        MultiplierTone,
    },
    trail::TrailParticle,
};
use crossterm::{
    event::{
        DisableFocusChange,
        EnableFocusChange,
        Event,
        KeyCode,
        KeyEvent,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{
        canvas::{
            Canvas,
            Points,
        },
        *,
    },
};
use itertools::Itertools;
use std::io::stdout;
use unicode_width::UnicodeWidthChar;

/// Canvas resolution per terminal cell with the Braille marker.
const DOTS_PER_COLUMN: f64 = 2.0;
const DOTS_PER_ROW: f64 = 4.0;
const ROCKET_ROWS: f64 = 2.0;
const USERNAME_WIDTH: usize = 14;
const KEY_HELP: &[(&str, &str)] = &[
    ("b", "edit amount"),
    ("a", "edit auto cashout"),
    ("x", "clear auto"),
    ("Enter/p", "place bet"),
    ("c/Space", "cash out"),
    ("q/Esc", "quit"),
];

pub enum UserEvent {
    Quit,
    PlaceBet(String),
    CashOut,
    SetAutoCashout(String),
    ClearAutoCashout,
    Focus(bool),
    Resize,
    Redraw,
}

#[derive(Debug)]
pub struct UiState {
    mode: Mode,
    amount_input: String,
    // last value the engine reported, so editing starts from what is shown
    auto_input: String,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

impl Default for UiState {
    fn default() -> Self {
        UiState {
            mode: Mode::Normal,
            amount_input: String::from("10"),
            auto_input: String::new(),
            terminal: None,
        }
    }
}

impl UiState {
    /// Drawing surface of the flight canvas for the current terminal size.
    pub fn surface(&self) -> Surface {
        let Some(size) = self.terminal.as_ref().and_then(|t| t.size().ok()) else {
            return Surface::default();
        };
        let inner = Block::default()
            .borders(Borders::ALL)
            .inner(flight_area(Rect::new(0, 0, size.width, size.height)));
        Surface::new(
            f64::from(inner.width) * DOTS_PER_COLUMN,
            f64::from(inner.height) * DOTS_PER_ROW,
            ROCKET_ROWS * DOTS_PER_ROW,
        )
    }
}

#[derive(Clone, Debug, Default)]
enum Mode {
    #[default]
    Normal,
    EditAmount(String),
    EditAuto(String),
    QuitModal,
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        DisableFocusChange,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

pub fn draw(state: &mut UiState, snap: &Snapshot) -> Result<()> {
    state.auto_input = snap.auto_input.clone();
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    match event {
        Event::FocusGained => Some(UserEvent::Focus(true)),
        Event::FocusLost => Some(UserEvent::Focus(false)),
        Event::Resize(_, _) => Some(UserEvent::Resize),
        Event::Key(k) if k.kind == KeyEventKind::Press => interpret_key(state, k),
        _ => None,
    }
}

fn interpret_key(state: &mut UiState, k: KeyEvent) -> Option<UserEvent> {
    match &mut state.mode {
        Mode::EditAmount(buf) | Mode::EditAuto(buf) => match k.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Backspace => {
                buf.pop();
                Some(UserEvent::Redraw)
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
                buf.push(c);
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter => match std::mem::take(&mut state.mode) {
                Mode::EditAmount(buf) => {
                    state.amount_input = buf;
                    Some(UserEvent::Redraw)
                }
                Mode::EditAuto(buf) => Some(UserEvent::SetAutoCashout(buf)),
                _ => None,
            },
            _ => None,
        },
        Mode::QuitModal => match k.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::Normal => match k.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                state.mode = Mode::QuitModal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('b') => {
                state.mode = Mode::EditAmount(state.amount_input.clone());
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('a') => {
                state.mode = Mode::EditAuto(state.auto_input.clone());
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('x') => Some(UserEvent::ClearAutoCashout),
            KeyCode::Char('p') | KeyCode::Enter => {
                Some(UserEvent::PlaceBet(state.amount_input.clone()))
            }
            KeyCode::Char('c') | KeyCode::Char(' ') => Some(UserEvent::CashOut),
            _ => None,
        },
    }
}

fn rows(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // player + multiplier
            Constraint::Min(12),   // flight + live bets
            Constraint::Length(3), // crash history
            Constraint::Length(5), // bet controls
            Constraint::Length(3), // banner
            Constraint::Length(3), // help
        ])
        .split(area)
}

fn middle(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area)
}

fn flight_area(area: Rect) -> Rect {
    middle(rows(area)[1])[0]
}

fn ui(f: &mut Frame, state: &UiState, snap: &Snapshot) {
    f.render_widget(Clear, f.area());
    let chunks = rows(f.area());
    let mid = middle(chunks[1]);

    draw_top(f, chunks[0], snap);
    draw_flight(f, mid[0], snap);
    draw_live_bets(f, mid[1], &snap.roster);
    draw_history(f, chunks[2], snap);
    draw_controls(f, state, chunks[3], snap);
    draw_banner(f, chunks[4], snap);
    draw_help(f, chunks[5]);
    draw_modals(f, state);
}

fn draw_top(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let username = snap.username.as_deref().unwrap_or("-");
    let balance = snap
        .balance
        .map(format::amount)
        .unwrap_or_else(|| String::from("-"));
    let player = Paragraph::new(vec![
        Line::from(format!("Player: {username}")),
        Line::from(format!("Balance: {balance}")),
    ])
    .block(Block::default().borders(Borders::ALL).title("Player"));
    f.render_widget(player, cols[0]);

    let multiplier = Line::from(vec![
        Span::styled(
            snap.multiplier.text(),
            Style::default()
                .fg(tone_color(snap.multiplier.tone))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(snap.status_text.clone()),
    ]);
    let round = Paragraph::new(vec![multiplier])
        .block(Block::default().borders(Borders::ALL).title("Round"));
    f.render_widget(round, cols[1]);
}

fn draw_flight(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let Surface {
        width,
        height,
        emitter_height,
    } = snap.surface;
    let pose = snap.pose;
    let (glyph, color) = match (pose.crashed, pose.tilt) {
        (true, _) => ("✸", Color::Red),
        (false, Tilt::Upright) => ("▲", Color::White),
        (false, Tilt::Tilted) => ("◤", Color::Gray),
    };
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title("Flight"))
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(move |ctx| {
            for p in &snap.particles {
                ctx.draw(&Points {
                    coords: &[(p.x, height - p.y)],
                    color: particle_color(p),
                });
            }
            ctx.print(
                width / 2.0,
                pose.bottom + emitter_height / 2.0,
                Span::styled(glyph, Style::default().fg(color)),
            );
        });
    f.render_widget(canvas, area);
}

fn draw_live_bets(f: &mut Frame, area: Rect, roster: &[RosterEntry]) {
    let items: Vec<ListItem> = roster.iter().map(render_roster_entry).collect();
    let title = format!("Live Bets ({})", roster.len());
    let list = if items.is_empty() {
        List::new(vec![ListItem::new(Line::styled(
            "No bets yet",
            Style::default().fg(Color::DarkGray),
        ))])
    } else {
        List::new(items)
    };
    f.render_widget(
        list.block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

fn render_roster_entry(entry: &RosterEntry) -> ListItem<'static> {
    let record = &entry.record;
    let mut spans = vec![
        Span::styled(
            truncate(&record.username, USERNAME_WIDTH),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::raw(format::amount(record.bet_amount)),
    ];
    if let Some(auto) = record.auto_cashout_at {
        spans.push(Span::styled(
            format!(" (Auto @ {})", format::multiplier(auto)),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(badge) = entry.badge() {
        let color = match badge {
            Badge::Cashed => Color::Green,
            Badge::Lost => Color::Red,
            Badge::Neutral => Color::Gray,
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            record.status.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn draw_history(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let line = if snap.history.is_empty() {
        Line::styled("None", Style::default().fg(Color::DarkGray))
    } else {
        let spans: Vec<Span> = snap
            .history
            .iter()
            .flat_map(|(point, tone)| {
                [
                    Span::styled(
                        format::multiplier(*point),
                        Style::default().fg(history_color(*tone)),
                    ),
                    Span::raw(" "),
                ]
            })
            .collect();
        Line::from(spans)
    };
    let widget = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title("Crash History"));
    f.render_widget(widget, area);
}

fn draw_controls(f: &mut Frame, state: &UiState, area: Rect, snap: &Snapshot) {
    let amount = match &state.mode {
        Mode::EditAmount(buf) => format!("[{buf}_]"),
        _ => format!("[{}]", state.amount_input),
    };
    let auto = match &state.mode {
        Mode::EditAuto(buf) => format!("[{buf}_]"),
        _ if snap.auto_input.is_empty() => String::from("[off]"),
        _ => format!("[{}]", snap.auto_input),
    };
    let place_style = control_style(snap.controls.place_bet);
    let cash_style = control_style(snap.controls.cash_out);
    let lines = vec![
        Line::from(format!("Amount: {amount}   Auto Cashout: {auto}")),
        Line::from(vec![
            Span::styled("[ Place Bet ]", place_style),
            Span::raw("  "),
            Span::styled(format!("[ {} ]", snap.cash_out_label), cash_style),
        ]),
        Line::styled(snap.bet_status.clone(), Style::default().fg(Color::Cyan)),
    ];
    let widget =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Bet"));
    f.render_widget(widget, area);
}

fn draw_banner(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let line = if let Some(err) = &snap.error {
        Line::styled(err.clone(), Style::default().fg(Color::Red))
    } else if let Some(result) = &snap.result {
        let color = match result.tone {
            ResultTone::Win => Color::Green,
            ResultTone::Loss => Color::Red,
        };
        Line::styled(result.text.clone(), Style::default().fg(color))
    } else if snap.round_status.is_none() {
        Line::styled("Waiting for the server...", Style::default().fg(Color::DarkGray))
    } else {
        Line::from("")
    };
    let widget = Paragraph::new(line)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(widget, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(KEY_HELP.iter().map(|(key, what)| format!("{key} {what}")).join(" | "))
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_modals(f: &mut Frame, state: &UiState) {
    if let Mode::QuitModal = state.mode {
        let area = centered_rect(40, 20, f.area());
        let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
        let p = Paragraph::new("Quit the game? (Y/N)");
        f.render_widget(Clear, area);
        f.render_widget(block.clone(), area);
        f.render_widget(p, block.inner(area));
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn control_style(enabled: bool) -> Style {
    if enabled {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn tone_color(tone: MultiplierTone) -> Color {
    match tone {
        MultiplierTone::Waiting => Color::Gray,
        MultiplierTone::Low => Color::White,
        MultiplierTone::Medium => Color::Yellow,
        MultiplierTone::High => Color::LightGreen,
        MultiplierTone::VeryHigh => Color::LightMagenta,
        MultiplierTone::Crashed => Color::Red,
    }
}

fn history_color(tone: HistoryTone) -> Color {
    match tone {
        HistoryTone::Low => Color::Red,
        HistoryTone::Mid => Color::Yellow,
        HistoryTone::High => Color::Green,
        HistoryTone::Insane => Color::Magenta,
    }
}

// Terminal cells have no alpha; fade toward black instead.
fn particle_color(p: &TrailParticle) -> Color {
    let fade = |channel: u8| (f64::from(channel) * (0.4 + p.color.a)).min(255.0) as u8;
    Color::Rgb(fade(p.color.r), fade(p.color.g), fade(p.color.b))
}

fn truncate(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width {
            out.push('…');
            break;
        }
        width += w;
        out.push(c);
    }
    out
}
