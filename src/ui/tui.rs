//! Ratatui console wired to the catalog poller.
//!
//! One synchronous event loop owns the [`Session`]: poller messages and key
//! events are drained one at a time, so a snapshot application and a user
//! transition can never interleave. Anything that must not block the loop
//! (the reset POST) runs on a throwaway thread and reports back through a
//! channel drained by the same loop.

use anyhow::Result;
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use std::io;
use std::time::{Duration, Instant};

use crate::api::ApiClient;
use crate::config::Config;
use crate::filter::project;
use crate::model::types::Entity;
use crate::poller::{Poller, PollerMsg};
use crate::session::{Effect, Session, ViewMode};
use crate::ui::components::theme::ThemePalette;
use crate::viewport::{Overlay, Viewport};

/// Which text field keystrokes go to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InputMode {
    List,
    NameFilter,
    DateFilter,
    TimeFilter,
}

/// Out-of-loop work reporting back in (currently just the reset POST).
enum UiMsg {
    ResetAcknowledged,
    ResetFailed(String),
}

/// Loop-local display state that is not part of the session proper.
struct UiState {
    input_mode: InputMode,
    /// Row under the keyboard cursor in the catalog list.
    list_cursor: usize,
    show_help: bool,
    /// Stream resource currently requested for the Live view.
    stream_url: String,
    /// Local countdown shown in the header; overridden by `/api/status`.
    scan_remaining: Duration,
    video_remaining_sec: Option<u64>,
    status_line: String,
}

/// Fallback scan cycle when the server has no `/api/status` endpoint.
const SCAN_CYCLE: Duration = Duration::from_secs(10);

pub fn run_tui(config: Config, once: bool) -> Result<()> {
    if once {
        return run_tui_once(config);
    }

    let _log_guard = crate::logging::init_tui(&config.data_dir)?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, config);

    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}

/// Render a single frame headlessly and print it; used by CI and smoke tests.
fn run_tui_once(config: Config) -> Result<()> {
    let client = ApiClient::new(&config);
    let mut session = Session::new();
    let mut viewport = Viewport::new();
    let mut ui = fresh_ui_state(&client, &session);

    // Best effort: one fetch, errors keep the empty catalog.
    if let Ok(snapshot) = client.fetch_snapshot() {
        let effect = session.apply_snapshot(snapshot);
        apply_effect(effect, &session, &mut viewport, &client, &mut ui);
    }

    let backend = ratatui::backend::TestBackend::new(110, 32);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|f| draw_ui(f, &session, &viewport, &ui, ThemePalette::dark()))?;

    let buffer = terminal.backend().buffer().clone();
    for y in 0..buffer.area.height {
        let mut line = String::new();
        for x in 0..buffer.area.width {
            line.push_str(buffer[(x, y)].symbol());
        }
        println!("{}", line.trim_end());
    }
    Ok(())
}

fn fresh_ui_state(client: &ApiClient, session: &Session) -> UiState {
    UiState {
        input_mode: InputMode::List,
        list_cursor: 0,
        show_help: false,
        stream_url: client.stream_url(session.selection.boxes_visible),
        scan_remaining: SCAN_CYCLE,
        video_remaining_sec: None,
        status_line: "Polling catalog... (? for help, q to quit)".to_string(),
    }
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, config: Config) -> Result<()> {
    let client = ApiClient::new(&config);
    let mut session = Session::new();
    let mut viewport = Viewport::new();
    let mut ui = fresh_ui_state(&client, &session);

    let handle = Poller::new(config.clone()).start();
    let (action_tx, action_rx) = crossbeam_channel::unbounded::<UiMsg>();

    let tick_rate = Duration::from_millis(100);
    let mut last_countdown_tick = Instant::now();
    let mut needs_draw = true;

    loop {
        // Apply each poller message whole before looking at anything else.
        while let Ok(msg) = handle.receiver().try_recv() {
            match msg {
                PollerMsg::Snapshot(snapshot) => {
                    let effect = session.apply_snapshot(snapshot);
                    apply_effect(effect, &session, &mut viewport, &client, &mut ui);
                    clamp_list_cursor(&session, &mut ui);
                    ui.scan_remaining = SCAN_CYCLE;
                }
                PollerMsg::Status(status) => {
                    ui.scan_remaining = Duration::from_millis(status.scan_remaining_ms);
                    ui.video_remaining_sec = Some(status.video_remaining_sec);
                }
            }
            needs_draw = true;
        }

        while let Ok(msg) = action_rx.try_recv() {
            match msg {
                UiMsg::ResetAcknowledged => {
                    let effect = session.reset();
                    apply_effect(effect, &session, &mut viewport, &client, &mut ui);
                    ui.list_cursor = 0;
                    ui.scan_remaining = SCAN_CYCLE;
                    ui.status_line = "Server and local state cleared".to_string();
                }
                UiMsg::ResetFailed(err) => {
                    // State untouched on failure.
                    ui.status_line = format!("Reset failed, state unchanged ({err})");
                }
            }
            needs_draw = true;
        }

        // Cosmetic countdown; no state mutation beyond display text.
        if last_countdown_tick.elapsed() >= Duration::from_secs(1) {
            last_countdown_tick = Instant::now();
            ui.scan_remaining = ui
                .scan_remaining
                .checked_sub(Duration::from_secs(1))
                .unwrap_or(SCAN_CYCLE);
            needs_draw = true;
        }

        if needs_draw {
            terminal.draw(|f| draw_ui(f, &session, &viewport, &ui, ThemePalette::dark()))?;
            needs_draw = false;
        }

        if !event::poll(tick_rate)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            needs_draw = true;
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }
        needs_draw = true;

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            break;
        }

        if ui.show_help {
            ui.show_help = false;
            continue;
        }

        match ui.input_mode {
            InputMode::List => {
                if !handle_list_key(key.code, &mut session, &mut viewport, &client, &mut ui, &action_tx) {
                    break;
                }
            }
            mode => handle_filter_key(key.code, mode, &mut session, &mut ui),
        }
    }

    Ok(())
}

/// Keys in list mode. Returns false to quit.
fn handle_list_key(
    code: KeyCode,
    session: &mut Session,
    viewport: &mut Viewport,
    client: &ApiClient,
    ui: &mut UiState,
    action_tx: &crossbeam_channel::Sender<UiMsg>,
) -> bool {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return false,
        KeyCode::Char('?') => ui.show_help = true,
        KeyCode::Up => {
            ui.list_cursor = ui.list_cursor.saturating_sub(1);
        }
        KeyCode::Down => {
            if ui.list_cursor + 1 < session.catalog.entities.len() {
                ui.list_cursor += 1;
            }
        }
        KeyCode::Enter => {
            if let Some(name) = session
                .catalog
                .entities
                .get(ui.list_cursor)
                .map(|e| e.name.clone())
            {
                let effect = session.select_entity(&name);
                apply_effect(effect, session, viewport, client, ui);
                ui.status_line = format!("Viewing history of {name}");
            }
        }
        KeyCode::Char('l') => {
            let effect = session.enter_live();
            apply_effect(effect, session, viewport, client, ui);
            ui.status_line = "Live feed".to_string();
        }
        // Jump to the most recently active entity's latest frame.
        KeyCode::Char('L') => {
            if let Some(name) = session.catalog.entities.first().map(|e| e.name.clone()) {
                let effect = session.select_entity(&name);
                apply_effect(effect, session, viewport, client, ui);
                ui.status_line = format!("Last known: {name}");
            }
        }
        KeyCode::Char('b') => {
            let effect = session.toggle_box_overlay();
            if effect != Effect::None {
                ui.status_line = format!(
                    "Live boxes: {}",
                    if session.selection.boxes_visible { "on" } else { "off" }
                );
            }
            apply_effect(effect, session, viewport, client, ui);
        }
        KeyCode::Left => {
            let effect = session.nudge_scrubber(-1);
            apply_effect(effect, session, viewport, client, ui);
        }
        KeyCode::Right => {
            let effect = session.nudge_scrubber(1);
            apply_effect(effect, session, viewport, client, ui);
        }
        KeyCode::Home => {
            let effect = session.move_scrubber(0);
            apply_effect(effect, session, viewport, client, ui);
        }
        KeyCode::End => {
            let effect = session.move_scrubber(usize::MAX);
            apply_effect(effect, session, viewport, client, ui);
        }
        KeyCode::Char('r') => {
            // Server first, local only on 2xx; POST runs off-loop.
            ui.status_line = "Resetting server...".to_string();
            let tx = action_tx.clone();
            let reset_client = ApiClient::with_timeout(client.base(), http_timeout());
            std::thread::spawn(move || {
                let msg = match reset_client.reset() {
                    Ok(()) => UiMsg::ResetAcknowledged,
                    Err(err) => UiMsg::ResetFailed(err.to_string()),
                };
                let _ = tx.send(msg);
            });
        }
        KeyCode::Char('/') => {
            ui.input_mode = InputMode::NameFilter;
            ui.status_line = "Name filter (Enter/Esc done)".to_string();
        }
        KeyCode::Char('d') => {
            ui.input_mode = InputMode::DateFilter;
            ui.status_line = "Date filter (Enter/Esc done)".to_string();
        }
        KeyCode::Char('t') => {
            ui.input_mode = InputMode::TimeFilter;
            ui.status_line = "Time filter (Enter/Esc done)".to_string();
        }
        KeyCode::Delete => {
            session.filters.clear();
            ui.status_line = "Filters cleared".to_string();
        }
        _ => {}
    }
    true
}

fn handle_filter_key(code: KeyCode, mode: InputMode, session: &mut Session, ui: &mut UiState) {
    let query = match mode {
        InputMode::NameFilter => &mut session.filters.name_query,
        InputMode::DateFilter => &mut session.filters.date_query,
        InputMode::TimeFilter => &mut session.filters.time_query,
        InputMode::List => return,
    };
    match code {
        KeyCode::Enter | KeyCode::Esc => {
            ui.input_mode = InputMode::List;
            ui.status_line = "Filter applied".to_string();
        }
        KeyCode::Backspace => {
            query.pop();
        }
        KeyCode::Char(c) => query.push(c),
        _ => {}
    }
}

/// Interpret a transition's effect. The render itself happens on the next
/// draw; this installs the stream URL or runs the two-phase overlay hand-off.
fn apply_effect(
    effect: Effect,
    session: &Session,
    viewport: &mut Viewport,
    client: &ApiClient,
    ui: &mut UiState,
) {
    match effect {
        Effect::None => {}
        Effect::OpenLiveStream { annotated } => {
            ui.stream_url = client.stream_url(annotated);
            viewport.clear();
        }
        Effect::RenderFrame(frame_ref) => {
            let ticket = viewport.begin();
            // Install the overlay only if the selection still points at the
            // requested frame; a stale request keeps the viewport clear.
            let selection = &session.selection;
            if selection.active.as_deref() != Some(frame_ref.entity.as_str())
                || selection.cursor != frame_ref.index
            {
                return;
            }
            let overlay = session
                .catalog
                .entity(&frame_ref.entity)
                .and_then(|entity| entity.history.get(frame_ref.index))
                .and_then(|frame| {
                    frame.region.map(|region| Overlay {
                        region,
                        label: frame_ref.entity.clone(),
                        confidence: frame.confidence_label(),
                    })
                });
            viewport.complete(ticket, overlay);
        }
    }
}

fn clamp_list_cursor(session: &Session, ui: &mut UiState) {
    let len = session.catalog.entities.len();
    if len == 0 {
        ui.list_cursor = 0;
    } else if ui.list_cursor >= len {
        ui.list_cursor = len - 1;
    }
}

// ── Drawing ──────────────────────────────────────────────────────────

fn draw_ui(f: &mut Frame, session: &Session, viewport: &Viewport, ui: &UiState, palette: ThemePalette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // catalog + viewport
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    draw_header(f, chunks[0], session, ui, palette);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(38), Constraint::Min(0)])
        .split(chunks[1]);

    draw_catalog(f, main[0], session, ui, palette);
    draw_workspace(f, main[1], session, viewport, ui, palette);

    let footer = Paragraph::new(footer_legend()).style(palette.hint_style());
    f.render_widget(footer, chunks[2]);

    if ui.show_help {
        draw_help_overlay(f, palette);
    }
}

pub fn footer_legend() -> &'static str {
    "↑/↓ select | Enter history | l live | L last known | ←/→ scrub | b boxes | / d t filters | Del clear | r reset | q quit"
}

fn draw_header(f: &mut Frame, area: Rect, session: &Session, ui: &UiState, palette: ThemePalette) {
    let mode_badge = match session.selection.mode {
        ViewMode::Live => Span::styled(" LIVE ", palette.box_label()),
        ViewMode::Historical => Span::styled(
            " HISTORY ",
            Style::default().fg(palette.bg).bg(palette.fg),
        ),
        ViewMode::Empty => Span::styled(" -- ", palette.hint_style()),
    };

    let mut spans = vec![
        Span::styled("DETECTION WATCH", palette.title()),
        Span::raw("  "),
        mode_badge,
        Span::raw("  detections: "),
        Span::styled(
            session.catalog.total_frames.to_string(),
            Style::default().fg(palette.alert).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  next scan: "),
        Span::styled(
            format!("{}s", ui.scan_remaining.as_secs()),
            Style::default().fg(palette.accent),
        ),
    ];
    if let Some(secs) = ui.video_remaining_sec {
        spans.push(Span::raw("  footage left: "));
        spans.push(Span::styled(format!("{secs}s"), palette.hint_style()));
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(&ui.status_line, palette.hint_style()));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border_style());
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_catalog(f: &mut Frame, area: Rect, session: &Session, ui: &UiState, palette: ThemePalette) {
    let rows = project(&session.catalog, &session.filters);

    let filter_label = if session.filters.is_empty() {
        "catalog".to_string()
    } else {
        format!(
            "catalog [{} {} {}]",
            session.filters.name_query.trim(),
            session.filters.date_query.trim(),
            session.filters.time_query.trim()
        )
    };

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let entity = row.entity;
            let is_active = session.selection.mode == ViewMode::Historical
                && session.selection.active.as_deref() == Some(entity.name.as_str());
            let name_style = if !row.visible {
                palette.dimmed()
            } else if is_active {
                palette.title()
            } else {
                Style::default().fg(palette.fg).add_modifier(Modifier::BOLD)
            };
            let latest = entity.latest();
            let header = Line::from(vec![
                Span::styled(entity.name.clone(), name_style),
                Span::styled(format!(" ({})", entity.history.len()), palette.hint_style()),
            ]);
            let seen = Line::from(Span::styled(
                format!("  last seen {} | {}", latest.date, latest.time),
                if row.visible {
                    palette.hint_style()
                } else {
                    palette.dimmed()
                },
            ));
            ListItem::new(vec![header, seen])
        })
        .collect();

    let mut state = ListState::default();
    if !rows.is_empty() {
        state.select(Some(ui.list_cursor.min(rows.len() - 1)));
    }

    let focused = ui.input_mode == InputMode::List;
    let block = Block::default()
        .title(Span::styled(filter_label, palette.title()))
        .borders(Borders::ALL)
        .border_style(if focused {
            palette.border_focus_style()
        } else {
            palette.border_style()
        });

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(palette.surface)
            .add_modifier(Modifier::BOLD),
    );
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_workspace(
    f: &mut Frame,
    area: Rect,
    session: &Session,
    viewport: &Viewport,
    ui: &UiState,
    palette: ThemePalette,
) {
    match session.selection.mode {
        ViewMode::Live | ViewMode::Empty => draw_live(f, area, session, ui, palette),
        ViewMode::Historical => draw_historical(f, area, session, viewport, palette),
    }
}

fn draw_live(f: &mut Frame, area: Rect, session: &Session, ui: &UiState, palette: ThemePalette) {
    let block = Block::default()
        .title(Span::styled("live feed", palette.title()))
        .borders(Borders::ALL)
        .border_style(palette.border_focus_style());

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("● LIVE", palette.title())),
        Line::from(""),
        Line::from(Span::raw(format!("stream: {}", ui.stream_url))),
        Line::from(Span::styled(
            format!(
                "annotations: {}",
                if session.selection.boxes_visible { "on" } else { "off" }
            ),
            palette.hint_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "press b to toggle boxes, Enter on a catalog row for history",
            palette.hint_style(),
        )),
    ];
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_historical(
    f: &mut Frame,
    area: Rect,
    session: &Session,
    viewport: &Viewport,
    palette: ThemePalette,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    let selection = &session.selection;
    let entity = selection
        .active
        .as_deref()
        .and_then(|name| session.catalog.entity(name));

    let Some(entity) = entity else {
        // Reconciler guarantees this view only shows surviving entities; an
        // empty pane here means a draw raced a just-applied fallback.
        f.render_widget(
            Paragraph::new("entity no longer in catalog")
                .block(Block::default().borders(Borders::ALL)),
            chunks[0],
        );
        return;
    };
    let frame = &entity.history[selection.cursor.min(entity.last_index())];

    let block = Block::default()
        .title(Span::styled(entity.name.clone(), palette.title()))
        .borders(Borders::ALL)
        .border_style(palette.border_focus_style());
    let image_area = block.inner(chunks[0]);
    f.render_widget(block, chunks[0]);

    let meta = vec![
        Line::from(Span::raw(format!("frame: {}", frame.image))),
        Line::from(Span::styled(
            format!("captured {} | {}", frame.date, frame.time),
            palette.hint_style(),
        )),
    ];
    f.render_widget(Paragraph::new(meta), image_area);

    if let Some(overlay) = viewport.overlay() {
        draw_region(f, image_area, overlay, palette);
    }

    draw_timeline(f, chunks[1], entity, selection.cursor, palette);
}

/// Schematic bounding region: the percent-unit box scaled into the image
/// area, labeled with the entity name (and confidence when known).
fn draw_region(f: &mut Frame, area: Rect, overlay: &Overlay, palette: ThemePalette) {
    let region = overlay.region;
    let x = area.x + scale(region.x, area.width);
    let y = area.y + scale(region.y, area.height);
    let w = scale(region.w, area.width).max(2);
    let h = scale(region.h, area.height).max(2);

    let rect = Rect {
        x: x.min(area.right().saturating_sub(2)),
        y: y.min(area.bottom().saturating_sub(2)),
        width: w.min(area.right().saturating_sub(x).max(2)),
        height: h.min(area.bottom().saturating_sub(y).max(2)),
    };

    let box_widget = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border_focus_style());
    f.render_widget(Clear, rect);
    f.render_widget(box_widget, rect);

    let caption = overlay.caption();
    let label_rect = Rect {
        x: rect.x,
        y: rect.y,
        width: (caption.len() as u16).min(rect.width),
        height: 1,
    };
    f.render_widget(
        Paragraph::new(Span::styled(caption, palette.box_label())),
        label_rect,
    );
}

fn scale(percent: f64, span: u16) -> u16 {
    ((percent / 100.0) * f64::from(span)).round() as u16
}

fn draw_timeline(f: &mut Frame, area: Rect, entity: &Entity, cursor: usize, palette: ThemePalette) {
    let cursor = cursor.min(entity.last_index());
    let frame = &entity.history[cursor];
    let at_latest = cursor == entity.last_index();

    let label = if at_latest {
        "LATEST".to_string()
    } else {
        format!("{} | {}", frame.date, frame.time)
    };

    // Scrubber track: one cell per frame, cursor highlighted.
    let mut spans: Vec<Span> = Vec::with_capacity(entity.history.len() + 2);
    for i in 0..entity.history.len() {
        if i == cursor {
            spans.push(Span::styled("█", Style::default().fg(palette.accent)));
        } else {
            spans.push(Span::styled("─", palette.hint_style()));
        }
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("{}/{}  {}", cursor + 1, entity.history.len(), label),
        if at_latest {
            palette.title()
        } else {
            Style::default().fg(palette.fg)
        },
    ));

    let block = Block::default()
        .title(Span::styled("timeline", palette.hint_style()))
        .borders(Borders::ALL)
        .border_style(palette.border_style());
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_help_overlay(f: &mut Frame, palette: ThemePalette) {
    let area = centered_rect(60, 60, f.area());
    let lines = vec![
        Line::from(Span::styled("Keys", palette.title())),
        Line::from("  ↑/↓        move catalog cursor"),
        Line::from("  Enter      open entity history (lands on latest, pinned)"),
        Line::from("  l          back to live feed"),
        Line::from("  L          jump to most recently active entity"),
        Line::from("  ←/→        scrub through history; Home/End jump"),
        Line::from("  b          toggle live-feed boxes (history always shows them)"),
        Line::from("  /, d, t    name / date / time filters; Del clears"),
        Line::from("  r          reset server + local state"),
        Line::from("  q / Esc    quit"),
        Line::from(""),
        Line::from(Span::styled(
            "The catalog refreshes every few seconds; a pinned cursor follows new frames.",
            palette.hint_style(),
        )),
    ];
    let block = Block::default()
        .title(Span::styled("help", palette.title()))
        .borders(Borders::ALL)
        .border_style(palette.border_focus_style());
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1]);

    horizontal[1]
}

fn http_timeout() -> Duration {
    Config::from_env().http_timeout
}
