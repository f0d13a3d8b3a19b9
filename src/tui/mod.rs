mod clipboard;
mod editor;
mod help;
mod state;

use crate::cli::{self, Cli};
use crate::model::{Notice, NoticeLevel, Step, StepStatus, SubtitleLang, SyncEvent};
use crate::orchestrator::{self, Controller, UiCommand};
use crate::text_output;
use crate::timecode::{cut_duration, format_clock, format_file_size};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use state::{InputField, UiState, TAB_ARABIC, TAB_COUNT, TAB_GERMAN, TAB_HELP, TAB_PREVIEW, TAB_PROCESS};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const PAGE: usize = 10;

pub async fn run(args: Cli) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SyncEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let controller = Controller::new(cli::build_config(&args), event_tx)?;

    let mut state = UiState {
        video_file: controller.selected_video(),
        ..Default::default()
    };
    if let Some(url) = &args.url {
        state.url = url.clone();
    }
    if let Some(start) = &args.start {
        state.start = start.clone();
    }
    if let Some(end) = &args.end {
        state.end = end.clone();
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(state, event_rx, cmd_tx));

    let res = orchestrator::run_controller(controller, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut state: UiState,
    mut event_rx: UnboundedReceiver<SyncEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(&mut state, k, &cmd_tx) {
                    break Ok(());
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn tab_for(lang: SubtitleLang) -> usize {
    match lang {
        SubtitleLang::German => TAB_GERMAN,
        SubtitleLang::Arabic => TAB_ARABIC,
    }
}

/// Move to the next (or previous) tab and pull fresh data for it. Editors
/// re-read their file unless they hold unsaved edits; Preview refreshes the
/// file list.
fn switch_tab(state: &mut UiState, forward: bool, cmd_tx: &UnboundedSender<UiCommand>) {
    let tab = if forward {
        (state.tab + 1) % TAB_COUNT
    } else {
        (state.tab + TAB_COUNT - 1) % TAB_COUNT
    };
    state.tab = tab;
    let cmd = match state.editor_tab() {
        Some(lang) if state.editor(lang).buffer.is_dirty() => None,
        Some(lang) => Some(UiCommand::ReloadFile(lang)),
        None if tab == TAB_PREVIEW => Some(UiCommand::RefreshFiles),
        None => None,
    };
    if let Some(cmd) = cmd {
        let _ = cmd_tx.send(cmd);
    }
}

/// Returns `true` when the UI should quit.
fn handle_key(state: &mut UiState, k: KeyEvent, cmd_tx: &UnboundedSender<UiCommand>) -> bool {
    let send = |cmd: UiCommand| {
        let _ = cmd_tx.send(cmd);
    };
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl && k.code == KeyCode::Char('c') {
        send(UiCommand::Quit);
        return true;
    }

    if state.confirm_clear {
        state.confirm_clear = false;
        if matches!(k.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            send(UiCommand::ClearFiles);
        } else {
            state.show_notice(Notice {
                level: NoticeLevel::Info,
                message: "Clear cancelled".into(),
            });
        }
        return false;
    }

    if let Some(field) = state.editing_input {
        match k.code {
            KeyCode::Tab => state.editing_input = Some(field.next()),
            KeyCode::Enter | KeyCode::Esc => state.editing_input = None,
            KeyCode::Backspace => {
                state.input_mut(field).pop();
            }
            KeyCode::Char(c) if !ctrl => state.input_mut(field).push(c),
            _ => {}
        }
        return false;
    }

    if let Some(input) = state.video_input.as_mut() {
        match k.code {
            KeyCode::Enter => {
                let name = std::mem::take(input);
                state.video_input = None;
                send(UiCommand::SelectVideo(name));
            }
            KeyCode::Esc => state.video_input = None,
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) if !ctrl => input.push(c),
            _ => {}
        }
        return false;
    }

    if let Some(lang) = state.editor_tab() {
        handle_editor_key(state, lang, k, cmd_tx);
        return false;
    }

    match (k.modifiers, k.code) {
        (_, KeyCode::Char('q')) => {
            send(UiCommand::Quit);
            return true;
        }
        (_, KeyCode::Tab) => switch_tab(state, true, cmd_tx),
        (_, KeyCode::BackTab) => switch_tab(state, false, cmd_tx),
        (_, KeyCode::Char('?')) => state.tab = TAB_HELP,
        _ => match state.tab {
            TAB_PROCESS => handle_process_key(state, k, cmd_tx),
            TAB_PREVIEW => handle_preview_key(state, k, cmd_tx),
            _ => {}
        },
    }
    false
}

fn handle_process_key(state: &mut UiState, k: KeyEvent, cmd_tx: &UnboundedSender<UiCommand>) {
    let send = |cmd: UiCommand| {
        let _ = cmd_tx.send(cmd);
    };
    match k.code {
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected_step = state.selected_step.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.selected_step = (state.selected_step + 1).min(Step::ALL.len() - 1);
        }
        KeyCode::Enter => {
            let step = state.selected();
            match step.editor_lang() {
                // Edit steps happen in the editor tab, not on the backend.
                Some(lang) => {
                    state.tab = tab_for(lang);
                    if state.editor(lang).buffer.is_empty() {
                        send(UiCommand::LoadFile(lang));
                    }
                }
                None => send(UiCommand::RunStep(step, state.inputs())),
            }
        }
        KeyCode::Char('a') => send(UiCommand::RunAll(state.inputs())),
        KeyCode::Char('i') => state.editing_input = Some(InputField::Url),
        KeyCode::Char('R') => send(UiCommand::RefreshAll),
        KeyCode::Char('L') => send(UiCommand::FetchLogs),
        KeyCode::Char('c') => state.clear_logs(),
        KeyCode::Char('x') => state.confirm_clear = true,
        _ => {}
    }
}

fn handle_editor_key(
    state: &mut UiState,
    lang: SubtitleLang,
    k: KeyEvent,
    cmd_tx: &UnboundedSender<UiCommand>,
) {
    let send = |cmd: UiCommand| {
        let _ = cmd_tx.send(cmd);
    };
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
    let inputs = state.inputs();
    let buffer = &mut state.editor_mut(lang).buffer;

    match k.code {
        KeyCode::Char('s') if ctrl => {
            send(UiCommand::SaveFile(lang, buffer.text()));
            buffer.mark_clean();
        }
        KeyCode::Char('l') if ctrl => send(UiCommand::LoadFile(lang)),
        KeyCode::Char('r') if ctrl => send(UiCommand::ReloadFile(lang)),
        KeyCode::Char('p') if ctrl => {
            send(UiCommand::Proceed(lang, buffer.text(), inputs));
            buffer.mark_clean();
        }
        KeyCode::Char(c) if !ctrl => buffer.insert_char(c),
        KeyCode::Enter => buffer.newline(),
        KeyCode::Backspace => buffer.backspace(),
        KeyCode::Delete => buffer.delete(),
        KeyCode::Left => buffer.move_left(),
        KeyCode::Right => buffer.move_right(),
        KeyCode::Up => buffer.move_up(1),
        KeyCode::Down => buffer.move_down(1),
        KeyCode::PageUp => buffer.move_up(PAGE),
        KeyCode::PageDown => buffer.move_down(PAGE),
        KeyCode::Home => buffer.move_home(),
        KeyCode::End => buffer.move_end(),
        KeyCode::Tab => switch_tab(state, true, cmd_tx),
        KeyCode::BackTab => switch_tab(state, false, cmd_tx),
        KeyCode::Esc => state.tab = TAB_PROCESS,
        _ => {}
    }
}

fn handle_preview_key(state: &mut UiState, k: KeyEvent, cmd_tx: &UnboundedSender<UiCommand>) {
    let send = |cmd: UiCommand| {
        let _ = cmd_tx.send(cmd);
    };
    match k.code {
        KeyCode::Char('r') => send(UiCommand::RefreshFiles),
        KeyCode::Char('d') => send(UiCommand::DownloadVideo),
        KeyCode::Char('v') => state.video_input = Some(state.video_file.clone()),
        KeyCode::Char('y') => {
            let notice = match state.preview_url.clone() {
                Some(url) => match clipboard::copy_to_clipboard(&url) {
                    Ok(()) => Notice {
                        level: NoticeLevel::Success,
                        message: format!("Copied to clipboard: {url}"),
                    },
                    Err(e) => Notice {
                        level: NoticeLevel::Error,
                        message: format!("Clipboard copy failed: {e:#}"),
                    },
                },
                None => Notice {
                    level: NoticeLevel::Warning,
                    message: "No video available yet".into(),
                },
            };
            state.show_notice(notice);
        }
        _ => {}
    }
}

fn status_style(status: StepStatus) -> Style {
    match status {
        StepStatus::Success => Style::default().fg(Color::Green),
        StepStatus::Error => Style::default().fg(Color::Red),
        StepStatus::Processing => Style::default().fg(Color::Yellow),
        StepStatus::Pending => Style::default().fg(Color::Gray),
    }
}

fn notice_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Info => Color::Cyan,
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Warning => Color::Yellow,
        NoticeLevel::Error => Color::Red,
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let editor_title = |lang: SubtitleLang| {
        if state.editor(lang).buffer.is_dirty() {
            format!("{}*", lang.label())
        } else {
            lang.label().to_string()
        }
    };
    let tabs = Tabs::new(vec![
        Line::from("Process"),
        Line::from(editor_title(SubtitleLang::German)),
        Line::from(editor_title(SubtitleLang::Arabic)),
        Line::from("Preview"),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(Block::default().borders(Borders::ALL).title("karaoke-dash"))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        TAB_PROCESS => draw_process(chunks[1], f, state),
        TAB_GERMAN => draw_editor(chunks[1], f, state, SubtitleLang::German),
        TAB_ARABIC => draw_editor(chunks[1], f, state, SubtitleLang::Arabic),
        TAB_PREVIEW => draw_preview(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }

    draw_status_line(chunks[2], f, state);
}

fn draw_status_line(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut spans = Vec::new();
    if state.busy {
        spans.push(Span::styled(
            "⏳ Processing… ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }
    if state.confirm_clear {
        spans.push(Span::styled(
            "Delete all generated files? (y/n)",
            Style::default().fg(Color::Yellow),
        ));
    } else if let Some(shown) = state.visible_notice(Instant::now()) {
        spans.push(Span::styled(
            format!("[{}] {}", shown.stamp, shown.notice.to_message()),
            Style::default().fg(notice_color(shown.notice.level)),
        ));
    } else if !state.busy {
        spans.push(Span::styled(
            "tab: switch  ?: help  q: quit",
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_process(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(6)].as_ref())
        .split(cols[0]);

    let steps: Vec<Line> = Step::ALL
        .iter()
        .map(|&step| {
            let status = state.statuses[step.index()];
            let mut name = step.to_string();
            if step.is_manual_edit() {
                name.push_str(" (edit)");
            }
            let name_style = if step.index() == state.selected_step {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!(" {} ", status.glyph()), status_style(status)),
                Span::styled(name, name_style),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(steps).block(Block::default().borders(Borders::ALL).title("Steps")),
        left[0],
    );

    let field_line = |field: InputField, value: &str| {
        let editing = state.editing_input == Some(field);
        let value_style = if editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!("{}: ", field.label()), Style::default().fg(Color::Gray)),
            Span::styled(
                if editing {
                    format!("{value}▏")
                } else {
                    value.to_string()
                },
                value_style,
            ),
        ])
    };
    let mut inputs = vec![
        field_line(InputField::Url, &state.url),
        field_line(InputField::Start, &state.start),
        field_line(InputField::End, &state.end),
    ];
    inputs.push(match cut_duration(&state.start, &state.end) {
        Some(secs) => Line::from(Span::styled(
            format!("Segment length: {}", format_clock(secs)),
            Style::default().fg(Color::Gray),
        )),
        None => Line::from(Span::styled(
            "Invalid time range",
            Style::default().fg(Color::Red),
        )),
    });
    f.render_widget(
        Paragraph::new(inputs).block(Block::default().borders(Borders::ALL).title("Inputs (i)")),
        left[1],
    );

    let height = cols[1].height.saturating_sub(2) as usize;
    let skip = state.logs.len().saturating_sub(height);
    let log_lines: Vec<Line> = state.logs[skip..]
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    f.render_widget(
        Paragraph::new(log_lines).block(Block::default().borders(Borders::ALL).title("Log")),
        cols[1],
    );
}

fn draw_editor(area: Rect, f: &mut ratatui::Frame, state: &UiState, lang: SubtitleLang) {
    let editor = state.editor(lang);
    let buffer = &editor.buffer;
    let mut title = format!("{} subtitles", lang.label());
    if let Some(origin) = editor.origin {
        title.push_str(&format!(" ({})", origin.label()));
    }
    if buffer.is_dirty() {
        title.push_str(" [modified]");
    }

    let height = area.height.saturating_sub(2) as usize;
    let offset = buffer.scroll_offset(height);
    let lines: Vec<Line> = buffer
        .lines()
        .iter()
        .skip(offset)
        .take(height)
        .map(|l| Line::from(l.as_str()))
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );

    let (row, col) = buffer.cursor();
    let max_x = area.width.saturating_sub(2);
    let x = area.x + 1 + (col as u16).min(max_x);
    let y = area.y + 1 + (row - offset) as u16;
    f.set_cursor_position((x, y));
}

fn draw_preview(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)].as_ref())
        .split(area);

    let label = Style::default().fg(Color::Gray);
    let mut info = vec![match &state.video_input {
        Some(input) => Line::from(vec![
            Span::styled("Video file: ", label),
            Span::styled(format!("{input}▏"), Style::default().fg(Color::Yellow)),
        ]),
        None => Line::from(vec![
            Span::styled("Video file: ", label),
            Span::raw(state.video_file.clone()),
        ]),
    }];
    info.push(match &state.preview_url {
        Some(url) => Line::from(vec![
            Span::styled("URL: ", label),
            Span::styled(url.clone(), Style::default().fg(Color::Cyan)),
        ]),
        None => Line::from(vec![
            Span::styled("URL: ", label),
            Span::raw("not available yet"),
        ]),
    });
    if let Some((bytes, total)) = state.download {
        let progress = match total {
            Some(t) => format!("{} / {}", format_file_size(bytes), format_file_size(t)),
            None => format_file_size(bytes),
        };
        info.push(Line::from(vec![
            Span::styled("Downloaded: ", label),
            Span::raw(progress),
        ]));
    }
    f.render_widget(
        Paragraph::new(info).block(Block::default().borders(Borders::ALL).title("Video")),
        rows[0],
    );

    let files: Vec<Line> = text_output::files_lines(&state.files)
        .into_iter()
        .map(Line::from)
        .collect();
    f.render_widget(
        Paragraph::new(files).block(Block::default().borders(Borders::ALL).title("Files (r)")),
        rows[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn enter_on_edit_step_opens_editor_and_loads() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        state.selected_step = Step::EditGerman.index();
        assert!(!handle_key(&mut state, press(KeyCode::Enter), &tx));
        assert_eq!(state.tab, TAB_GERMAN);
        assert!(matches!(
            rx.try_recv(),
            Ok(UiCommand::LoadFile(SubtitleLang::German))
        ));
    }

    #[test]
    fn enter_on_automatic_step_runs_it_with_inputs() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        handle_key(&mut state, press(KeyCode::Down), &tx);
        handle_key(&mut state, press(KeyCode::Enter), &tx);
        match rx.try_recv() {
            Ok(UiCommand::RunStep(step, inputs)) => {
                assert_eq!(step, Step::Cut);
                assert_eq!(inputs, state.inputs());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn editor_keys_edit_and_save() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState {
            tab: TAB_ARABIC,
            ..Default::default()
        };
        for c in "سلام".chars() {
            handle_key(&mut state, press(KeyCode::Char(c)), &tx);
        }
        // 'q' types into the editor instead of quitting.
        assert!(!handle_key(&mut state, press(KeyCode::Char('q')), &tx));
        handle_key(&mut state, ctrl('s'), &tx);
        match rx.try_recv() {
            Ok(UiCommand::SaveFile(SubtitleLang::Arabic, text)) => assert_eq!(text, "سلامq"),
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(!state.arabic.buffer.is_dirty());
    }

    #[test]
    fn clear_needs_confirmation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        handle_key(&mut state, press(KeyCode::Char('x')), &tx);
        assert!(state.confirm_clear);
        handle_key(&mut state, press(KeyCode::Char('n')), &tx);
        assert!(rx.try_recv().is_err());

        handle_key(&mut state, press(KeyCode::Char('x')), &tx);
        handle_key(&mut state, press(KeyCode::Char('y')), &tx);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::ClearFiles)));
    }

    #[test]
    fn input_editing_captures_keys_until_enter() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        handle_key(&mut state, press(KeyCode::Char('i')), &tx);
        handle_key(&mut state, press(KeyCode::Tab), &tx);
        for _ in 0..state.start.len() {
            handle_key(&mut state, press(KeyCode::Backspace), &tx);
        }
        for c in "0:10".chars() {
            handle_key(&mut state, press(KeyCode::Char(c)), &tx);
        }
        handle_key(&mut state, press(KeyCode::Enter), &tx);
        assert_eq!(state.start, "0:10");
        assert_eq!(state.editing_input, None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn quit_keys() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        assert!(handle_key(&mut state, press(KeyCode::Char('q')), &tx));
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Quit)));
        state.tab = TAB_GERMAN;
        assert!(handle_key(&mut state, ctrl('c'), &tx));
    }

    #[test]
    fn switching_tabs_refreshes_the_shown_data() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();

        handle_key(&mut state, press(KeyCode::Tab), &tx);
        assert_eq!(state.tab, TAB_GERMAN);
        assert!(matches!(
            rx.try_recv(),
            Ok(UiCommand::ReloadFile(SubtitleLang::German))
        ));

        // Unsaved Arabic edits are not overwritten by a reload.
        state.arabic.buffer.insert_char('x');
        handle_key(&mut state, press(KeyCode::Tab), &tx);
        assert_eq!(state.tab, TAB_ARABIC);
        assert!(rx.try_recv().is_err());

        handle_key(&mut state, press(KeyCode::Tab), &tx);
        assert_eq!(state.tab, TAB_PREVIEW);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::RefreshFiles)));

        handle_key(&mut state, press(KeyCode::BackTab), &tx);
        assert_eq!(state.tab, TAB_ARABIC);
        assert!(rx.try_recv().is_err());

        handle_key(&mut state, press(KeyCode::BackTab), &tx);
        assert_eq!(state.tab, TAB_GERMAN);
        assert!(matches!(
            rx.try_recv(),
            Ok(UiCommand::ReloadFile(SubtitleLang::German))
        ));
    }
}
