use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn keybind(keys: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{keys:<12}"), Style::default().fg(Color::Magenta)),
        Span::raw(action),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        keybind("q / Ctrl-C", "Quit (Ctrl-C only inside editors)"),
        keybind("tab", "Switch tabs (editors reload, Preview refreshes files)"),
        keybind("?", "Show this help"),
        Line::from(""),
        Line::from("Process tab:"),
        keybind("↑/↓ or j/k", "Select step"),
        keybind("enter", "Run selected step (edit steps open their editor)"),
        keybind("a", "Run all automatic steps"),
        keybind("i", "Edit URL / start / end (tab cycles, enter done)"),
        keybind("R", "Refresh status, files and subtitles"),
        keybind("L", "Fetch the backend log"),
        keybind("c", "Clear the log view"),
        keybind("x", "Delete all generated files (asks first)"),
        Line::from(""),
        Line::from("German / Arabic tabs:"),
        keybind("Ctrl-L", "Load file from backend"),
        keybind("Ctrl-S", "Save file to backend"),
        keybind("Ctrl-R", "Reload file from disk"),
        keybind("Ctrl-P", "Save and proceed with the next steps"),
        keybind("esc", "Back to the Process tab"),
        Line::from(""),
        Line::from("Preview tab:"),
        keybind("r", "Refresh the file list"),
        keybind("v", "Select another video file"),
        keybind("y", "Copy video URL to clipboard"),
        keybind("d", "Download the selected video"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
