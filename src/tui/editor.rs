//! Multi-line text buffer behind the subtitle editors.
//!
//! Columns count chars, not bytes, so cursor movement stays on character
//! boundaries for Arabic text as well.

#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
    dirty: bool,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
            dirty: false,
        }
    }
}

fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map_or(line.len(), |(i, _)| i)
}

impl TextBuffer {
    /// Replace the whole buffer and move the cursor to the top.
    pub fn set_text(&mut self, text: &str) {
        self.lines = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();
        self.row = 0;
        self.col = 0;
        self.dirty = false;
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    /// True once the user changed the text since it was last set or saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let line = &mut self.lines[self.row];
        let at = byte_index(line, self.col);
        line.insert(at, c);
        self.col += 1;
        self.dirty = true;
    }

    pub fn newline(&mut self) {
        let line = &mut self.lines[self.row];
        let at = byte_index(line, self.col);
        let rest = line.split_off(at);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
        self.dirty = true;
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            let line = &mut self.lines[self.row];
            let at = byte_index(line, self.col - 1);
            line.remove(at);
            self.col -= 1;
            self.dirty = true;
        } else if self.row > 0 {
            let tail = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&tail);
            self.dirty = true;
        }
    }

    pub fn delete(&mut self) {
        if self.col < self.line_len(self.row) {
            let line = &mut self.lines[self.row];
            let at = byte_index(line, self.col);
            line.remove(at);
            self.dirty = true;
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
            self.dirty = true;
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self, n: usize) {
        self.row = self.row.saturating_sub(n);
        self.col = self.col.min(self.line_len(self.row));
    }

    pub fn move_down(&mut self, n: usize) {
        self.row = (self.row + n).min(self.lines.len() - 1);
        self.col = self.col.min(self.line_len(self.row));
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = self.line_len(self.row);
    }

    /// First visible line so the cursor stays inside a view of `height` lines.
    pub fn scroll_offset(&self, height: usize) -> usize {
        self.row.saturating_sub(height.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRT: &str = "1\n00:00:01,000 --> 00:00:02,000\nHallo\n";

    #[test]
    fn set_text_keeps_trailing_newline() {
        let mut buf = TextBuffer::default();
        assert!(buf.is_empty());
        buf.set_text(SRT);
        assert_eq!(buf.lines().len(), 4);
        assert_eq!(buf.text(), SRT);
        assert!(!buf.is_dirty());
    }

    #[test]
    fn crlf_input_is_normalised() {
        let mut buf = TextBuffer::default();
        buf.set_text("a\r\nb");
        assert_eq!(buf.text(), "a\nb");
    }

    #[test]
    fn editing_multibyte_text_stays_on_char_boundaries() {
        let mut buf = TextBuffer::default();
        buf.set_text("مرحبا");
        buf.move_end();
        buf.backspace();
        assert_eq!(buf.text(), "مرحب");
        buf.move_home();
        buf.move_right();
        buf.insert_char('x');
        assert_eq!(buf.text(), "مxرحب");
        assert_eq!(buf.cursor(), (0, 2));
        assert!(buf.is_dirty());
    }

    #[test]
    fn newline_and_backspace_split_and_join_lines() {
        let mut buf = TextBuffer::default();
        buf.set_text("Hallo Welt");
        for _ in 0..5 {
            buf.move_right();
        }
        buf.newline();
        assert_eq!(buf.text(), "Hallo\n Welt");
        assert_eq!(buf.cursor(), (1, 0));
        buf.backspace();
        assert_eq!(buf.text(), "Hallo Welt");
        assert_eq!(buf.cursor(), (0, 5));
        buf.move_end();
        buf.delete();
        assert_eq!(buf.text(), "Hallo Welt");
    }

    #[test]
    fn vertical_moves_clamp_column_and_scroll_follows_cursor() {
        let mut buf = TextBuffer::default();
        buf.set_text("long line\nx\nanother");
        buf.move_end();
        buf.move_down(1);
        assert_eq!(buf.cursor(), (1, 1));
        buf.move_down(10);
        assert_eq!(buf.cursor(), (2, 1));
        assert_eq!(buf.scroll_offset(2), 1);
        assert_eq!(buf.scroll_offset(10), 0);
        buf.move_up(5);
        assert_eq!(buf.cursor(), (0, 1));
    }
}
