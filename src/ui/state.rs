//! Presentation-only state: focus, the composer line editor and scrolling.

use std::time::Instant;

use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Composer,
    Sidebar,
}

#[derive(Debug)]
pub struct UiState {
    pub focus: Focus,
    pub sidebar_index: usize,
    input: String,
    /// Byte offset into `input`, always on a char boundary.
    cursor: usize,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    /// Largest useful scroll offset, as measured by the last draw.
    pub max_scroll: u16,
    pub pulse_start: Instant,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            focus: Focus::Composer,
            sidebar_index: 0,
            input: String::new(),
            cursor: 0,
            scroll_offset: 0,
            auto_scroll: true,
            max_scroll: 0,
            pulse_start: Instant::now(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.cursor = self.input.len();
    }

    pub fn take_input(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.input)
    }

    /// Display column of the cursor.
    pub fn cursor_column(&self) -> usize {
        self.input[..self.cursor].width()
    }

    pub fn insert_char(&mut self, ch: char) {
        self.input.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.input.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.input.replace_range(self.cursor..next, "");
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.cursor = next;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.input.len();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.input[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(index, _)| index)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.input[self.cursor..]
            .chars()
            .next()
            .map(|ch| self.cursor + ch.len_utf8())
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Composer => Focus::Sidebar,
            Focus::Sidebar => Focus::Composer,
        };
    }

    pub fn move_selection_up(&mut self) {
        self.sidebar_index = self.sidebar_index.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self, len: usize) {
        if self.sidebar_index + 1 < len {
            self.sidebar_index += 1;
        }
    }

    /// Keeps the sidebar cursor inside a list that may have shrunk.
    pub fn clamp_selection(&mut self, len: usize) {
        self.sidebar_index = self.sidebar_index.min(len.saturating_sub(1));
    }

    pub fn scroll_up(&mut self, lines: u16) {
        if self.auto_scroll {
            self.scroll_offset = self.max_scroll;
            self.auto_scroll = false;
        }
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        if self.auto_scroll {
            return;
        }
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(self.max_scroll);
        if self.scroll_offset >= self.max_scroll {
            self.auto_scroll = true;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.auto_scroll = true;
    }
}
