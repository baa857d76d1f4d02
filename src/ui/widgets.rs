//! Custom TUI widgets

use super::theme::ThemeColors;
use crate::report::CommitRecord;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// The text field keys type into
pub struct TextPanel<'a> {
    text: &'a str,
    focused: bool,
    colors: ThemeColors,
}

impl<'a> TextPanel<'a> {
    pub fn new(text: &'a str, focused: bool, colors: ThemeColors) -> Self {
        Self {
            text,
            focused,
            colors,
        }
    }
}

impl<'a> Widget for TextPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (title, border) = if self.focused {
            (" Text (focused) ", self.colors.focus)
        } else {
            (" Text (not focused) ", self.colors.dim)
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 {
            return;
        }

        let style = Style::default().fg(self.colors.fg);
        let width = inner.width as usize;
        let bottom = inner.y + inner.height;
        let mut y = inner.y;
        let mut last_len = 0;
        // Newlines start a new row; long rows wrap at the panel edge
        for line in self.text.split('\n') {
            let chars: Vec<char> = line.chars().collect();
            let mut rows: Vec<String> = chars.chunks(width).map(|c| c.iter().collect()).collect();
            if rows.is_empty() {
                rows.push(String::new());
            }
            for row in rows {
                if y >= bottom {
                    return;
                }
                buf.set_string(inner.x, y, &row, style);
                last_len = row.chars().count();
                y += 1;
            }
        }

        if self.focused {
            let (cursor_x, cursor_y) = if last_len < width {
                (inner.x + last_len as u16, y - 1)
            } else {
                (inner.x, y)
            };
            if cursor_y < bottom {
                buf.set_string(
                    cursor_x,
                    cursor_y,
                    "_",
                    Style::default()
                        .fg(self.colors.focus)
                        .add_modifier(Modifier::SLOW_BLINK),
                );
            }
        }
    }
}

/// Most recent commits, newest first
pub struct CommitLog<'a> {
    commits: &'a [CommitRecord],
    colors: ThemeColors,
}

impl<'a> CommitLog<'a> {
    pub fn new(commits: &'a [CommitRecord], colors: ThemeColors) -> Self {
        Self { commits, colors }
    }
}

impl<'a> Widget for CommitLog<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Commits ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.colors.dim));

        let inner = block.inner(area);
        block.render(area, buf);

        for (y, commit) in (inner.y..inner.y + inner.height).zip(self.commits.iter().rev()) {
            let (symbol, color) = if commit.inserted {
                ("[OK]", self.colors.inserted)
            } else {
                ("[--]", self.colors.dropped)
            };
            let line = Line::from(vec![
                Span::styled(format!("{} ", symbol), Style::default().fg(color)),
                Span::styled(
                    format!("{:?}", commit.text),
                    Style::default().fg(self.colors.fg).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" key {}", commit.button),
                    Style::default().fg(self.colors.dim),
                ),
            ]);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }
}

/// Widget for the help screen
pub struct HelpPanel {
    colors: ThemeColors,
}

impl HelpPanel {
    pub fn new(colors: ThemeColors) -> Self {
        Self { colors }
    }
}

impl Widget for HelpPanel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.colors.focus));

        let inner = block.inner(area);
        block.render(area, buf);

        let help_text = [
            " MOUSE",
            " -----------",
            " Click            : Type the key",
            " Drag down        : Type the small alternate",
            " Hold, then drag  : Pick an option",
            "",
            " CONTROLS",
            " -----------",
            " f  : Toggle text focus",
            " c  : Clear text",
            " n  : Toggle narrow options",
            " p  : Toggle trackpad mode",
            " t  : Toggle theme",
            " e  : Export report to JSON",
            " Esc: Cancel the active touch",
            " ?  : Show/hide this help",
            " q  : Quit",
        ];

        for (i, line) in help_text.iter().enumerate() {
            if i as u16 >= inner.height {
                break;
            }
            let style = if line.contains("---") {
                Style::default().fg(self.colors.dim)
            } else if line.chars().nth(1).is_some_and(char::is_uppercase) {
                Style::default()
                    .fg(self.colors.notice)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.colors.fg)
            };
            buf.set_string(inner.x, inner.y + i as u16, line, style);
        }
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    state: &'a str,
    gesture: &'a str,
    elapsed: &'a str,
    commits: usize,
    message: Option<&'a str>,
    colors: ThemeColors,
}

impl<'a> StatusBar<'a> {
    pub fn new(
        state: &'a str,
        gesture: &'a str,
        elapsed: &'a str,
        commits: usize,
        colors: ThemeColors,
    ) -> Self {
        Self {
            state,
            gesture,
            elapsed,
            commits,
            message: None,
            colors,
        }
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Background
        let bg_style = Style::default().bg(self.colors.bar).fg(self.colors.fg);
        for x in area.x..area.x + area.width {
            buf.set_string(x, area.y, " ", bg_style);
        }

        // Left side: app state and gesture state
        let left = format!(" {} | {} ", self.state, self.gesture);
        buf.set_string(area.x, area.y, &left, bg_style.add_modifier(Modifier::BOLD));

        // Center: message if any
        if let Some(msg) = self.message {
            let msg_style = bg_style.fg(self.colors.notice);
            let msg_len = msg.chars().count() as u16;
            let msg_x = area.x + (area.width / 2).saturating_sub(msg_len / 2);
            buf.set_string(msg_x, area.y, msg, msg_style);
        }

        // Right side: elapsed time and commits
        let right = format!(" {} | Commits: {} ", self.elapsed, self.commits);
        let right_x = area.x + area.width.saturating_sub(right.len() as u16);
        buf.set_string(right_x, area.y, &right, bg_style);
    }
}
