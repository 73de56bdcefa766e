use crate::sink::{LogEntry, LogLevel};
use once_cell::sync::Lazy;
use ratatui::layout::Alignment;
use ratatui::widgets::block::Title;
use ratatui::widgets::BorderType;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use regex::Regex;

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap());

/// Build output, always scrolled to the most recent line.
pub struct ConsolePane<'a> {
    entries: &'a [LogEntry],
}

impl<'a> ConsolePane<'a> {
    pub fn new(entries: &'a [LogEntry]) -> Self {
        Self { entries }
    }

    fn level_color(level: LogLevel) -> Color {
        match level {
            LogLevel::Debug => Color::DarkGray,
            LogLevel::Output => Color::Reset,
            LogLevel::Command => Color::Yellow,
            LogLevel::Info => Color::Cyan,
            LogLevel::Success => Color::Green,
            LogLevel::Warning => Color::LightYellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        self.entries
            .iter()
            .flat_map(|entry| {
                let style = Style::default().fg(Self::level_color(entry.level));
                entry
                    .display_lines()
                    .into_iter()
                    .map(move |line| Line::styled(strip_ansi(&line).replace('\t', "    "), style))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let lines = self.lines();
        let visible = area.height.saturating_sub(2) as usize;
        let offset = lines.len().saturating_sub(visible).min(u16::MAX as usize) as u16;

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(Title::from(" Build Output ").alignment(Alignment::Left)),
            )
            .scroll((offset, 0));

        frame.render_widget(paragraph, area);
    }
}

pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}
