use crate::config::ProjectConfig;
use crate::selection::SelectionState;
use ratatui::layout::Alignment;
use ratatui::widgets::block::Title;
use ratatui::widgets::BorderType;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

pub struct ProjectsPane<'a> {
    selection: &'a SelectionState,
}

impl<'a> ProjectsPane<'a> {
    pub fn new(selection: &'a SelectionState) -> Self {
        Self { selection }
    }

    pub fn label(project: &ProjectConfig, selected: bool) -> String {
        let mark = if selected { "[X]" } else { "[ ]" };
        if project.kind.is_empty() {
            format!("{} {}", mark, project.name)
        } else {
            format!("{} {} ({})", mark, project.name, project.kind)
        }
    }

    fn item(&self, project: &ProjectConfig) -> ListItem<'static> {
        let selected = self.selection.is_selected(&project.name);
        let style = if selected {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };

        ListItem::new(Text::from(vec![
            Line::from(Span::styled(Self::label(project, selected), style)),
            Line::from(Span::styled(
                format!("    {}", project.path),
                Style::default().fg(Color::DarkGray),
            )),
        ]))
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, state: &mut ListState) {
        let items: Vec<ListItem> = self
            .selection
            .projects()
            .iter()
            .map(|project| self.item(project))
            .collect();

        let title = format!(
            " Projects ({}/{}) ",
            self.selection.selected_names().len(),
            self.selection.len()
        );

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(Title::from(title).alignment(Alignment::Left)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, area, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        let project = ProjectConfig::new("api", "./api").with_kind("go");
        assert_eq!(ProjectsPane::label(&project, false), "[ ] api (go)");
        assert_eq!(ProjectsPane::label(&project, true), "[X] api (go)");

        let untyped = ProjectConfig::new("web", "./web");
        assert_eq!(ProjectsPane::label(&untyped, true), "[X] web");
    }
}
