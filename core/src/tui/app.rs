use super::input::{handle_key_event, InputAction};
use super::panes::{ConsolePane, ProjectsPane};
use crate::config::GlobalConfig;
use crate::scheduler::{BuildScheduler, RunReport};
use crate::selection::SelectionState;
use crate::sink::{LogEntry, LogLevel, SharedSink};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{ListState, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const MAX_LOG_LINES: usize = 10_000;

pub struct App {
    selection: SelectionState,
    list_state: ListState,
    scheduler: BuildScheduler,
    policy: GlobalConfig,
    sink: SharedSink,
    log_rx: mpsc::UnboundedReceiver<LogEntry>,
    log_entries: Vec<LogEntry>,
    running: Option<JoinHandle<RunReport>>,
    should_quit: bool,
}

impl App {
    pub fn new(
        selection: SelectionState,
        scheduler: BuildScheduler,
        policy: GlobalConfig,
        sink: SharedSink,
        log_rx: mpsc::UnboundedReceiver<LogEntry>,
    ) -> Self {
        let mut list_state = ListState::default();
        if !selection.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            selection,
            list_state,
            scheduler,
            policy,
            sink,
            log_rx,
            log_entries: Vec::new(),
            running: None,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        terminal.clear()?;

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut last_render = Instant::now() - Duration::from_secs(1);
        let render_throttle = Duration::from_millis(100);

        while !self.should_quit {
            self.process_log_updates();
            self.reap_finished_build().await;

            if last_render.elapsed() >= render_throttle {
                terminal.draw(|f| self.render(f))?;
                last_render = Instant::now();
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_action(handle_key_event(key));
                }
            } else {
                tokio::task::yield_now().await;
            }
        }

        Ok(())
    }

    pub fn handle_action(&mut self, action: InputAction) {
        match action {
            InputAction::Quit => self.should_quit = true,
            InputAction::Toggle => {
                if let Some(index) = self.list_state.selected() {
                    self.selection.toggle(index);
                }
            }
            InputAction::SelectAll => self.selection.select_all(),
            InputAction::DeselectAll => self.selection.deselect_all(),
            InputAction::Up => self.move_cursor(-1),
            InputAction::Down => self.move_cursor(1),
            InputAction::Build => self.start_build(),
            InputAction::None => {}
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.selection.len();
        if len == 0 {
            return;
        }

        let current = self.list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.list_state.select(Some(next));
    }

    fn start_build(&mut self) {
        if self.running.is_some() {
            self.sink.warn("A build is already running");
            return;
        }

        let selected = self.selection.selected();
        if !selected.is_empty() {
            self.log_entries.clear();
            self.sink.emit(LogLevel::Success, "Starting build...");
        }

        self.running = self.scheduler.start(selected, self.policy.clone());
    }

    async fn reap_finished_build(&mut self) {
        let finished = self
            .running
            .as_ref()
            .map(|handle| handle.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(handle) = self.running.take() {
            match handle.await {
                Ok(_) => self.sink.emit(LogLevel::Warning, "Press Ctrl+C to quit"),
                Err(err) => self.sink.error(&format!("Build run aborted: {}", err)),
            }
        }
    }

    fn process_log_updates(&mut self) {
        while let Ok(entry) = self.log_rx.try_recv() {
            if self.log_entries.len() >= MAX_LOG_LINES {
                self.log_entries.remove(0);
            }
            self.log_entries.push(entry);
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn cursor(&self) -> Option<usize> {
        self.list_state.selected()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn is_building(&self) -> bool {
        self.running.is_some()
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.size());

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)])
            .split(chunks[0]);

        ProjectsPane::new(&self.selection).render(frame, panes[0], &mut self.list_state);
        ConsolePane::new(&self.log_entries).render(frame, panes[1]);
        self.render_footer(frame, chunks[1]);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let key = Style::default().fg(Color::Yellow);
        let spans = [
            ("Space", "Select"),
            ("Enter", "Build"),
            ("Ctrl+A", "Select all"),
            ("Ctrl+D", "Clear"),
            ("Ctrl+C", "Quit"),
        ]
        .iter()
        .flat_map(|(k, label)| {
            vec![
                Span::styled(*k, key),
                Span::raw(format!(":{}  ", label)),
            ]
        })
        .collect::<Vec<_>>();

        let mut line = spans;
        if self.running.is_some() {
            line.push(Span::styled("building...", Style::default().fg(Color::Green)));
        }

        let footer = Paragraph::new(Line::from(line)).alignment(Alignment::Center);
        frame.render_widget(footer, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ProjectBuilder;
    use crate::config::ProjectConfig;
    use crate::runner::CommandRunner;
    use crate::scheduler::NO_SELECTION_WARNING;
    use crate::sink::ChannelSink;
    use std::sync::Arc;

    fn app() -> App {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink: SharedSink = Arc::new(ChannelSink::new(tx));
        let runner = Arc::new(CommandRunner::new(sink.clone(), Duration::from_secs(600)));
        let scheduler = BuildScheduler::new(ProjectBuilder::new(runner, sink.clone()));
        let selection = SelectionState::new(&[
            ProjectConfig::new("api", "."),
            ProjectConfig::new("old", ".").disabled(),
            ProjectConfig::new("web", "."),
        ]);
        App::new(selection, scheduler, GlobalConfig::default(), sink, rx)
    }

    #[test]
    fn test_cursor_moves_within_bounds() {
        let mut app = app();
        assert_eq!(app.cursor(), Some(0));

        app.handle_action(InputAction::Up);
        assert_eq!(app.cursor(), Some(0));

        app.handle_action(InputAction::Down);
        app.handle_action(InputAction::Down);
        assert_eq!(app.cursor(), Some(1));
    }

    #[test]
    fn test_toggle_selects_project_under_cursor() {
        let mut app = app();
        app.handle_action(InputAction::Down);
        app.handle_action(InputAction::Toggle);

        assert!(app.selection().is_selected("web"));
        assert!(!app.selection().is_selected("api"));
    }

    #[test]
    fn test_select_and_deselect_all() {
        let mut app = app();
        app.handle_action(InputAction::SelectAll);
        assert_eq!(app.selection().selected().len(), 2);

        app.handle_action(InputAction::DeselectAll);
        assert!(app.selection().selected().is_empty());
    }

    #[test]
    fn test_build_without_selection_only_warns() {
        let mut app = app();
        app.handle_action(InputAction::Build);
        app.process_log_updates();

        assert!(!app.is_building());
        assert_eq!(app.log_entries.len(), 1);
        assert_eq!(app.log_entries[0].message, NO_SELECTION_WARNING);
    }

    #[test]
    fn test_quit() {
        let mut app = app();
        app.handle_action(InputAction::Quit);
        assert!(app.should_quit());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_streams_output_and_summary() {
        let mut app = app();
        app.handle_action(InputAction::SelectAll);
        app.handle_action(InputAction::Build);
        assert!(app.is_building());

        let deadline = Instant::now() + Duration::from_secs(10);
        while app.is_building() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
            app.reap_finished_build().await;
        }
        app.process_log_updates();

        let messages: Vec<&str> = app.log_entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages[0], "Starting build...");
        assert!(messages.contains(&"2 succeeded, 0 failed"));
        assert_eq!(messages.last(), Some(&"Press Ctrl+C to quit"));
    }
}
