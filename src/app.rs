use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::action::Action;
use crate::controller::Controller;
use crate::tui::Event;
use crate::types::{IssueFilter, IssueRecord};

/// Terminal front end around the view controller: key mapping, issue
/// selection and the transient status line.
pub struct App {
    pub controller: Controller,
    pub issue_index: usize,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub spinner: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(controller: Controller) -> Self {
        Self {
            controller,
            issue_index: 0,
            notice: None,
            error: None,
            spinner: 0,
            should_quit: false,
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Tick => Action::Tick,
            Event::Key(key) => self.handle_key(key),
            Event::Render => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::Char('h') | KeyCode::Left => Action::PrevPage,
            KeyCode::Char('l') | KeyCode::Right => Action::NextPage,
            KeyCode::Char('a') => Action::SetFilter(IssueFilter::All),
            KeyCode::Char('o') => Action::SetFilter(IssueFilter::Open),
            KeyCode::Char('c') => Action::SetFilter(IssueFilter::Closed),
            KeyCode::Tab => Action::SetFilter(self.controller.state().filter().next()),
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Enter => Action::OpenInBrowser,
            KeyCode::Char('y') => Action::YankUrl,
            _ => Action::None,
        }
    }

    /// Issue under the cursor. Nothing is selectable while content is hidden.
    pub fn selected_issue(&self) -> Option<&IssueRecord> {
        let state = self.controller.state();
        if state.is_loading() {
            return None;
        }
        state.issues().get(self.issue_index)
    }

    pub fn update(&mut self, action: Action) {
        if !matches!(
            action,
            Action::Tick
                | Action::None
                | Action::ViewLoaded { .. }
                | Action::IssuesLoaded { .. }
                | Action::FetchFailed { .. }
        ) {
            self.notice = None;
            self.error = None;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Tick => {
                self.spinner = self.spinner.wrapping_add(1);
            }
            Action::ScrollUp => {
                self.issue_index = self.issue_index.saturating_sub(1);
            }
            Action::ScrollDown => {
                let len = self.controller.state().issues().len();
                if len > 0 && self.issue_index < len - 1 {
                    self.issue_index += 1;
                }
            }

            Action::SetFilter(filter) => self.controller.change_filter(filter),
            Action::PrevPage => self.controller.prev_page(),
            Action::NextPage => self.controller.next_page(),
            Action::Refresh => self.controller.refresh(),

            Action::OpenInBrowser => {
                if let Some(url) = self.selected_issue().map(|i| i.html_url.clone()) {
                    if let Err(e) = open::that(&url) {
                        self.error = Some(format!("Failed to open browser: {}", e));
                    }
                }
            }
            Action::YankUrl => {
                if let Some(url) = self.selected_issue().map(|i| i.html_url.clone()) {
                    match arboard::Clipboard::new().and_then(|mut c| c.set_text(url.clone())) {
                        Ok(()) => self.notice = Some(format!("Copied {}", url)),
                        Err(e) => self.error = Some(format!("Clipboard error: {}", e)),
                    }
                }
            }

            result @ (Action::ViewLoaded { .. } | Action::IssuesLoaded { .. }) => {
                if self.controller.apply(result) {
                    self.issue_index = 0;
                }
            }
            result @ Action::FetchFailed { .. } => {
                self.controller.apply(result);
            }

            Action::None => {}
        }
    }
}
