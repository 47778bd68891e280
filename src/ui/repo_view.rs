use chrono::Utc;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;

use crate::app::App;
use crate::types::{IssueFilter, IssueRecord};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.controller.state();

    // Previous content stays hidden while a fetch is in flight.
    if state.is_loading() {
        render_loading(frame, app, area);
        return;
    }

    let Some(repository) = state.repository() else {
        let message = Paragraph::new("Repository could not be loaded. Press r to retry.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(message, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let owner = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                repository.name.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("@{}", repository.owner.login),
                Style::default().fg(Color::Gray),
            ),
        ]),
        Line::from(Span::raw(
            repository.description.clone().unwrap_or_default(),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(owner, chunks[0]);

    render_filters(frame, app, chunks[1]);
    render_issues(frame, app, chunks[2]);
    render_pager(frame, app, chunks[3]);
}

fn render_loading(frame: &mut Frame, app: &App, area: Rect) {
    let loading = Paragraph::new(format!("Loading {}", super::spinner(app)))
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(loading, area);
}

fn render_filters(frame: &mut Frame, app: &App, area: Rect) {
    let selected = app.controller.state().filter();
    let titles: Vec<String> = IssueFilter::ALL
        .iter()
        .map(|f| {
            let key = f.as_api_str().chars().next().unwrap_or(' ');
            format!("[{}] {}", key.to_ascii_uppercase(), f)
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(" State "))
        .select(
            IssueFilter::ALL
                .iter()
                .position(|f| *f == selected)
                .unwrap_or(0),
        )
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_issues(frame: &mut Frame, app: &App, area: Rect) {
    let issues = app.controller.state().issues();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Issues ({}) ", issues.len()));

    if issues.is_empty() {
        let empty = Paragraph::new("No issues")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 30; // #num(6) + pr(5) + @author(16) + age(3)
    let flex = w.saturating_sub(fixed).max(10);

    let items: Vec<ListItem> = issues
        .iter()
        .enumerate()
        .map(|(i, issue)| issue_line(issue, i == app.issue_index, flex))
        .map(ListItem::new)
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.issue_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn issue_line(issue: &IssueRecord, selected: bool, width: usize) -> Line<'static> {
    let title_style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let labels: String = issue
        .labels
        .iter()
        .map(|l| format!(" [{}]", l.name))
        .collect();
    let title_width = width.saturating_sub(labels.chars().count()).max(10);

    let mut spans = vec![
        Span::styled(
            format!("#{:<5}", issue.number),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            if issue.pull_request { " PR  " } else { "     " },
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(truncate(&issue.title, title_width), title_style),
        Span::styled(labels, Style::default().fg(Color::Magenta)),
        Span::raw(" "),
        Span::styled(
            format!("@{}", truncate(&issue.author.login, 15)),
            Style::default().fg(Color::Gray),
        ),
    ];
    if let Some(updated_at) = issue.updated_at {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format_age(updated_at),
            Style::default().fg(Color::DarkGray),
        ));
    }

    Line::from(spans)
}

fn render_pager(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.controller.state();
    let enabled = Style::default().fg(Color::Cyan);
    let disabled = Style::default().fg(Color::DarkGray);

    let line = Line::from(vec![
        Span::styled(
            "< prev",
            if state.has_prev_page() { enabled } else { disabled },
        ),
        Span::raw(format!("   page {}   ", state.page())),
        Span::styled(
            "next >",
            if state.has_next_page() { enabled } else { disabled },
        ),
    ]);

    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

/// Char-boundary safe truncation with a trailing ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn format_age(dt: chrono::DateTime<chrono::Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(dt);

    if duration.num_days() > 0 {
        format!("{}d", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m", duration.num_minutes())
    } else {
        "now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn format_age_buckets() {
        assert_eq!(format_age(Utc::now() - Duration::days(3)), "3d");
        assert_eq!(format_age(Utc::now() - Duration::hours(5)), "5h");
        assert_eq!(format_age(Utc::now()), "now");
    }
}
