use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use chrono::Utc;
use crate::commands::fmt_progress;
use crate::models::TaskStatus;
use super::app::{App, InputMode, ViewMode};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Table
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    let title = app.title();
    let header_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let highlight_style = Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray);

    match app.view_mode {
        ViewMode::Tasks => {
            let rows: Vec<Row> = app
                .tasks
                .iter()
                .map(|t| {
                    let style = match t.task_status {
                        TaskStatus::Completed => Style::default().fg(Color::Green),
                        TaskStatus::Cancelled => Style::default().fg(Color::DarkGray),
                        TaskStatus::InProgress => Style::default().fg(Color::Cyan),
                        TaskStatus::Pending => Style::default().fg(Color::Yellow),
                    };
                    Row::new(vec![
                        Cell::from(t.task_type.to_string()),
                        Cell::from(t.cycle_type.to_string()),
                        Cell::from(t.week_days.clone().unwrap_or_default()),
                        Cell::from(t.task_plan_date.date_naive().to_string()),
                        Cell::from(t.task_finish_date.map(|d| d.date_naive().to_string()).unwrap_or_default()),
                        Cell::from(fmt_progress(t)),
                        Cell::from(t.task_status.to_string()),
                        Cell::from(t.resource_id.clone().unwrap_or_default()),
                    ]).style(style)
                })
                .collect();

            let widths = [
                Constraint::Length(9),
                Constraint::Length(7),
                Constraint::Length(14),
                Constraint::Length(11),
                Constraint::Length(11),
                Constraint::Length(14),
                Constraint::Length(12),
                Constraint::Min(10),
            ];

            let table = Table::new(rows, widths)
                .header(Row::new(vec!["Type", "Cycle", "Days", "Start", "End", "Progress", "Status", "Resource"])
                    .style(header_style)
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title(title))
                .row_highlight_style(highlight_style)
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.state);
        }
        ViewMode::Items(_) | ViewMode::Due => {
            let today = Utc::now().date_naive();
            let rows: Vec<Row> = app
                .items
                .iter()
                .map(|i| {
                    let style = if i.score.is_some() {
                        Style::default().fg(Color::Green)
                    } else if i.plan_time.date_naive() < today {
                        Style::default().fg(Color::Red)
                    } else if i.plan_time.date_naive() == today {
                        Style::default().fg(Color::Yellow)
                    } else {
                        Style::default()
                    };
                    Row::new(vec![
                        Cell::from(i.id.to_string()),
                        Cell::from(i.plan_time.format("%a %Y-%m-%d").to_string()),
                        Cell::from(i.begin_time.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()),
                        Cell::from(i.end_time.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()),
                        Cell::from(i.score.map(|s| format!("{:.1}", s)).unwrap_or_default()),
                    ]).style(style)
                })
                .collect();

            let widths = [
                Constraint::Length(6),
                Constraint::Length(16),
                Constraint::Length(7),
                Constraint::Length(7),
                Constraint::Min(6),
            ];

            let table = Table::new(rows, widths)
                .header(Row::new(vec!["ID", "Planned", "Begin", "End", "Score"])
                    .style(header_style)
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title(title))
                .row_highlight_style(highlight_style)
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.item_state);
        }
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Tasks => "q: Quit | Enter: Items | c: Cycle Status | d: Del | t: Due Today | r: Reload",
            _ => "q: Quit | s: Score | b: Begin | d: Del Item | t: Toggle Due | Esc: Tasks",
        },
        InputMode::Scoring => "Enter: Save | Esc: Cancel",
    };
    let help_line = match &app.message {
        Some(msg) => format!("{}  [{}]", help_text, msg),
        None => help_text.to_string(),
    };

    let help = Paragraph::new(help_line)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[1]);

    if app.input_mode == InputMode::Scoring {
        let area = centered_rect(60, 3, f.area()); // Fixed height of 3 (border + 1 line)
        f.render_widget(Clear, area);

        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title("Enter Score"));

        f.render_widget(input, area);
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
