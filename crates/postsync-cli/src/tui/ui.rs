//! UI rendering

use postsync_core::SyncPhase;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::app::{App, FormField, InputMode};
use crate::output::{truncate, truncate_line};

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App) {
    match app.phase() {
        SyncPhase::Uninitialized | SyncPhase::Loading => draw_loading(frame),
        SyncPhase::LoadFailed => draw_load_failed(frame, app),
        _ => draw_main(frame, app),
    }

    // Draw help overlay if visible
    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn draw_loading(frame: &mut Frame) {
    let area = centered_rows(frame.area(), 3);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled("↻", Style::default().fg(Color::Blue))),
        Line::from(""),
        Line::from("Loading..."),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Error view that replaces the list when the first load fails
fn draw_load_failed(frame: &mut Frame, app: &App) {
    let message = app
        .snapshot
        .error
        .as_ref()
        .map(|e| e.message.clone())
        .unwrap_or_else(|| "Failed to fetch list".to_string());

    let area = centered_rows(frame.area(), 5);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(message, Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(
            "r:retry  q:quit",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);

    if let Some(msg) = &app.status_message {
        let bar = Rect::new(0, frame.area().height.saturating_sub(1), frame.area().width, 1);
        frame.render_widget(
            Paragraph::new(msg.as_str()).style(Style::default().add_modifier(Modifier::DIM)),
            bar,
        );
    }
}

fn draw_main(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_form(frame, app, chunks[0]);
    draw_list(frame, app, chunks[1]);
    draw_status_bar(frame, app, chunks[2]);
}

/// Draw the new-post form
fn draw_form(frame: &mut Frame, app: &App, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;

    let field_style = |field: FormField| {
        if editing && app.focused_field == field {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };

    let placeholder = |value: &str, text: &'static str| {
        if value.is_empty() {
            Span::styled(text, Style::default().add_modifier(Modifier::DIM))
        } else {
            Span::raw(value.to_string())
        }
    };

    let button_style = if app.is_submitting() {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default().fg(Color::Blue)
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Title: ", field_style(FormField::Title)),
            placeholder(&app.title_input, "Post Title"),
        ]),
        Line::from(vec![
            Span::styled("Body:  ", field_style(FormField::Body)),
            placeholder(&app.body_input, "Post Body"),
        ]),
        Line::from(Span::styled(
            format!("[ {} ]", app.submit_label()),
            button_style,
        )),
    ];

    let border_style = if editing {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let block = Block::default()
        .title(" New Post ")
        .borders(Borders::ALL)
        .border_style(border_style);

    frame.render_widget(Paragraph::new(lines).block(block), area);

    // Position cursor at the end of the focused field
    if editing {
        let (row, value) = match app.focused_field {
            FormField::Title => (0, &app.title_input),
            FormField::Body => (1, &app.body_input),
        };
        let cursor_x = cursor_column(area, "Title: ".len(), value);
        frame.set_cursor_position((cursor_x, area.y.saturating_add(1 + row)));
    }
}

/// Draw the post list
fn draw_list(frame: &mut Frame, app: &App, area: Rect) {
    let refreshing = app.phase() == SyncPhase::Refreshing;
    let title = if refreshing {
        format!(" Post List ({}) ↻ ", app.snapshot.items.len())
    } else {
        format!(" Post List ({}) ", app.snapshot.items.len())
    };

    let block = Block::default()
        .title(title)
        .title_bottom(Line::from(" End of List ").centered())
        .borders(Borders::ALL)
        .border_style(if app.input_mode == InputMode::Normal {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        });

    if app.snapshot.items.is_empty() {
        let paragraph = Paragraph::new(Span::styled(
            "No Data Posted",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let max_len = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = app
        .snapshot
        .items
        .iter()
        .map(|post| {
            let title = Line::from(Span::styled(
                truncate(&post.title, max_len),
                Style::default().fg(Color::Blue),
            ));
            let body = Line::from(Span::styled(
                truncate_line(&post.body, max_len),
                Style::default().add_modifier(Modifier::DIM),
            ));
            ListItem::new(vec![title, body, Line::from("")])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select(Some(app.post_index));

    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.is_submitting() {
        Line::from("Adding post...")
    } else if app.phase() == SyncPhase::Refreshing {
        Line::from("Refreshing...")
    } else if let Some(msg) = &app.status_message {
        Line::from(msg.as_str())
    } else if let Some(error) = &app.snapshot.error {
        // Inline error alongside the list that is still valid
        Line::from(Span::styled(
            error.message.as_str(),
            Style::default().fg(Color::Red),
        ))
    } else {
        let hints = match app.input_mode {
            InputMode::Normal => "r:refresh  i:new post  ?:help  q:quit",
            InputMode::Editing => "Tab:switch field  Enter:submit  Esc:done",
        };
        let position = app
            .current_post()
            .map(|post| format!("#{}  ", post.id))
            .unwrap_or_default();
        let synced = app
            .snapshot
            .last_synced
            .map(|t| {
                format!(
                    "synced {}  ",
                    t.with_timezone(&chrono::Local).format("%H:%M:%S")
                )
            })
            .unwrap_or_default();
        Line::from(format!("{}{}{}", position, synced, hints))
    };

    let paragraph = Paragraph::new(line).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    // Calculate centered popup area
    let popup_width = 46.min(area.width.saturating_sub(4));
    let popup_height = 17.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("List:"),
        Line::from("  j/k, ↑/↓    Move up/down"),
        Line::from("  g/G         First/last post"),
        Line::from("  r           Refresh"),
        Line::from("  i, a        New post"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from("Form:"),
        Line::from("  Tab         Switch field"),
        Line::from("  Enter       Add post"),
        Line::from("  Esc         Back to list"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    frame.render_widget(Paragraph::new(help_text).block(block), popup_area);
}

/// A full-width band of `rows` lines in the vertical middle of `area`
fn centered_rows(area: Rect, rows: u16) -> Rect {
    let height = rows.min(area.height);
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(area.x, y, area.width, height)
}

/// Column just after `value`, clamped inside the block border
fn cursor_column(area: Rect, label_width: usize, value: &str) -> u16 {
    let offset = u16::try_from(label_width + value.chars().count()).unwrap_or(u16::MAX);
    area.x
        .saturating_add(1)
        .saturating_add(offset)
        .min(area.right().saturating_sub(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_follows_typed_text() {
        let area = Rect::new(0, 0, 80, 5);
        assert_eq!(cursor_column(area, 7, ""), 8);
        assert_eq!(cursor_column(area, 7, "héllo"), 13);
    }

    #[test]
    fn test_cursor_is_clamped_for_long_input() {
        let area = Rect::new(2, 0, 40, 5);
        assert_eq!(cursor_column(area, 7, &"x".repeat(100)), 40);

        let huge = "x".repeat(usize::from(u16::MAX) + 10);
        assert_eq!(cursor_column(area, 7, &huge), 40);
    }
}
