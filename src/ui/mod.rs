use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, Popup};
use crate::theme::Theme;

static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

fn accent() -> Color { theme().accent }
fn danger() -> Color { theme().danger }
fn success() -> Color { theme().success }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn inactive() -> Color { theme().inactive }

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Min(4),    // Streams box
            Constraint::Length(3), // Volume box
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    draw_info_line(f, app, chunks[0]);
    draw_streams_box(f, app, chunks[1]);
    draw_volume_box(f, app, chunks[2]);
    draw_footer(f, chunks[3]);

    match app.popup {
        Popup::None => {}
        Popup::AddStream => draw_add_stream(f, app),
        Popup::Help => draw_help_popup(f),
        Popup::Confirm => draw_confirm_popup(f, app),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status, Style::default().fg(accent())))
    } else if let Some(row) = app.playing.and_then(|i| app.rows.get(i)) {
        Line::from(vec![
            Span::styled("♫ ", Style::default().fg(row.color)),
            Span::styled(&row.name, Style::default().fg(text())),
        ])
    } else {
        Line::from(Span::styled("Stopped", Style::default().fg(text_dim())))
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_streams_box(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Streams ", Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    let rows: Vec<Row> = if app.rows.is_empty() {
        vec![
            Row::new(vec![Span::styled("", Style::default())]),
            Row::new(vec![
                Span::styled("", Style::default()),
                Span::styled("No streams yet, press 'a' to add one", Style::default().fg(text_dim())),
            ]),
        ]
    } else {
        app.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                // Initial on a block of the stream's colour, like the round web buttons
                let badge = Span::styled(
                    format!(" {} ", row.label),
                    Style::default().fg(Color::Black).bg(row.color).add_modifier(Modifier::BOLD),
                );

                let (status, status_color) = if app.playing == Some(i) {
                    ("playing", success())
                } else {
                    ("", text_dim())
                };

                let row_style = if i == app.selected {
                    Style::default().bg(bg_selected()).fg(text())
                } else {
                    Style::default()
                };

                Row::new(vec![
                    badge,
                    Span::styled(&row.name, Style::default().fg(text())),
                    Span::styled(status, Style::default().fg(status_color)),
                ])
                .style(row_style)
            })
            .collect()
    };

    let widths = [
        Constraint::Length(4),
        Constraint::Percentage(70),
        Constraint::Percentage(25),
    ];

    f.render_widget(Table::new(rows, widths).block(block), area);
}

fn draw_volume_box(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Volume ", Style::default().fg(inactive())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    match app.volume {
        Some(volume) => {
            let gauge = Gauge::default()
                .block(block)
                .gauge_style(Style::default().fg(accent()).bg(bg_selected()))
                .percent(volume.min(100) as u16)
                .label(format!("{}%", volume));
            f.render_widget(gauge, area);
        }
        None => {
            let content = Paragraph::new(Span::styled("wpctl not available", Style::default().fg(danger())))
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(content, area);
        }
    }
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let hints = [
        ("↑↓", "Nav"),
        ("Enter", "Play/Stop"),
        ("+/-", "Volume"),
        ("a", "Add"),
        ("d", "Del"),
        ("h", "Help"),
        ("q", "Quit"),
    ];

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    f.render_widget(Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center), area);
}

fn draw_add_stream(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = centered_rect(if area.width < 80 { 90 } else { 60 }, 30, area);

    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(Span::styled(" Add Stream ", Style::default().fg(accent())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));
    f.render_widget(block, popup_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(popup_area);

    let input = Paragraph::new(format!("{}_", app.input_buffer))
        .style(Style::default().fg(text()))
        .block(
            Block::default()
                .title(Span::styled(format!(" {} ", app.prompt_question()), Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        );
    f.render_widget(input, inner[0]);

    let hints = Paragraph::new(Line::from(vec![
        Span::styled("Enter", Style::default().fg(success()).add_modifier(Modifier::BOLD)),
        Span::styled(" confirm   ", Style::default().fg(text_dim())),
        Span::styled("Esc", Style::default().fg(danger()).add_modifier(Modifier::BOLD)),
        Span::styled(" cancel", Style::default().fg(text_dim())),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(hints, inner[1]);
}

fn draw_help_popup(f: &mut Frame) {
    let popup_area = centered_rect(60, 60, f.area());

    f.render_widget(Clear, popup_area);

    let entries = [
        ("↑/k  ↓/j", "Move selection"),
        ("Enter/Space", "Play selected, or stop it"),
        ("s", "Stop playback"),
        ("+ / -", "Volume up / down"),
        ("a", "Add a stream (name, then address)"),
        ("d", "Delete selected stream"),
        ("h / ?", "Toggle this help"),
        ("q / Ctrl+C", "Quit"),
    ];

    let lines: Vec<Line> = entries
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!("  {:<14}", key), Style::default().fg(accent())),
                Span::styled(*action, Style::default().fg(text())),
            ])
        })
        .collect();

    let help = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(" Help ", Style::default().fg(accent())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent())),
    );

    f.render_widget(help, popup_area);
}

fn draw_confirm_popup(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(40, 20, f.area());

    f.render_widget(Clear, popup_area);

    let message = app.status_message.as_deref().unwrap_or("Confirm?");

    let confirm = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(danger()))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y", Style::default().fg(success()).add_modifier(Modifier::BOLD)),
            Span::raw(" Yes   "),
            Span::styled("n", Style::default().fg(danger()).add_modifier(Modifier::BOLD)),
            Span::raw(" No"),
        ]),
    ])
    .block(
        Block::default()
            .title(Span::styled(" Confirm ", Style::default().fg(danger())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(danger())),
    )
    .alignment(Alignment::Center);

    f.render_widget(confirm, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::streams::StreamList;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();

        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_draw_stream_badges() {
        let dir = tempfile::tempdir().unwrap();
        let streams = StreamList::load(dir.path().join("streams.json")).unwrap();
        let app = App::from_parts(AppConfig::default(), streams, Some(40));

        let screen = render(&app);

        assert!(screen.contains("Yle Radio Suomi"));
        assert!(screen.contains("YleX"));
        assert!(screen.contains("40%"));
    }

    #[test]
    fn test_draw_add_stream_popup() {
        let dir = tempfile::tempdir().unwrap();
        let streams = StreamList::load(dir.path().join("streams.json")).unwrap();
        let mut app = App::from_parts(AppConfig::default(), streams, None);
        app.popup = Popup::AddStream;
        app.flow = Some(crate::prompt::AddStreamFlow::new());
        app.input_buffer = "Jazz".to_string();

        let screen = render(&app);

        assert!(screen.contains("Enter the display name of the stream"));
        assert!(screen.contains("Jazz_"));
        assert!(screen.contains("wpctl not available"));
    }
}
