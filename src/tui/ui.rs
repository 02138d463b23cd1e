//! Stateless UI rendering for the chess board.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::app::App;
use chess_play_game::{GameStatus, Side, Square, format_clock};

const BOARD_WIDTH: u16 = 30;
const BOARD_HEIGHT: u16 = 12;

const HELP: &str =
    "arrows/hjkl move  enter select  n new  u undo  m mode  t time  p pause  s save  q quit";

/// Renders the whole screen.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(BOARD_HEIGHT),
            Constraint::Length(3), // Status
            Constraint::Length(1), // Help
        ])
        .split(area);

    let title = Paragraph::new("Chess Play")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    draw_board(frame, body[0], app);
    draw_sidebar(frame, body[1], app);

    let status = Paragraph::new(app.status_message())
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, chunks[2]);

    let help = Paragraph::new(HELP)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[3]);
}

fn draw_board(frame: &mut Frame, area: Rect, app: &App) {
    let board_area = center_rect(area, BOARD_WIDTH, BOARD_HEIGHT);
    let label = Style::default().fg(Color::DarkGray);

    let mut lines = Vec::with_capacity(10);
    for rank in (0..8u8).rev() {
        let mut spans = vec![Span::styled(format!("{} ", rank + 1), label)];
        for file in 0..8u8 {
            if let Some(square) = Square::new(file, rank) {
                spans.push(square_span(app, square));
            }
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(Span::styled(
        "   a  b  c  d  e  f  g  h",
        label,
    )));

    let board = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Board"));
    frame.render_widget(board, board_area);
}

fn square_span(app: &App, square: Square) -> Span<'static> {
    let session = app.session();
    let light = (square.file() + square.rank()) % 2 == 1;

    let background = if square == app.cursor() {
        Color::Yellow
    } else if *session.selected_square() == Some(square) {
        Color::Green
    } else if session.legal_targets().contains(&square) {
        Color::LightBlue
    } else if light {
        Color::Gray
    } else {
        Color::DarkGray
    };

    let (symbol, foreground) = match session.piece_at(square) {
        Some(piece) => {
            let fg = match piece.side {
                Side::White => Color::White,
                Side::Black => Color::Black,
            };
            (format!(" {} ", piece.glyph()), fg)
        }
        None if session.legal_targets().contains(&square) => (" · ".to_string(), Color::Black),
        None => ("   ".to_string(), Color::Black),
    };

    Span::styled(
        symbol,
        Style::default()
            .bg(background)
            .fg(foreground)
            .add_modifier(Modifier::BOLD),
    )
}

fn draw_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let session = app.session();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(3)])
        .split(area);

    let status_style = match session.status() {
        GameStatus::Active => Style::default().fg(Color::Green),
        GameStatus::Check => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        GameStatus::Checkmate | GameStatus::Draw => {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        }
    };
    let status = match session.termination() {
        Some(termination) => termination.to_string(),
        None => format!("{} to move ({})", session.side_to_move(), session.status()),
    };

    let info = vec![
        clock_line(app, Side::White),
        clock_line(app, Side::Black),
        Line::from(Span::styled(status, status_style)),
        Line::from(format!("Mode: {}", session.mode())),
        Line::from(format!("Time: {}", session.settings().time_control())),
    ];
    let info = Paragraph::new(info).block(Block::default().borders(Borders::ALL).title("Game"));
    frame.render_widget(info, rows[0]);

    let moves = Paragraph::new(format_move_log(session.move_log()))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Moves"));
    frame.render_widget(moves, rows[1]);
}

fn clock_line(app: &App, side: Side) -> Line<'static> {
    let session = app.session();
    let active = *session.clock_running() && *session.side_to_move() == side;
    let style = if active {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let label = match side {
        Side::White => "White",
        Side::Black => "Black",
    };
    Line::from(Span::styled(
        format!("{}  {}", label, format_clock(session.clock(side))),
        style,
    ))
}

/// Numbers the moves in pairs: `1. e4 e5 2. Nf3`.
pub fn format_move_log(moves: &[String]) -> String {
    moves
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vert[1])[1]
}
