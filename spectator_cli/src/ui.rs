use std::collections::VecDeque;

use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use beast_schema::GameState;
use spectator_core::view_model::{
    fallen, grid_window, results_table, turn_order, CellView, Occupant, ResultsTable, Threat,
};
use spectator_core::{LinkStatus, ViewFrame};

const TITLE: &str = "The Beast from 3 East";
const CELL_WIDTH: u16 = 4;
const EMPTY_CELL: &str = " .  ";
const WALL_CELL: &str = "▓▓▓▓";

pub struct UiState {
    pub logs: VecDeque<String>,
    pub max_logs: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new(8)
    }
}

impl UiState {
    pub fn new(max_logs: usize) -> Self {
        Self {
            logs: VecDeque::new(),
            max_logs: max_logs.max(1),
        }
    }

    pub fn push_log<S: Into<String>>(&mut self, line: S) {
        let mut text: String = line.into();
        while text.ends_with('\n') || text.ends_with('\r') {
            text.pop();
        }
        if text.is_empty() {
            return;
        }
        self.logs.push_front(text);
        while self.logs.len() > self.max_logs {
            self.logs.pop_back();
        }
    }
}

pub fn draw_ui(frame: &mut Frame, view: &ViewFrame, state: &UiState) {
    let snapshot = view.snapshot.as_ref();
    let results = if view.view.show_results {
        results_table(snapshot)
    } else {
        None
    };

    let mut constraints = vec![Constraint::Length(3)];
    if snapshot.game_over {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(6));
    if let Some(table) = results.as_ref() {
        constraints.push(Constraint::Length(clamped_len(table.rows.len(), 4)));
    }
    constraints.push(Constraint::Length(4));
    constraints.push(Constraint::Length(clamped_len(state.max_logs, 2)));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.size());

    let mut next = 0;
    let mut take = || {
        let area = chunks[next];
        next += 1;
        area
    };

    draw_header(frame, take(), view);
    if snapshot.game_over {
        draw_game_over(frame, take());
    }
    draw_board_area(frame, take(), snapshot);
    if let Some(table) = results.as_ref() {
        draw_results(frame, take(), table);
    }
    draw_commands(frame, take());
    draw_logs(frame, take(), state);
}

fn draw_header(frame: &mut Frame, area: Rect, view: &ViewFrame) {
    let block = Block::default().borders(Borders::ALL).title(TITLE);
    let text = Paragraph::new(header_line(view)).wrap(Wrap { trim: true });
    frame.render_widget(block, area);
    frame.render_widget(
        text,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

pub(crate) fn header_line(view: &ViewFrame) -> Line<'static> {
    let link = match view.link {
        LinkStatus::Connecting => Span::styled("Connecting", Style::default().fg(Color::Yellow)),
        LinkStatus::Online => Span::styled("Online", Style::default().fg(Color::Green)),
        LinkStatus::Failing { consecutive } => Span::styled(
            format!("Unreachable ({consecutive})"),
            Style::default().fg(Color::Red),
        ),
    };
    let playback = if view.view.paused {
        Span::styled("PAUSED", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("LIVE", Style::default().fg(Color::Green))
    };
    let snapshot = view.snapshot.as_ref();
    Line::from(vec![
        link,
        Span::raw(" | "),
        playback,
        Span::raw(format!(
            " | Turn: {}/{}",
            snapshot.turn_counter, snapshot.end_game_turns
        )),
        Span::raw(format!(" | Ticks: {}", view.view.elapsed_ticks)),
    ])
}

fn draw_game_over(frame: &mut Frame, area: Rect) {
    let banner = Paragraph::new(Line::from(Span::styled(
        "Game Over!",
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(banner, area);
}

fn draw_board_area(frame: &mut Frame, area: Rect, snapshot: &GameState) {
    let board_width = u16::try_from(snapshot.grid_size.width)
        .unwrap_or(u16::MAX)
        .saturating_mul(CELL_WIDTH)
        .saturating_add(2);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(board_width), Constraint::Min(20)])
        .split(area);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(clamped_len(snapshot.engineers.len(), 3)),
            Constraint::Min(3),
        ])
        .split(columns[1]);

    draw_board(frame, columns[0], snapshot);
    draw_turn_order(frame, side[0], snapshot);
    draw_fallen(frame, side[1], snapshot);
}

fn draw_board(frame: &mut Frame, area: Rect, snapshot: &GameState) {
    let block = Block::default().borders(Borders::ALL).title("Board");
    let inner = area.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    });
    let paragraph = Paragraph::new(board_lines(snapshot, inner.width / CELL_WIDTH, inner.height));
    frame.render_widget(block, area);
    frame.render_widget(paragraph, inner);
}

/// Lines for the part of the board that fits in `max_cols × max_rows` cells.
pub(crate) fn board_lines(snapshot: &GameState, max_cols: u16, max_rows: u16) -> Vec<Line<'_>> {
    let grid = grid_window(snapshot, u32::from(max_cols), u32::from(max_rows));
    let lines = grid
        .rows()
        .map(|row| Line::from(row.iter().map(cell_span).collect::<Vec<_>>()))
        .collect();
    lines
}

fn cell_span<'a>(cell: &CellView<'a>) -> Span<'a> {
    let style = match cell.threat {
        Some(Threat::Primary) => Style::default().bg(Color::Red),
        Some(Threat::Secondary) => Style::default().bg(Color::Blue),
        None => Style::default(),
    };
    match cell.occupant {
        Some(occupant @ Occupant::Beast) => Span::styled(
            format!(" {} ", occupant.glyph()),
            style.fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Some(occupant) => Span::styled(format!(" {} ", occupant.glyph()), style),
        None if cell.wall => Span::styled(WALL_CELL, Style::default().fg(Color::DarkGray)),
        None => Span::styled(EMPTY_CELL, Style::default().fg(Color::DarkGray)),
    }
}

fn draw_turn_order(frame: &mut Frame, area: Rect, snapshot: &GameState) {
    let block = Block::default().borders(Borders::ALL).title("Turn Order");
    let lines: Vec<Line> = turn_order(snapshot)
        .into_iter()
        .map(|entry| {
            let marker = if entry.active {
                Span::styled("→ ", Style::default().fg(Color::Yellow))
            } else {
                Span::raw("  ")
            };
            let mut spans = vec![marker, Span::raw(format!("{} ", entry.glyph))];
            let name_style = if entry.active {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(entry.name.to_string(), name_style));
            if entry.zombie {
                spans.push(Span::styled(" (zombie)", Style::default().fg(Color::DarkGray)));
            }
            Line::from(spans)
        })
        .collect();
    let paragraph = Paragraph::new(lines);
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_fallen(frame: &mut Frame, area: Rect, snapshot: &GameState) {
    let block = Block::default().borders(Borders::ALL).title("Fallen");
    let lines: Vec<Line> = fallen(snapshot)
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>2}. ", index + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(name.to_string()),
            ])
        })
        .collect();
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_results(frame: &mut Frame, area: Rect, table: &ResultsTable) {
    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let mut header = vec!["Name".to_string()];
    header.extend(table.columns.iter().cloned());
    header.push("Total".to_string());

    let rows: Vec<Row> = table
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.name.clone()];
            cells.extend(row.cells.iter().cloned());
            cells.push(row.total.to_string());
            Row::new(cells)
        })
        .collect();

    let name_width = table
        .rows
        .iter()
        .map(|row| row.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);
    let mut widths = vec![Constraint::Length(clamped_len(name_width, 1))];
    widths.extend(
        table
            .columns
            .iter()
            .map(|label| Constraint::Length(clamped_len(label.chars().count().max(3), 1))),
    );
    widths.push(Constraint::Length(6));

    let widget = Table::new(rows, widths)
        .header(Row::new(header).style(header_style))
        .block(Block::default().borders(Borders::ALL).title("Game Results"));
    frame.render_widget(widget, area);
}

/// Panel height or width for `count` items plus fixed `padding`, saturating at the
/// terminal coordinate limit.
fn clamped_len(count: usize, padding: u16) -> u16 {
    u16::try_from(count)
        .unwrap_or(u16::MAX)
        .saturating_add(padding)
}

fn draw_commands(frame: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let lines = vec![
        Line::from(vec![
            Span::styled("space", key),
            Span::raw(" pause/resume   "),
            Span::styled("r", key),
            Span::raw(" reset game   "),
        ]),
        Line::from(vec![
            Span::styled("t", key),
            Span::raw("     toggle results "),
            Span::styled("q", key),
            Span::raw(" exit spectator"),
        ]),
    ];
    let block = Block::default().borders(Borders::ALL).title("Commands");
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_logs(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Logs");
    let lines: Vec<Line> = state
        .logs
        .iter()
        .map(|entry| Line::from(Span::raw(entry)))
        .collect();
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}
