use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    io::stdout,
    time::{Duration, Instant},
};

use blockfall::game::{Cell, Command, Game, GameConfig, PieceKind};

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";

// ============================================================================
// Color Mapping
// ============================================================================

fn piece_color(kind: PieceKind) -> Color {
    match kind {
        PieceKind::I => Color::Cyan,
        PieceKind::LLeft => Color::Rgb(255, 165, 0),
        PieceKind::LRight => Color::Blue,
        PieceKind::ZLeft => Color::Red,
        PieceKind::ZRight => Color::Green,
        PieceKind::T => Color::Magenta,
        PieceKind::Box => Color::Yellow,
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, game: &Game) {
    let area = frame.size();

    let grid_display_width = (game.board.columns() as u16 * CELL_WIDTH) + 2;
    let grid_display_height = game.board.rows() as u16 + 2;

    let main_area = centered_rect(grid_display_width, grid_display_height + 2, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);

    render_board(frame, game, vertical[0]);

    let controls_area = Rect {
        x: area.x,
        y: vertical[0].y + vertical[0].height,
        width: area.width,
        height: 1,
    };

    if controls_area.y < area.height {
        let controls = Paragraph::new(vec![Line::from(
            "←→/AD: Move | ↑/W: Rotate | Q/ESC: Quit",
        )])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_board(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Blockfall ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // The core hands back settled cells with the falling piece already
    // overlaid, so drawing never diverges from game state
    let visual = game.render_cells();

    let mut lines: Vec<Line> = Vec::new();

    for row in &visual {
        let mut spans: Vec<Span> = Vec::new();

        for cell in row {
            let (symbol, style) = match cell {
                Cell::Empty => (EMPTY_CHAR, Style::default()),
                Cell::Filled(kind) => {
                    (BLOCK_CHAR, Style::default().fg(piece_color(*kind)))
                }
            };

            spans.push(Span::styled(symbol, style));
        }

        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines);
    frame.render_widget(paragraph, inner);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Main Loop
// ============================================================================

fn main() -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut game = Game::new(GameConfig::default());
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| render(frame, &game))?;

        let timeout = game
            .fall_interval()
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => break,
                        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
                            game.handle_input(Command::MoveLeft);
                        }
                        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
                            game.handle_input(Command::MoveRight);
                        }
                        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => {
                            game.handle_input(Command::Rotate);
                        }
                        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
                            game.handle_input(Command::SoftDrop);
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= game.fall_interval() {
            game.advance_tick();
            last_tick = Instant::now();
        }
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
