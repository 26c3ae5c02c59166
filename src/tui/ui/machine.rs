use crate::events::GameState;
use crate::symbols::SymbolId;
use crate::tui::app::AppState;
use ratatui::prelude::*;
use ratatui::widgets::*;

use super::layout::{centered_rect, grid_cells, inner};

pub(super) fn draw_machine(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // header
            Constraint::Min(7),    // reels
            Constraint::Length(5), // status bar
        ])
        .split(f.area());

    let state = app.state();
    let header_lines = vec![
        Line::from(vec![
            Span::raw(format!("Balance: ${}   Bet: {}   ", app.balance(), app.bet())),
            Span::styled(format!("Last win: {}", app.last_win()), win_style(app.last_win())),
        ]),
        Line::from(vec![Span::raw("State: "), Span::styled(state.label(), state_style(state))]),
    ];
    let header = Paragraph::new(header_lines)
        .block(Block::default().title("slot-rs").borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    draw_reels(f, app, chunks[1]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(inner(chunks[2]));
    f.render_widget(Block::default().borders(Borders::ALL), chunks[2]);

    let mut left: Vec<Line> = Vec::new();
    if let Some(status) = app.status() {
        left.push(Line::from(Span::styled(status, Style::default().fg(Color::Red))));
    }
    for win in app.last_lines().iter().take(3) {
        left.push(Line::from(format!("{}: {} x{}", win.payline_id, win.explanation, win.multiplier)));
    }
    let can_spin = app.coordinator().can_spin();
    let can_bet = app.coordinator().can_change_bet();
    let key_style = |enabled: bool| {
        if enabled {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        }
    };
    let right = vec![
        Line::from(vec![
            Span::styled("Space spin", key_style(can_spin)),
            Span::raw(" • "),
            Span::styled("W win", key_style(can_spin)),
        ]),
        Line::from(Span::styled("+/- bet", key_style(can_bet))),
        Line::from("? help • H history • M menu"),
    ];
    f.render_widget(Paragraph::new(left).wrap(Wrap { trim: true }), cols[0]);
    f.render_widget(
        Paragraph::new(right).wrap(Wrap { trim: true }).alignment(Alignment::Right),
        cols[1],
    );

    if app.help_open() {
        draw_help(f);
    } else if app.history_open() {
        draw_history(f, app);
    }
}

fn draw_reels(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title("Reels").borders(Borders::ALL);
    f.render_widget(block, area);
    let rows = app.visible_rows();
    let columns = rows.first().map(Vec::len).unwrap_or(0);
    let cells = grid_cells(inner(area), rows.len(), columns);
    let lit = app.lit_rows();
    for (r, row) in rows.iter().enumerate() {
        for (c, id) in row.iter().enumerate() {
            let Some(cell) = cells.get(r * columns + c) else {
                continue;
            };
            let mut style = symbol_style(*id);
            if lit.contains(&r) {
                style = style.bg(Color::Yellow).fg(Color::Black);
            }
            let text = Line::from(Span::styled(id.glyph(), style));
            let para = Paragraph::new(text).alignment(Alignment::Center);
            let y_mid = cell.y + cell.height.saturating_sub(1) / 2;
            f.render_widget(para, Rect { y: y_mid, height: 1.min(cell.height), ..*cell });
        }
    }
}

fn draw_history(f: &mut Frame, app: &AppState) {
    let area = centered_rect(70, 80, f.area());
    let block = Block::default().title("History").borders(Borders::ALL);
    let mut lines: Vec<Line> = Vec::new();
    let entries = app.history_recent(AppState::HISTORY_PAGE_SIZE, app.history_offset());
    if entries.is_empty() {
        lines.push(Line::from("No spins yet."));
    } else {
        for entry in entries {
            lines.push(Line::from(vec![
                Span::raw(format!("#{:<4} bet {:<5} ", entry.number, entry.bet)),
                Span::styled(format!("won {:<6}", entry.winnings), win_style(entry.winnings)),
                Span::raw(format!(" balance {}", entry.balance)),
            ]));
            for line in &entry.lines {
                lines.push(Line::from(Span::styled(
                    format!("      {line}"),
                    Style::default().add_modifier(Modifier::DIM),
                )));
            }
        }
    }
    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(block, area);
    f.render_widget(para, inner(area));
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(70, 80, f.area());
    let block = Block::default().title("Help").borders(Borders::ALL);
    let lines = vec![
        Line::from(Span::styled("Machine:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("- Space / Enter: spin"),
        Line::from("- W: forced winning spin"),
        Line::from("- + / -: raise / lower bet"),
        Line::from("- H: history"),
        Line::from(""),
        Line::from(Span::styled("Paying lines:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("- Every row is a payline"),
        Line::from("- A row pays when all symbols match, WILD substitutes"),
        Line::from("- Win = symbol multiplier x bet, summed over rows"),
        Line::from(""),
        Line::from(Span::styled("Menu:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("- M: open / close menu"),
        Line::from("- Up / Down: move selection"),
        Line::from("- + / -: adjust value"),
        Line::from("- Enter: apply and reset the machine"),
        Line::from("- Esc: back"),
        Line::from("- Q: quit"),
        Line::from(""),
        Line::from("Close help: ? or Esc"),
    ];
    let para = Paragraph::new(lines).wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(block, area);
    f.render_widget(para, inner(area));
}

fn symbol_style(id: SymbolId) -> Style {
    match id {
        SymbolId::Cherry => Style::default().fg(Color::Red),
        SymbolId::Lemon => Style::default().fg(Color::Yellow),
        SymbolId::Plum => Style::default().fg(Color::Magenta),
        SymbolId::Bell => Style::default().fg(Color::LightYellow),
        SymbolId::Bar => Style::default().fg(Color::White),
        SymbolId::Diamond => Style::default().fg(Color::Cyan),
        SymbolId::Seven => Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
        SymbolId::Wild => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    }
}

fn state_style(state: GameState) -> Style {
    match state {
        GameState::Idle => Style::default().fg(Color::Green),
        GameState::Spinning => Style::default().fg(Color::Yellow),
        GameState::ShowingWin => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        GameState::InsufficientBalance => Style::default().fg(Color::Red),
    }
}

fn win_style(amount: u64) -> Style {
    if amount > 0 {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}
