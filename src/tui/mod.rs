mod app;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs},
    Frame, Terminal,
};

use crate::display::{f1, f2, fdelta, fdelta_opt, fpct, hour12, streak_str};
use crate::ingest::ApiClient;
use crate::types::{FatigueTrend, Report};

use app::{spawn_fetch, truncate, AppState, View, TAB_LABELS};
pub use app::FetchParams;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Runs the interactive viewer. When `initial` carries a riot id the fetch
/// starts immediately; otherwise the search screen comes up first.
pub async fn run(
    client: Arc<ApiClient>,
    params: FetchParams,
    initial: Option<(String, String)>,
) -> io::Result<()> {
    let mut app = AppState::new();
    if let Some((name, tag)) = initial {
        let rx = spawn_fetch(Arc::clone(&client), params.clone(), name, tag);
        app.begin_loading(rx);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &client, &params).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    client: &Arc<ApiClient>,
    params: &FetchParams,
) -> io::Result<()> {
    loop {
        app.drain_load_events();

        let mut table_state = TableState::default();
        if app.active_row_count() > 0 {
            table_state.select(Some(app.row));
        }
        terminal.draw(|f| render(f, app, &mut table_state))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.view {
            View::Search => match key.code {
                KeyCode::Esc => return Ok(()),
                KeyCode::Enter => match app.parse_riot_id() {
                    Some((name, tag)) => {
                        let rx = spawn_fetch(Arc::clone(client), params.clone(), name, tag);
                        app.begin_loading(rx);
                    }
                    None => app.error = Some("Invalid format. Use name#tag".to_string()),
                },
                KeyCode::Backspace => {
                    app.input.pop();
                }
                KeyCode::Char(c) => app.input.push(c),
                _ => {}
            },
            View::Loading => {
                if key.code == KeyCode::Esc {
                    app.cancel_loading();
                }
            }
            View::Report => match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('b') | KeyCode::Char('B') => app.back_to_search(),
                KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => app.next_tab(),
                KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => app.prev_tab(),
                KeyCode::Down | KeyCode::Char('j') => app.row_down(),
                KeyCode::Up | KeyCode::Char('k') => app.row_up(),
                _ => {}
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState, table_state: &mut TableState) {
    match app.view {
        View::Search => render_search(f, app),
        View::Loading => render_loading(f, app),
        View::Report => {
            if let Some(report) = &app.report {
                render_report(f, app, report, table_state);
            }
        }
    }
}

fn centered_box(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn render_search(f: &mut Frame, app: &AppState) {
    let area = centered_box(f.area(), 52, 9);

    let mut lines = vec![
        Line::from(Span::styled(
            "VALORANT Fatigue Analyzer",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(Span::styled("Enter player name#tag:", Style::default().fg(Color::DarkGray))),
        Line::from(vec![
            Span::raw("> "),
            Span::styled(app.input.as_str(), Style::default().fg(Color::White)),
            Span::styled("█", Style::default().fg(Color::Cyan)),
        ]),
        Line::raw(""),
    ];
    if let Some(err) = &app.error {
        lines.push(Line::from(Span::styled(
            truncate(err, 48),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(Span::styled(
        "[Enter] search  [Esc] quit",
        Style::default().fg(Color::DarkGray),
    )));

    let boxed = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(boxed, area);
}

fn render_loading(f: &mut Frame, app: &AppState) {
    let area = centered_box(f.area(), 56, 7);

    let lines = vec![
        Line::from(Span::styled(
            "VALORANT Fatigue Analyzer",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(Span::styled(truncate(&app.load_status, 52), Style::default().fg(Color::White))),
        Line::raw(""),
        Line::from(Span::styled("[Esc] cancel", Style::default().fg(Color::DarkGray))),
    ];

    let boxed = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(boxed, area);
}

fn render_report(f: &mut Frame, app: &AppState, report: &Report, table_state: &mut TableState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(1), // tab bar
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    render_header(f, report, chunks[0]);

    let tabs = Tabs::new(TAB_LABELS.iter().map(|l| Line::raw(*l)))
        .select(app.selected_tab)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[1]);

    match app.selected_tab {
        0 => render_overview(f, report, chunks[2]),
        1 => render_hourly(f, report, chunks[2], table_state),
        2 => render_agents(f, report, chunks[2], table_state),
        3 => render_maps(f, report, chunks[2], table_state),
        4 => render_sessions(f, report, chunks[2], table_state),
        5 => render_rating_sessions(f, report, chunks[2], table_state),
        6 => render_rolling(f, &report.rolling_kda, "ROLLING KDA", f2, chunks[2], table_state),
        7 => render_rolling(f, &report.rolling_win_rate, "ROLLING WIN RATE", fpct, chunks[2], table_state),
        _ => render_decay(f, report, chunks[2], table_state),
    }

    render_footer(f, chunks[3]);
}

fn render_header(f: &mut Frame, report: &Report, area: Rect) {
    let o = &report.overview;
    let streak_color = if o.current_streak > 0 {
        Color::Green
    } else if o.current_streak < 0 {
        Color::Red
    } else {
        Color::DarkGray
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", report.player.riot_id()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(format!("{} matches", report.match_count), Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(format!("{} WR", fpct(o.win_rate)), Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(format!("{} KDA", f2(o.overall_kda)), Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(
            format!("streak {}", streak_str(o.current_streak)),
            Style::default().fg(streak_color),
        ),
    ]);

    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" [←→/Tab] ", Style::default().fg(Color::Yellow)),
        Span::raw("switch tab  "),
        Span::styled("[↑↓ / j k] ", Style::default().fg(Color::Yellow)),
        Span::raw("scroll  "),
        Span::styled("[b] ", Style::default().fg(Color::Yellow)),
        Span::raw("back  "),
        Span::styled("[q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit"),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn header_row(cells: &[&str]) -> Row<'static> {
    Row::new(
        cells
            .iter()
            .map(|h| {
                Cell::from(h.to_string())
                    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            })
            .collect::<Vec<_>>(),
    )
    .height(1)
}

fn section_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn kda_color(kda: f64) -> Color {
    if kda >= 2.0 {
        Color::Green
    } else if kda >= 1.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn wr_color(wr: f64) -> Color {
    if wr >= 0.55 {
        Color::Green
    } else if wr >= 0.45 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn delta_color(delta: i32) -> Color {
    if delta > 0 {
        Color::Green
    } else if delta < 0 {
        Color::Red
    } else {
        Color::Yellow
    }
}

fn render_overview(f: &mut Frame, report: &Report, area: Rect) {
    let o = &report.overview;
    let lines = vec![
        Line::raw(""),
        Line::from(vec![
            Span::styled("  Record      ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{}W-{}L ({})", o.wins, o.losses, fpct(o.win_rate)),
                Style::default().fg(wr_color(o.win_rate)),
            ),
        ]),
        Line::from(vec![
            Span::styled("  KDA         ", Style::default().fg(Color::DarkGray)),
            Span::styled(f2(o.overall_kda), Style::default().fg(kda_color(o.overall_kda))),
            Span::styled(
                format!("   ({}/{}/{})", o.total_kills, o.total_deaths, o.total_assists),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(vec![
            Span::styled("  Dmg/round   ", Style::default().fg(Color::DarkGray)),
            Span::raw(f1(o.avg_damage_per_round)),
        ]),
        Line::from(vec![
            Span::styled("  Rating      ", Style::default().fg(Color::DarkGray)),
            Span::styled(fdelta(o.total_rating_delta), Style::default().fg(delta_color(o.total_rating_delta))),
        ]),
        Line::from(vec![
            Span::styled("  Streaks     ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!(
                "current {}, best {}W, worst {}L",
                streak_str(o.current_streak),
                o.longest_win_streak,
                o.longest_loss_streak
            )),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::styled("  Best agent  ", Style::default().fg(Color::DarkGray)),
            match &o.best_agent {
                Some(agent) => Span::styled(
                    format!("{agent} ({} KDA)", f2(o.best_agent_kda)),
                    Style::default().fg(Color::Green),
                ),
                None => Span::styled("-", Style::default().fg(Color::DarkGray)),
            },
        ]),
        Line::from(vec![
            Span::styled("  Weakest map ", Style::default().fg(Color::DarkGray)),
            match &o.worst_map {
                Some(map) => Span::styled(
                    format!("{map} ({} WR)", fpct(o.worst_map_win_rate)),
                    Style::default().fg(Color::Red),
                ),
                None => Span::styled("-", Style::default().fg(Color::DarkGray)),
            },
        ]),
    ];

    f.render_widget(Paragraph::new(lines).block(section_block("OVERVIEW")), area);
}

fn render_hourly(f: &mut Frame, report: &Report, area: Rect, state: &mut TableState) {
    let rows: Vec<Row> = report
        .hourly
        .iter()
        .map(|h| {
            Row::new(vec![
                Cell::from(hour12(h.hour)),
                Cell::from(f2(h.avg_kda)).style(Style::default().fg(kda_color(h.avg_kda))),
                Cell::from(fpct(h.win_rate)).style(Style::default().fg(wr_color(h.win_rate))),
                Cell::from(h.match_count.to_string()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Length(8),
        ],
    )
    .header(header_row(&["Hour", "KDA", "WR", "Matches"]))
    .block(section_block("PERFORMANCE BY TIME OF DAY"))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(table, area, state);
}

fn render_agents(f: &mut Frame, report: &Report, area: Rect, state: &mut TableState) {
    let rows: Vec<Row> = report
        .agents
        .iter()
        .map(|a| {
            Row::new(vec![
                Cell::from(truncate(&a.agent, 14)),
                Cell::from(a.games.to_string()),
                Cell::from(f2(a.avg_kda)).style(Style::default().fg(kda_color(a.avg_kda))),
                Cell::from(fpct(a.win_rate)).style(Style::default().fg(wr_color(a.win_rate))),
                Cell::from(f1(a.avg_damage_per_round)),
                Cell::from(fpct(a.pick_rate)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(7),
        ],
    )
    .header(header_row(&["Agent", "Games", "KDA", "WR", "Dmg/Rnd", "Pick"]))
    .block(section_block("AGENT PERFORMANCE"))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(table, area, state);
}

fn render_maps(f: &mut Frame, report: &Report, area: Rect, state: &mut TableState) {
    let rows: Vec<Row> = report
        .maps
        .iter()
        .map(|m| {
            Row::new(vec![
                Cell::from(truncate(&m.map, 14)),
                Cell::from(m.games.to_string()),
                Cell::from(f2(m.avg_kda)).style(Style::default().fg(kda_color(m.avg_kda))),
                Cell::from(fpct(m.win_rate)).style(Style::default().fg(wr_color(m.win_rate))),
                Cell::from(f1(m.avg_score)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&["Map", "Games", "KDA", "WR", "Avg score"]))
    .block(section_block("MAP PERFORMANCE"))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(table, area, state);
}

fn render_sessions(f: &mut Frame, report: &Report, area: Rect, state: &mut TableState) {
    // One row per game, grouped visually by session column.
    let rows: Vec<Row> = report
        .sessions
        .iter()
        .flat_map(|sp| {
            sp.games.iter().map(move |g| {
                Row::new(vec![
                    Cell::from(if g.game_number == 1 {
                        format!("S{}", sp.session_index + 1)
                    } else {
                        String::new()
                    })
                    .style(Style::default().fg(Color::Cyan)),
                    Cell::from(g.game_number.to_string()),
                    Cell::from(f2(g.kda)).style(Style::default().fg(kda_color(g.kda))),
                    Cell::from(f2(g.damage_per_round)),
                    Cell::from(fdelta_opt(g.rating_delta)).style(
                        Style::default().fg(g.rating_delta.map_or(Color::DarkGray, delta_color)),
                    ),
                ])
            })
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Length(7),
        ],
    )
    .header(header_row(&["Sess", "Game", "KDA", "Dmg/Rnd", "RR"]))
    .block(section_block("PERFORMANCE AFTER CONSECUTIVE GAMES"))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(table, area, state);
}

fn render_rating_sessions(f: &mut Frame, report: &Report, area: Rect, state: &mut TableState) {
    let rows: Vec<Row> = report
        .sessions
        .iter()
        .map(|sp| {
            Row::new(vec![
                Cell::from(format!("S{}", sp.session_index + 1)),
                Cell::from(sp.game_count.to_string()),
                Cell::from(fdelta(sp.total_rating_delta))
                    .style(Style::default().fg(delta_color(sp.total_rating_delta))),
                Cell::from(f2(sp.avg_rating_delta_per_game)),
                Cell::from(f2(sp.avg_kda)).style(Style::default().fg(kda_color(sp.avg_kda))),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Length(8),
        ],
    )
    .header(header_row(&["Sess", "Games", "Total RR", "RR/game", "KDA"]))
    .block(section_block("RATING CHANGE BY SESSION LENGTH"))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(table, area, state);
}

fn render_rolling(
    f: &mut Frame,
    metrics: &[crate::types::RollingMetric],
    title: &str,
    fmt_value: fn(f64) -> String,
    area: Rect,
    state: &mut TableState,
) {
    let (min, max) = metrics.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), m| {
        (lo.min(m.value), hi.max(m.value))
    });

    let rows: Vec<Row> = metrics
        .iter()
        .map(|m| {
            let marker = if m.value == max {
                "▲ peak"
            } else if m.value == min {
                "▼ low"
            } else {
                ""
            };
            Row::new(vec![
                Cell::from((m.match_index + 1).to_string()),
                Cell::from(fmt_value(m.value)),
                Cell::from(marker).style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Length(7), Constraint::Length(9), Constraint::Length(8)],
    )
    .header(header_row(&["Match", "Value", ""]))
    .block(section_block(title))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(table, area, state);
}

fn render_decay(f: &mut Frame, report: &Report, area: Rect, state: &mut TableState) {
    let model = &report.decay;
    if model.points.is_empty() {
        let msg = Paragraph::new("Not enough session data for decay analysis.")
            .style(Style::default().fg(Color::DarkGray))
            .block(section_block("FATIGUE DECAY"));
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(area);

    let rows: Vec<Row> = model
        .points
        .iter()
        .map(|p| {
            Row::new(vec![
                Cell::from(p.position.to_string()),
                Cell::from(f2(p.avg_kda)).style(Style::default().fg(kda_color(p.avg_kda))),
                Cell::from(f2(model.predicted(p.position)))
                    .style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Length(7), Constraint::Length(9), Constraint::Length(10)],
    )
    .header(header_row(&["Game #", "Avg KDA", "Predicted"]))
    .block(section_block("KDA BY GAME POSITION IN SESSION"))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    f.render_stateful_widget(table, chunks[0], state);

    let (label, color) = match FatigueTrend::from_slope(model.slope) {
        FatigueTrend::Significant => (
            format!("FATIGUE DETECTED — KDA drops {} per game", f2(model.slope.abs())),
            Color::Red,
        ),
        FatigueTrend::Mild => ("Mild fatigue trend (slope near zero)".to_string(), Color::Yellow),
        FatigueTrend::Stable => (
            "No fatigue detected — performance stable or improving".to_string(),
            Color::Green,
        ),
    };
    let summary = Paragraph::new(vec![
        Line::raw(format!(
            " regression: KDA = {} * game + {}   r² = {}",
            f2(model.slope),
            f2(model.intercept),
            f2(model.r_squared)
        )),
        Line::from(Span::styled(
            format!(" {label}"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ])
    .block(Block::default().borders(Borders::TOP).border_style(Style::default().fg(Color::DarkGray)));
    f.render_widget(summary, chunks[1]);
}
