use clap::ValueEnum;

use crate::types::{
    AgentPerformance, DecayCurveModel, FatigueTrend, HourlyPerformance, MapPerformance, Report,
    RollingMetric, SessionPerformance,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportSection {
    Overview,
    Hourly,
    Sessions,
    /// Rating-delta summary per session.
    Rr,
    RollingKda,
    RollingWr,
    Decay,
    Agents,
    Maps,
    All,
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub(crate) fn f2(v: f64) -> String {
    format!("{v:.2}")
}

pub(crate) fn f1(v: f64) -> String {
    format!("{v:.1}")
}

pub(crate) fn fpct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

pub(crate) fn fdelta(delta: i32) -> String {
    if delta > 0 {
        format!("+{delta}")
    } else {
        delta.to_string()
    }
}

pub(crate) fn fdelta_opt(delta: Option<i32>) -> String {
    delta.map(fdelta).unwrap_or_else(|| "n/a".to_string())
}

pub(crate) fn hour12(h24: u32) -> String {
    match h24 {
        0 => "12 AM".to_string(),
        1..=11 => format!("{h24} AM"),
        12 => "12 PM".to_string(),
        _ => format!("{} PM", h24 - 12),
    }
}

pub(crate) fn streak_str(streak: i32) -> String {
    match streak {
        s if s > 0 => format!("{s}W"),
        s if s < 0 => format!("{}L", -s),
        _ => "-".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Report printing
// ---------------------------------------------------------------------------

fn wants(sections: &[ReportSection], section: ReportSection) -> bool {
    sections.contains(&ReportSection::All) || sections.contains(&section)
}

pub fn print_report(report: &Report, format: OutputFormat, sections: &[ReportSection]) {
    println!(
        "{} | region {} | {} matches",
        report.player.riot_id(),
        report.player.region,
        report.match_count
    );

    if wants(sections, ReportSection::Overview) {
        print_overview(report);
    }
    if wants(sections, ReportSection::Hourly) {
        print_hourly(&report.hourly, format);
    }
    if wants(sections, ReportSection::Sessions) {
        print_sessions(&report.sessions, format);
    }
    if wants(sections, ReportSection::Rr) {
        print_rating_sessions(&report.sessions, format);
    }
    if wants(sections, ReportSection::RollingKda) {
        print_rolling("Rolling KDA", &report.rolling_kda, format, f2);
    }
    if wants(sections, ReportSection::RollingWr) {
        print_rolling("Rolling win rate", &report.rolling_win_rate, format, fpct);
    }
    if wants(sections, ReportSection::Decay) {
        print_decay(&report.decay, format);
    }
    if wants(sections, ReportSection::Agents) {
        print_agents(&report.agents, format);
    }
    if wants(sections, ReportSection::Maps) {
        print_maps(&report.maps, format);
    }
}

fn print_overview(report: &Report) {
    let o = &report.overview;
    println!("\n== Overview ==");
    println!(
        "  record {}W-{}L ({})  KDA {}  dmg/round {}  rating {}",
        o.wins,
        o.losses,
        fpct(o.win_rate),
        f2(o.overall_kda),
        f1(o.avg_damage_per_round),
        fdelta(o.total_rating_delta),
    );
    println!(
        "  K/D/A {}/{}/{}  streak {} (best {}W, worst {}L)",
        o.total_kills,
        o.total_deaths,
        o.total_assists,
        streak_str(o.current_streak),
        o.longest_win_streak,
        o.longest_loss_streak,
    );
    println!(
        "  best agent: {}  weakest map: {}",
        o.best_agent
            .as_ref()
            .map(|a| format!("{a} ({} KDA)", f2(o.best_agent_kda)))
            .unwrap_or_else(|| "-".to_string()),
        o.worst_map
            .as_ref()
            .map(|m| format!("{m} ({} WR)", fpct(o.worst_map_win_rate)))
            .unwrap_or_else(|| "-".to_string()),
    );
}

fn print_hourly(hourly: &[HourlyPerformance], format: OutputFormat) {
    println!("\n== Performance by time of day ==");
    if hourly.is_empty() {
        println!("  no data");
        return;
    }
    match format {
        OutputFormat::Csv => {
            println!("hour,avg_kda,win_rate,matches");
            for h in hourly {
                println!("{},{},{},{}", h.hour, f2(h.avg_kda), f2(h.win_rate), h.match_count);
            }
        }
        OutputFormat::Table => {
            println!("  {:<6} {:>8} {:>9} {:>8}", "Hour", "Avg KDA", "Win rate", "Matches");
            for h in hourly {
                println!(
                    "  {:<6} {:>8} {:>9} {:>8}",
                    hour12(h.hour),
                    f2(h.avg_kda),
                    fpct(h.win_rate),
                    h.match_count
                );
            }
        }
    }
}

fn print_sessions(sessions: &[SessionPerformance], format: OutputFormat) {
    println!("\n== Performance by session ==");
    if sessions.is_empty() {
        println!("  no data");
        return;
    }
    if format == OutputFormat::Csv {
        println!("session,game,kda,damage_per_round,rating_delta");
        for sp in sessions {
            for g in &sp.games {
                println!(
                    "{},{},{},{},{}",
                    sp.session_index + 1,
                    g.game_number,
                    f2(g.kda),
                    f2(g.damage_per_round),
                    g.rating_delta.map(|d| d.to_string()).unwrap_or_default()
                );
            }
        }
        return;
    }
    for sp in sessions {
        println!(
            "  Session {} — {} games, avg KDA {}, rating {}",
            sp.session_index + 1,
            sp.game_count,
            f2(sp.avg_kda),
            fdelta(sp.total_rating_delta),
        );
        println!("    {:<5} {:>7} {:>9} {:>7}", "Game", "KDA", "Dmg/Rnd", "RR");
        for g in &sp.games {
            println!(
                "    {:<5} {:>7} {:>9} {:>7}",
                g.game_number,
                f2(g.kda),
                f2(g.damage_per_round),
                fdelta_opt(g.rating_delta)
            );
        }
    }
}

fn print_rating_sessions(sessions: &[SessionPerformance], format: OutputFormat) {
    println!("\n== Rating change by session length ==");
    if sessions.is_empty() {
        println!("  no data");
        return;
    }
    match format {
        OutputFormat::Csv => {
            println!("session,games,total_rating_delta,avg_rating_delta_per_game");
            for sp in sessions {
                println!(
                    "{},{},{},{}",
                    sp.session_index + 1,
                    sp.game_count,
                    sp.total_rating_delta,
                    f2(sp.avg_rating_delta_per_game)
                );
            }
        }
        OutputFormat::Table => {
            println!("  {:<8} {:>6} {:>9} {:>13}", "Session", "Games", "Total RR", "Avg RR/game");
            for sp in sessions {
                println!(
                    "  {:<8} {:>6} {:>9} {:>13}",
                    sp.session_index + 1,
                    sp.game_count,
                    fdelta(sp.total_rating_delta),
                    f2(sp.avg_rating_delta_per_game)
                );
            }
        }
    }
}

fn print_rolling(
    title: &str,
    metrics: &[RollingMetric],
    format: OutputFormat,
    fmt_value: fn(f64) -> String,
) {
    println!("\n== {title} ==");
    if metrics.is_empty() {
        println!("  not enough matches");
        return;
    }
    match format {
        OutputFormat::Csv => {
            println!("match_index,match_id,value");
            for m in metrics {
                println!("{},{},{}", m.match_index, m.match_id, f2(m.value));
            }
        }
        OutputFormat::Table => {
            println!("  {:<7} {:>8}", "Match", "Value");
            for m in metrics {
                println!("  {:<7} {:>8}", m.match_index + 1, fmt_value(m.value));
            }
        }
    }
}

fn print_decay(model: &DecayCurveModel, format: OutputFormat) {
    println!("\n== Fatigue decay ==");
    if model.points.is_empty() {
        println!("  not enough session data");
        return;
    }
    if format == OutputFormat::Csv {
        println!("position,avg_kda,predicted");
        for p in &model.points {
            println!("{},{},{}", p.position, f2(p.avg_kda), f2(model.predicted(p.position)));
        }
        return;
    }

    println!("  {:<7} {:>8} {:>10}", "Game #", "Avg KDA", "Predicted");
    for p in &model.points {
        println!(
            "  {:<7} {:>8} {:>10}",
            p.position,
            f2(p.avg_kda),
            f2(model.predicted(p.position))
        );
    }
    println!(
        "  regression: KDA = {} * game + {}   (r² {})",
        f2(model.slope),
        f2(model.intercept),
        f2(model.r_squared)
    );
    let interpretation = match FatigueTrend::from_slope(model.slope) {
        FatigueTrend::Significant => format!(
            "fatigue detected — KDA drops {} per game within a session",
            f2(model.slope.abs())
        ),
        FatigueTrend::Mild => "mild fatigue trend (slope near zero)".to_string(),
        FatigueTrend::Stable => "no fatigue detected — performance stable or improving".to_string(),
    };
    println!("  {interpretation}");
}

fn print_agents(agents: &[AgentPerformance], format: OutputFormat) {
    println!("\n== Agent performance ==");
    if agents.is_empty() {
        println!("  no data");
        return;
    }
    match format {
        OutputFormat::Csv => {
            println!("agent,games,avg_kda,win_rate,avg_damage_per_round,pick_rate");
            for a in agents {
                println!(
                    "{},{},{},{},{},{}",
                    a.agent,
                    a.games,
                    f2(a.avg_kda),
                    f2(a.win_rate),
                    f1(a.avg_damage_per_round),
                    f2(a.pick_rate)
                );
            }
        }
        OutputFormat::Table => {
            println!(
                "  {:<12} {:>6} {:>7} {:>9} {:>9} {:>7}",
                "Agent", "Games", "KDA", "Win rate", "Dmg/Rnd", "Pick %"
            );
            for a in agents {
                println!(
                    "  {:<12} {:>6} {:>7} {:>9} {:>9} {:>7}",
                    a.agent,
                    a.games,
                    f2(a.avg_kda),
                    fpct(a.win_rate),
                    f1(a.avg_damage_per_round),
                    fpct(a.pick_rate)
                );
            }
        }
    }
}

fn print_maps(maps: &[MapPerformance], format: OutputFormat) {
    println!("\n== Map performance ==");
    if maps.is_empty() {
        println!("  no data");
        return;
    }
    match format {
        OutputFormat::Csv => {
            println!("map,games,avg_kda,win_rate,avg_score");
            for m in maps {
                println!(
                    "{},{},{},{},{}",
                    m.map,
                    m.games,
                    f2(m.avg_kda),
                    f2(m.win_rate),
                    f1(m.avg_score)
                );
            }
        }
        OutputFormat::Table => {
            println!(
                "  {:<12} {:>6} {:>7} {:>9} {:>10}",
                "Map", "Games", "KDA", "Win rate", "Avg score"
            );
            for m in maps {
                println!(
                    "  {:<12} {:>6} {:>7} {:>9} {:>10}",
                    m.map,
                    m.games,
                    f2(m.avg_kda),
                    fpct(m.win_rate),
                    f1(m.avg_score)
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_labels_wrap_correctly() {
        assert_eq!(hour12(0), "12 AM");
        assert_eq!(hour12(7), "7 AM");
        assert_eq!(hour12(12), "12 PM");
        assert_eq!(hour12(23), "11 PM");
    }

    #[test]
    fn streak_and_delta_labels() {
        assert_eq!(streak_str(3), "3W");
        assert_eq!(streak_str(-2), "2L");
        assert_eq!(streak_str(0), "-");
        assert_eq!(fdelta(18), "+18");
        assert_eq!(fdelta(-4), "-4");
        assert_eq!(fdelta_opt(None), "n/a");
    }
}
