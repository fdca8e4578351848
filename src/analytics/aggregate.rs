use std::collections::HashMap;

use chrono::{FixedOffset, Timelike};

use crate::types::{
    AgentPerformance, HourlyPerformance, MapPerformance, MatchSummary, OverviewStats, Session,
    SessionGameMetric, SessionPerformance,
};

/// Minimum games before an agent or map qualifies for the overview highlights.
pub const MIN_HIGHLIGHT_GAMES: usize = 3;

#[derive(Debug, Default)]
struct GroupAcc {
    total_kda: f64,
    total_dpr: f64,
    total_score: f64,
    wins: usize,
    count: usize,
}

/// Buckets matches into the 24 hours of the day under `offset`.
///
/// Hour derivation shifts each absolute start instant into the given fixed
/// offset. The host timezone plays no part, so the same input produces the
/// same buckets on any machine. Empty hours are omitted.
pub fn performance_by_hour(matches: &[MatchSummary], offset: FixedOffset) -> Vec<HourlyPerformance> {
    struct Bucket {
        total_kda: f64,
        wins: usize,
        count: usize,
    }
    let mut buckets: [Bucket; 24] =
        std::array::from_fn(|_| Bucket { total_kda: 0.0, wins: 0, count: 0 });

    for m in matches {
        let hour = m.game_start.with_timezone(&offset).hour() as usize;
        buckets[hour].total_kda += m.kda();
        buckets[hour].wins += usize::from(m.won);
        buckets[hour].count += 1;
    }

    buckets
        .iter()
        .enumerate()
        .filter(|(_, b)| b.count > 0)
        .map(|(hour, b)| HourlyPerformance {
            hour: hour as u32,
            avg_kda: b.total_kda / b.count as f64,
            win_rate: b.wins as f64 / b.count as f64,
            match_count: b.count,
        })
        .collect()
}

/// Per-game metrics in original in-session order, plus session totals.
pub fn performance_by_session(sessions: &[Session]) -> Vec<SessionPerformance> {
    sessions
        .iter()
        .map(|session| {
            let mut games = Vec::with_capacity(session.game_count());
            let mut total_kda = 0.0;
            let mut total_rating = 0i32;

            for (i, m) in session.matches.iter().enumerate() {
                total_kda += m.kda();
                total_rating += m.rating_delta.unwrap_or(0);
                games.push(SessionGameMetric {
                    game_number: i + 1,
                    kda: m.kda(),
                    damage_per_round: m.damage_per_round(),
                    rating_delta: m.rating_delta,
                });
            }

            let n = session.game_count();
            debug_assert!(n > 0, "sessions are non-empty by construction");
            SessionPerformance {
                session_index: session.index,
                game_count: n,
                total_rating_delta: total_rating,
                avg_rating_delta_per_game: if n > 0 { f64::from(total_rating) / n as f64 } else { 0.0 },
                avg_kda: if n > 0 { total_kda / n as f64 } else { 0.0 },
                games,
            }
        })
        .collect()
}

/// Grouping preserves first-seen order so equal game counts tie-break
/// deterministically after the stable sort.
fn group_by<'a>(
    matches: &'a [MatchSummary],
    key: impl Fn(&'a MatchSummary) -> &'a str,
) -> Vec<(String, GroupAcc)> {
    let mut order: Vec<String> = Vec::new();
    let mut accs: HashMap<&str, GroupAcc> = HashMap::new();

    for m in matches {
        let k = key(m);
        let acc = accs.entry(k).or_insert_with(|| {
            order.push(k.to_string());
            GroupAcc::default()
        });
        acc.total_kda += m.kda();
        acc.total_dpr += m.damage_per_round();
        acc.total_score += f64::from(m.score);
        acc.wins += usize::from(m.won);
        acc.count += 1;
    }

    order
        .into_iter()
        .map(|k| {
            let acc = accs.remove(k.as_str()).expect("grouped key present");
            (k, acc)
        })
        .collect()
}

pub fn performance_by_agent(matches: &[MatchSummary]) -> Vec<AgentPerformance> {
    let total = matches.len();
    let mut result: Vec<AgentPerformance> = group_by(matches, |m| &m.agent)
        .into_iter()
        .map(|(agent, acc)| AgentPerformance {
            agent,
            games: acc.count,
            avg_kda: acc.total_kda / acc.count as f64,
            win_rate: acc.wins as f64 / acc.count as f64,
            avg_damage_per_round: acc.total_dpr / acc.count as f64,
            pick_rate: if total > 0 { acc.count as f64 / total as f64 } else { 0.0 },
        })
        .collect();

    result.sort_by(|a, b| b.games.cmp(&a.games));
    result
}

pub fn performance_by_map(matches: &[MatchSummary]) -> Vec<MapPerformance> {
    let mut result: Vec<MapPerformance> = group_by(matches, |m| &m.map)
        .into_iter()
        .map(|(map, acc)| MapPerformance {
            map,
            games: acc.count,
            avg_kda: acc.total_kda / acc.count as f64,
            win_rate: acc.wins as f64 / acc.count as f64,
            avg_score: acc.total_score / acc.count as f64,
        })
        .collect();

    result.sort_by(|a, b| b.games.cmp(&a.games));
    result
}

/// Aggregate totals, highlight picks, and the win/loss streak scan.
/// `agents` and `maps` are expected in by-games-descending order, so the
/// first strict improvement wins highlight ties.
pub fn compute_overview(
    matches: &[MatchSummary],
    agents: &[AgentPerformance],
    maps: &[MapPerformance],
) -> OverviewStats {
    let mut stats = OverviewStats {
        total_games: matches.len(),
        worst_map_win_rate: 1.0,
        ..OverviewStats::default()
    };

    for m in matches {
        stats.total_kills += m.kills;
        stats.total_deaths += m.deaths;
        stats.total_assists += m.assists;
        stats.total_rating_delta += m.rating_delta.unwrap_or(0);
        if m.won {
            stats.wins += 1;
        } else {
            stats.losses += 1;
        }
    }

    let ka = f64::from(stats.total_kills + stats.total_assists);
    stats.overall_kda = if stats.total_deaths > 0 {
        ka / f64::from(stats.total_deaths)
    } else {
        ka
    };

    if stats.total_games > 0 {
        stats.win_rate = stats.wins as f64 / stats.total_games as f64;
        let total_dpr: f64 = matches.iter().map(MatchSummary::damage_per_round).sum();
        stats.avg_damage_per_round = total_dpr / stats.total_games as f64;
    }

    for a in agents {
        if a.games >= MIN_HIGHLIGHT_GAMES && a.avg_kda > stats.best_agent_kda {
            stats.best_agent = Some(a.agent.clone());
            stats.best_agent_kda = a.avg_kda;
        }
    }

    for m in maps {
        if m.games >= MIN_HIGHLIGHT_GAMES && m.win_rate < stats.worst_map_win_rate {
            stats.worst_map = Some(m.map.clone());
            stats.worst_map_win_rate = m.win_rate;
        }
    }

    let mut streak = 0i32;
    let mut max_win = 0usize;
    let mut max_loss = 0usize;
    for m in matches {
        if m.won {
            streak = if streak > 0 { streak + 1 } else { 1 };
            max_win = max_win.max(streak as usize);
        } else {
            streak = if streak < 0 { streak - 1 } else { -1 };
            max_loss = max_loss.max(streak.unsigned_abs() as usize);
        }
    }
    stats.longest_win_streak = max_win;
    stats.longest_loss_streak = max_loss;
    stats.current_streak = streak;

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn match_with(agent: &str, map: &str, won: bool, kills: u32, deaths: u32) -> MatchSummary {
        MatchSummary {
            match_id: format!("m-{agent}-{map}-{kills}"),
            map: map.to_string(),
            mode: "Competitive".to_string(),
            agent: agent.to_string(),
            game_start: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            game_length_secs: 2400,
            kills,
            deaths,
            assists: 0,
            score: 4000,
            damage_made: 2600,
            rounds_played: 20,
            won,
            rating_delta: Some(if won { 18 } else { -15 }),
        }
    }

    fn match_at_epoch(epoch: i64, won: bool) -> MatchSummary {
        MatchSummary {
            game_start: DateTime::from_timestamp(epoch, 0).unwrap(),
            ..match_with("Jett", "Ascent", won, 10, 10)
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn hourly_buckets_by_utc_hour() {
        // 1_700_000_000 falls at 22:13 UTC; 1_700_006_400 at 00:00 UTC.
        let matches = vec![
            match_at_epoch(1_700_000_000, true),
            match_at_epoch(1_700_000_100, false),
            match_at_epoch(1_700_006_400, true),
        ];
        let hourly = performance_by_hour(&matches, utc());

        assert_eq!(hourly.len(), 2);
        assert_eq!(hourly[0].hour, 0);
        assert_eq!(hourly[0].match_count, 1);
        assert_eq!(hourly[1].hour, 22);
        assert_eq!(hourly[1].match_count, 2);
        assert_eq!(hourly[1].win_rate, 0.5);
    }

    #[test]
    fn hourly_respects_the_configured_offset() {
        let matches = vec![match_at_epoch(1_700_000_000, true)];
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let hourly = performance_by_hour(&matches, plus_two);
        // 22:13 UTC is 00:13 at UTC+2.
        assert_eq!(hourly[0].hour, 0);
    }

    #[test]
    fn session_metrics_keep_order_and_totals() {
        let session = Session {
            index: 2,
            matches: vec![
                match_with("Jett", "Ascent", true, 20, 10),
                match_with("Jett", "Ascent", false, 10, 10),
            ],
        };
        let perf = performance_by_session(&[session]);

        assert_eq!(perf.len(), 1);
        let sp = &perf[0];
        assert_eq!(sp.session_index, 2);
        assert_eq!(sp.game_count, 2);
        assert_eq!(sp.games[0].game_number, 1);
        assert_eq!(sp.games[1].game_number, 2);
        assert_eq!(sp.total_rating_delta, 3);
        assert!((sp.avg_rating_delta_per_game - 1.5).abs() < 1e-9);
        assert!((sp.avg_kda - 1.5).abs() < 1e-9);
    }

    #[test]
    fn agents_sort_by_games_with_first_seen_tiebreak() {
        let matches = vec![
            match_with("Jett", "Ascent", true, 10, 10),
            match_with("Sova", "Ascent", true, 10, 10),
            match_with("Sage", "Ascent", true, 10, 10),
            match_with("Sage", "Ascent", false, 10, 10),
        ];
        let agents = performance_by_agent(&matches);

        assert_eq!(agents[0].agent, "Sage");
        assert_eq!(agents[0].games, 2);
        // Jett and Sova tie at 1 game; first seen stays first.
        assert_eq!(agents[1].agent, "Jett");
        assert_eq!(agents[2].agent, "Sova");
        assert!((agents[0].pick_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn overview_totals_and_highlights() {
        let mut matches = Vec::new();
        for _ in 0..3 {
            matches.push(match_with("Jett", "Ascent", true, 20, 10)); // KDA 2.0
            matches.push(match_with("Sova", "Bind", false, 5, 10)); // KDA 0.5
        }
        // Only 2 games on Reyna, so it never qualifies despite the huge KDA.
        matches.push(match_with("Reyna", "Haven", true, 30, 1));
        matches.push(match_with("Reyna", "Haven", true, 30, 1));

        let agents = performance_by_agent(&matches);
        let maps = performance_by_map(&matches);
        let stats = compute_overview(&matches, &agents, &maps);

        assert_eq!(stats.total_games, 8);
        assert_eq!(stats.wins, 5);
        assert_eq!(stats.losses, 3);
        assert_eq!(stats.best_agent.as_deref(), Some("Jett"));
        assert!((stats.best_agent_kda - 2.0).abs() < 1e-9);
        assert_eq!(stats.worst_map.as_deref(), Some("Bind"));
        assert_eq!(stats.worst_map_win_rate, 0.0);
    }

    #[test]
    fn overview_highlights_default_when_nothing_qualifies() {
        let matches = vec![match_with("Jett", "Ascent", false, 10, 10)];
        let agents = performance_by_agent(&matches);
        let maps = performance_by_map(&matches);
        let stats = compute_overview(&matches, &agents, &maps);

        assert_eq!(stats.best_agent, None);
        assert_eq!(stats.worst_map, None);
        assert_eq!(stats.worst_map_win_rate, 1.0);
    }

    #[test]
    fn streak_scan_matches_the_reference_sequence() {
        // win, win, loss, win, win, win
        let results = [true, true, false, true, true, true];
        let matches: Vec<_> = results
            .iter()
            .map(|&won| match_with("Jett", "Ascent", won, 10, 10))
            .collect();

        let stats = compute_overview(&matches, &[], &[]);
        assert_eq!(stats.longest_win_streak, 3);
        assert_eq!(stats.longest_loss_streak, 1);
        assert_eq!(stats.current_streak, 3);
    }

    #[test]
    fn empty_input_produces_zeroed_overview() {
        let stats = compute_overview(&[], &[], &[]);
        assert_eq!(stats.total_games, 0);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.overall_kda, 0.0);
        assert_eq!(stats.win_rate, 0.0);
    }
}
