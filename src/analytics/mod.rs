pub mod aggregate;
pub mod decay;
pub mod session;
pub mod trend;

use chrono::FixedOffset;

use crate::types::{MatchSummary, PlayerIdentity, Report};

#[derive(Debug, Clone)]
pub struct AnalyticsOptions {
    /// Rolling-metric window size.
    pub window: usize,
    /// Inactivity gap that closes a session.
    pub session_gap: chrono::Duration,
    /// Minimum session length for the decay fit.
    pub min_session_length: usize,
    /// Fixed offset for hour-of-day bucketing.
    pub hour_offset: FixedOffset,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            window: 20,
            session_gap: chrono::Duration::minutes(45),
            min_session_length: 3,
            hour_offset: FixedOffset::east_opt(0).expect("zero offset is valid"),
        }
    }
}

/// Runs the full pipeline over an ordered match sequence. Pure: every
/// engine below is a total function, so an empty input yields a report full
/// of empty sections rather than an error.
pub fn build_report(
    player: PlayerIdentity,
    matches: &[MatchSummary],
    options: &AnalyticsOptions,
) -> Report {
    let sessions = session::segment(matches, options.session_gap);
    let agents = aggregate::performance_by_agent(matches);
    let maps = aggregate::performance_by_map(matches);

    Report {
        player,
        match_count: matches.len(),
        overview: aggregate::compute_overview(matches, &agents, &maps),
        hourly: aggregate::performance_by_hour(matches, options.hour_offset),
        sessions: aggregate::performance_by_session(&sessions),
        rolling_kda: trend::rolling_kda(matches, options.window),
        rolling_win_rate: trend::rolling_win_rate(matches, options.window),
        decay: decay::decay_curve(&sessions, options.min_session_length),
        agents,
        maps,
    }
}
