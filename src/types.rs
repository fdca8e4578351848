use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub name: String,
    pub tag: String,
    pub puuid: String,
    pub region: String,
}

impl PlayerIdentity {
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.name, self.tag)
    }
}

// ---------------------------------------------------------------------------
// Match records
// ---------------------------------------------------------------------------

/// One completed competitive match for the tracked player. Immutable once
/// built by the ingestion boundary; every analytics stage reads it as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_id: String,
    pub map: String,
    pub mode: String,
    pub agent: String,
    pub game_start: DateTime<Utc>,
    pub game_length_secs: i64,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub score: u32,
    pub damage_made: u32,
    pub rounds_played: u32,
    pub won: bool,
    /// Rank-rating change, when the ranking history has an entry for this match.
    pub rating_delta: Option<i32>,
}

impl MatchSummary {
    /// (kills + assists) / deaths, or kills + assists for a deathless match.
    pub fn kda(&self) -> f64 {
        let ka = f64::from(self.kills + self.assists);
        if self.deaths == 0 {
            ka
        } else {
            ka / f64::from(self.deaths)
        }
    }

    pub fn damage_per_round(&self) -> f64 {
        if self.rounds_played == 0 {
            0.0
        } else {
            f64::from(self.damage_made) / f64::from(self.rounds_played)
        }
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.game_start + chrono::Duration::seconds(self.game_length_secs)
    }
}

/// One entry of the ranking-history feed, joined onto match summaries by id.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RatingHistoryEntry {
    pub match_id: String,
    pub delta: i32,
    pub rating_after: i32,
    pub tier: i32,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// A maximal run of matches whose inter-match gaps stay within the
/// configured inactivity threshold. Non-empty by construction.
#[derive(Debug, Clone)]
pub struct Session {
    /// 0-based, in assignment order.
    pub index: usize,
    pub matches: Vec<MatchSummary>,
}

impl Session {
    pub fn start(&self) -> DateTime<Utc> {
        debug_assert!(!self.matches.is_empty(), "session must hold matches");
        self.matches[0].game_start
    }

    pub fn end(&self) -> DateTime<Utc> {
        debug_assert!(!self.matches.is_empty(), "session must hold matches");
        self.matches[self.matches.len() - 1].end_time()
    }

    pub fn game_count(&self) -> usize {
        self.matches.len()
    }
}

// ---------------------------------------------------------------------------
// Analytics outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HourlyPerformance {
    /// Hour of day 0-23 under the configured fixed-offset policy.
    pub hour: u32,
    pub avg_kda: f64,
    pub win_rate: f64,
    pub match_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionGameMetric {
    /// 1-based position within the session.
    pub game_number: usize,
    pub kda: f64,
    pub damage_per_round: f64,
    pub rating_delta: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionPerformance {
    pub session_index: usize,
    pub game_count: usize,
    pub total_rating_delta: i32,
    pub avg_rating_delta_per_game: f64,
    pub avg_kda: f64,
    pub games: Vec<SessionGameMetric>,
}

/// One point of a rolling statistic over the full match sequence.
#[derive(Debug, Clone, Serialize)]
pub struct RollingMetric {
    /// 0-based index into the source sequence.
    pub match_index: usize,
    pub match_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecayPoint {
    /// 1-based in-session game position.
    pub position: usize,
    pub avg_kda: f64,
}

/// Ordinary least squares fit of average KDA against in-session position.
/// All-zero when fewer than two positions qualify or the fit is degenerate.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DecayCurveModel {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination in [0,1]; 0 when variance is degenerate.
    pub r_squared: f64,
    pub points: Vec<DecayPoint>,
}

impl DecayCurveModel {
    pub fn predicted(&self, position: usize) -> f64 {
        self.slope * position as f64 + self.intercept
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentPerformance {
    pub agent: String,
    pub games: usize,
    pub avg_kda: f64,
    pub win_rate: f64,
    pub avg_damage_per_round: f64,
    /// games / total matches in the analyzed set.
    pub pick_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapPerformance {
    pub map: String,
    pub games: usize,
    pub avg_kda: f64,
    pub win_rate: f64,
    pub avg_score: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OverviewStats {
    pub total_games: usize,
    pub wins: usize,
    pub losses: usize,
    pub overall_kda: f64,
    pub win_rate: f64,
    pub total_kills: u32,
    pub total_deaths: u32,
    pub total_assists: u32,
    pub avg_damage_per_round: f64,
    pub total_rating_delta: i32,
    /// Highest-average-KDA agent among those with >= 3 games.
    pub best_agent: Option<String>,
    pub best_agent_kda: f64,
    /// Lowest-win-rate map among those with >= 3 games.
    pub worst_map: Option<String>,
    pub worst_map_win_rate: f64,
    pub longest_win_streak: usize,
    pub longest_loss_streak: usize,
    /// Positive = active win streak, negative = active loss streak,
    /// 0 only when there are no matches.
    pub current_streak: i32,
}

// ---------------------------------------------------------------------------
// Fatigue classification, a presentation label over the decay model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatigueTrend {
    /// Slope below the significant threshold: performance visibly degrades
    /// the longer a session runs.
    Significant,
    /// Negative slope, but above the threshold.
    Mild,
    /// Flat or improving.
    Stable,
}

impl FatigueTrend {
    pub fn from_slope(slope: f64) -> Self {
        use crate::config::fatigue_thresholds::*;
        if slope < SIGNIFICANT_SLOPE {
            FatigueTrend::Significant
        } else if slope < 0.0 {
            FatigueTrend::Mild
        } else {
            FatigueTrend::Stable
        }
    }
}

impl std::fmt::Display for FatigueTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FatigueTrend::Significant => "significant",
            FatigueTrend::Mild => "mild",
            FatigueTrend::Stable => "stable",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Report: everything the presentation layer needs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Report {
    pub player: PlayerIdentity,
    pub match_count: usize,
    pub overview: OverviewStats,
    pub hourly: Vec<HourlyPerformance>,
    pub sessions: Vec<SessionPerformance>,
    pub rolling_kda: Vec<RollingMetric>,
    pub rolling_win_rate: Vec<RollingMetric>,
    pub decay: DecayCurveModel,
    pub agents: Vec<AgentPerformance>,
    pub maps: Vec<MapPerformance>,
}
