use crate::error::{AppError, Result};

pub const API_BASE_URL: &str = "https://api.henrikdev.xyz";

/// Stored-matches index page size; the provider caps list responses at 50.
pub const MATCH_PAGE_SIZE: usize = 50;

/// Throttle defaults: the provider's free tier allows 30 requests per minute.
pub const THROTTLE_MAX_REQUESTS: usize = 30;
pub const THROTTLE_WINDOW_SECS: u64 = 60;

/// Bounded retry on 429 responses inside the ingestion boundary.
pub const MAX_FETCH_RETRIES: u32 = 3;

/// Rating history goes stale as the player keeps queueing; match records never do.
pub const VOLATILE_CACHE_TTL_MINS: u64 = 30;

/// Decay slope thresholds (KDA change per in-session game position).
pub mod fatigue_thresholds {
    /// Slope below this signals a meaningful fatigue trend.
    pub const SIGNIFICANT_SLOPE: f64 = -0.05;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_key: String,
    pub log_level: String,
    pub cache_dir: String,
    /// Hour-of-day bucketing offset from UTC (UTC_OFFSET_HOURS). The host
    /// timezone is never consulted, so reports are reproducible anywhere.
    pub utc_offset_hours: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_base_url: std::env::var("VALORANT_API_URL")
                .unwrap_or_else(|_| API_BASE_URL.to_string()),
            api_key: std::env::var("VALORANT_API_KEY").unwrap_or_default(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            cache_dir: std::env::var("CACHE_DIR").unwrap_or_else(|_| "data".to_string()),
            utc_offset_hours: std::env::var("UTC_OFFSET_HOURS")
                .unwrap_or_else(|_| "0".to_string())
                .parse::<i32>()
                .map_err(|_| {
                    AppError::Config("UTC_OFFSET_HOURS must be an integer".to_string())
                })
                .and_then(|h| {
                    if (-12..=14).contains(&h) {
                        Ok(h)
                    } else {
                        Err(AppError::Config(
                            "UTC_OFFSET_HOURS must be between -12 and 14".to_string(),
                        ))
                    }
                })?,
        })
    }
}
