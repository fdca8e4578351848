use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::RecordCache;
use crate::config::{Config, MATCH_PAGE_SIZE, MAX_FETCH_RETRIES};
use crate::error::{AppError, Result};
use crate::ingest::parse;
use crate::throttle::RequestThrottle;
use crate::types::{MatchSummary, PlayerIdentity, RatingHistoryEntry};

/// Progress callback `(done, total)` for surfaces that show fetch progress.
pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// The network boundary: every outbound call goes through the shared
/// throttle, match records go through the durable cache, and the ranking
/// history goes through the freshness-windowed one. Downstream analytics
/// only ever sees the ordered, deduplicated `MatchSummary` sequence.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    throttle: Arc<RequestThrottle>,
    cache: RecordCache,
}

impl ApiClient {
    pub fn new(cfg: &Config, throttle: Arc<RequestThrottle>, cache: RecordCache) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: cfg.api_base_url.clone(),
            api_key: cfg.api_key.clone(),
            throttle: Arc::clone(&throttle),
            cache,
        })
    }

    /// One GET against the provider, with bounded retry on throttling
    /// responses. Returns the response's `data` envelope when present.
    async fn fetch_endpoint(&self, path: &str) -> Result<Value> {
        for attempt in 0..MAX_FETCH_RETRIES {
            self.throttle.acquire().await;

            let mut request = self.http.get(format!("{}{}", self.base_url, path));
            if !self.api_key.is_empty() {
                request = request.header("Authorization", &self.api_key);
            }

            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let backoff = Duration::from_secs(2 * u64::from(attempt + 1));
                debug!("throttled by provider on {path}, backing off {backoff:?}");
                tokio::time::sleep(backoff).await;
                continue;
            }

            if !status.is_success() {
                return Err(AppError::Api {
                    status: status.as_u16(),
                    message: provider_error_message(&body)
                        .unwrap_or_else(|| "unexpected response".to_string()),
                });
            }

            let value: Value = serde_json::from_str(&body)?;
            return Ok(value.get("data").cloned().unwrap_or(value));
        }

        Err(AppError::Api {
            status: 429,
            message: "rate limited after retries".to_string(),
        })
    }

    pub async fn fetch_account(&self, name: &str, tag: &str) -> Result<PlayerIdentity> {
        let payload = self
            .fetch_endpoint(&format!("/valorant/v1/account/{name}/{tag}"))
            .await?;
        parse::parse_account(&payload).ok_or_else(|| AppError::Api {
            status: 200,
            message: "malformed account payload".to_string(),
        })
    }

    /// Pages the competitive stored-matches index, collecting up to `count`
    /// match ids. A failing later page degrades to the ids gathered so far.
    pub async fn fetch_match_ids(
        &self,
        region: &str,
        name: &str,
        tag: &str,
        count: usize,
    ) -> Result<Vec<String>> {
        let mut ids: Vec<String> = Vec::new();
        let mut page = 1usize;

        while ids.len() < count {
            let size = (count - ids.len()).min(MATCH_PAGE_SIZE);
            let path = format!(
                "/valorant/v1/stored-matches/{region}/{name}/{tag}?mode=competitive&size={size}&page={page}"
            );

            let payload = match self.fetch_endpoint(&path).await {
                Ok(p) => p,
                Err(e) if !ids.is_empty() => {
                    warn!("match index page {page} failed ({e}), continuing with {} ids", ids.len());
                    break;
                }
                Err(e) => return Err(e),
            };

            let page_ids = parse::parse_match_index_page(&payload);
            if page_ids.is_empty() {
                break;
            }
            let short_page = page_ids.len() < size;
            ids.extend(page_ids);
            if short_page {
                break;
            }
            page += 1;
        }

        ids.truncate(count);
        let mut seen = HashSet::new();
        ids.retain(|id| seen.insert(id.clone()));
        Ok(ids)
    }

    /// Resolves each indexed match to a full record (durable cache first,
    /// network on miss with write-through) and builds the player's ordered
    /// summary sequence. Unparseable records are skipped, not fatal.
    pub async fn fetch_matches(
        &self,
        region: &str,
        name: &str,
        tag: &str,
        puuid: &str,
        count: usize,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<Vec<MatchSummary>> {
        let ids = self.fetch_match_ids(region, name, tag, count).await?;
        let total = ids.len();

        let mut summaries = Vec::with_capacity(total);
        let mut cache_hits = 0usize;

        for (done, id) in ids.iter().enumerate() {
            let payload = match self.cache.match_record(id) {
                Some(p) => {
                    cache_hits += 1;
                    p
                }
                None => {
                    let p = self.fetch_endpoint(&format!("/valorant/v2/match/{id}")).await?;
                    self.cache.store_match_record(id, &p);
                    p
                }
            };

            match parse::parse_match_summary(&payload, puuid) {
                Some(s) => summaries.push(s),
                None => warn!("skipping unusable match record {id}"),
            }

            if let Some(cb) = progress {
                cb(done + 1, total);
            }
        }

        info!(
            indexed = total,
            fetched = total - cache_hits,
            cache_hits,
            parsed = summaries.len(),
            "match ingestion complete"
        );

        summaries.sort_by_key(|m| m.game_start);
        summaries.dedup_by(|a, b| a.match_id == b.match_id);
        Ok(summaries)
    }

    /// Ranking history for a player, honored from the volatile cache within
    /// its freshness window.
    pub async fn fetch_rating_history(
        &self,
        region: &str,
        name: &str,
        tag: &str,
        puuid: &str,
    ) -> Result<Vec<RatingHistoryEntry>> {
        if let Some(cached) = self.cache.rating_history(puuid) {
            debug!("rating history served from cache for {puuid}");
            return Ok(parse::parse_rating_history(&cached));
        }

        let payload = self
            .fetch_endpoint(&format!("/valorant/v1/mmr-history/{region}/{name}/{tag}"))
            .await?;
        if !payload.is_array() {
            return Err(AppError::Api {
                status: 200,
                message: "expected an array of rating history entries".to_string(),
            });
        }

        self.cache.store_rating_history(puuid, &payload);
        Ok(parse::parse_rating_history(&payload))
    }
}

/// Fills `rating_delta` on every summary the ranking history has an entry
/// for; the rest stay unavailable.
pub fn apply_rating_deltas(summaries: &mut [MatchSummary], history: &[RatingHistoryEntry]) {
    let by_match: HashMap<&str, i32> = history
        .iter()
        .map(|e| (e.match_id.as_str(), e.delta))
        .collect();

    for s in summaries.iter_mut() {
        if let Some(&delta) = by_match.get(s.match_id.as_str()) {
            s.rating_delta = Some(delta);
        }
    }
}

fn provider_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("errors")?
        .as_array()?
        .first()?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn summary(id: &str) -> MatchSummary {
        MatchSummary {
            match_id: id.to_string(),
            map: String::new(),
            mode: String::new(),
            agent: String::new(),
            game_start: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            game_length_secs: 0,
            kills: 0,
            deaths: 0,
            assists: 0,
            score: 0,
            damage_made: 0,
            rounds_played: 0,
            won: false,
            rating_delta: None,
        }
    }

    fn entry(id: &str, delta: i32) -> RatingHistoryEntry {
        RatingHistoryEntry {
            match_id: id.to_string(),
            delta,
            rating_after: 0,
            tier: 0,
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn rating_deltas_join_by_match_id() {
        let mut summaries = vec![summary("a"), summary("b"), summary("c")];
        let history = vec![entry("a", 17), entry("c", -12), entry("zz", 99)];

        apply_rating_deltas(&mut summaries, &history);

        assert_eq!(summaries[0].rating_delta, Some(17));
        assert_eq!(summaries[1].rating_delta, None);
        assert_eq!(summaries[2].rating_delta, Some(-12));
    }

    #[test]
    fn provider_error_message_is_extracted() {
        let body = r#"{"errors": [{"message": "player not found", "code": 24}]}"#;
        assert_eq!(provider_error_message(body).as_deref(), Some("player not found"));
        assert_eq!(provider_error_message("not json"), None);
        assert_eq!(provider_error_message(r#"{"errors": []}"#), None);
    }
}
