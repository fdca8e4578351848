use std::sync::Arc;

use tokio::sync::mpsc;

use crate::analytics::{self, AnalyticsOptions};
use crate::ingest::{apply_rating_deltas, ApiClient};
use crate::types::Report;

// ---------------------------------------------------------------------------
// Background ingestion
// ---------------------------------------------------------------------------

/// Progress and outcome of the background fetch task.
#[derive(Debug)]
pub enum LoadEvent {
    Status(String),
    Finished(Box<Report>),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct FetchParams {
    pub region: String,
    pub match_count: usize,
    pub options: AnalyticsOptions,
}

/// Runs the whole ingestion pipeline on a spawned task, reporting progress
/// over the channel. If the receiver goes away (the user backed out) the
/// task still runs to completion; the sends just land nowhere and the
/// result is discarded.
pub fn spawn_fetch(
    client: Arc<ApiClient>,
    params: FetchParams,
    name: String,
    tag: String,
) -> mpsc::UnboundedReceiver<LoadEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let _ = tx.send(LoadEvent::Status(format!("Looking up {name}#{tag}...")));

        let account = match client.fetch_account(&name, &tag).await {
            Ok(a) => a,
            Err(e) => {
                let _ = tx.send(LoadEvent::Failed(format!("Account lookup failed: {e}")));
                return;
            }
        };

        let _ = tx.send(LoadEvent::Status(format!(
            "Fetching up to {} matches...",
            params.match_count
        )));

        let progress_tx = tx.clone();
        let progress = move |done: usize, total: usize| {
            let _ = progress_tx.send(LoadEvent::Status(format!(
                "Fetched {done}/{total} matches..."
            )));
        };

        let mut matches = match client
            .fetch_matches(
                &params.region,
                &name,
                &tag,
                &account.puuid,
                params.match_count,
                Some(&progress),
            )
            .await
        {
            Ok(m) => m,
            Err(e) => {
                let _ = tx.send(LoadEvent::Failed(format!("Match fetch failed: {e}")));
                return;
            }
        };

        if matches.is_empty() {
            let _ = tx.send(LoadEvent::Failed("No competitive matches found.".to_string()));
            return;
        }

        let _ = tx.send(LoadEvent::Status("Fetching rating history...".to_string()));
        match client
            .fetch_rating_history(&params.region, &name, &tag, &account.puuid)
            .await
        {
            Ok(history) => apply_rating_deltas(&mut matches, &history),
            // Rating deltas are optional enrichment; the report still works.
            Err(e) => {
                let _ = tx.send(LoadEvent::Status(format!(
                    "Rating history unavailable ({e}), continuing..."
                )));
            }
        }

        let _ = tx.send(LoadEvent::Status("Computing analytics...".to_string()));
        let report = analytics::build_report(account, &matches, &params.options);
        let _ = tx.send(LoadEvent::Finished(Box::new(report)));
    });

    rx
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

pub const TAB_LABELS: &[&str] = &[
    "Overview",
    "Hourly",
    "Agents",
    "Maps",
    "Sessions",
    "Rating",
    "Rolling KDA",
    "Rolling WR",
    "Decay",
];

#[derive(Debug)]
pub enum View {
    Search,
    Loading,
    Report,
}

pub struct AppState {
    pub view: View,
    /// Search input buffer ("name#tag").
    pub input: String,
    /// Validation or fetch-failure message shown on the search screen.
    pub error: Option<String>,
    /// Latest status line from the background fetch.
    pub load_status: String,
    pub report: Option<Report>,
    pub selected_tab: usize,
    /// Row selection for the active tab's table.
    pub row: usize,
    rx: Option<mpsc::UnboundedReceiver<LoadEvent>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            view: View::Search,
            input: String::new(),
            error: None,
            load_status: String::new(),
            report: None,
            selected_tab: 0,
            row: 0,
            rx: None,
        }
    }

    /// Validates the search buffer as `name#tag`.
    pub fn parse_riot_id(&self) -> Option<(String, String)> {
        let (name, tag) = self.input.split_once('#')?;
        if name.is_empty() || tag.is_empty() {
            return None;
        }
        Some((name.to_string(), tag.to_string()))
    }

    pub fn begin_loading(&mut self, rx: mpsc::UnboundedReceiver<LoadEvent>) {
        self.view = View::Loading;
        self.error = None;
        self.load_status = "Starting...".to_string();
        self.rx = Some(rx);
    }

    /// Abandon a pending fetch: drop the channel and go back to the search
    /// screen. The task itself keeps running detached.
    pub fn cancel_loading(&mut self) {
        self.rx = None;
        self.view = View::Search;
    }

    pub fn back_to_search(&mut self) {
        self.report = None;
        self.selected_tab = 0;
        self.row = 0;
        self.view = View::Search;
    }

    /// Applies everything the background task has sent since the last tick.
    pub fn drain_load_events(&mut self) {
        let Some(rx) = self.rx.as_mut() else { return };

        loop {
            match rx.try_recv() {
                Ok(LoadEvent::Status(s)) => self.load_status = s,
                Ok(LoadEvent::Finished(report)) => {
                    self.report = Some(*report);
                    self.selected_tab = 0;
                    self.row = 0;
                    self.view = View::Report;
                    self.rx = None;
                    return;
                }
                Ok(LoadEvent::Failed(msg)) => {
                    self.error = Some(msg);
                    self.view = View::Search;
                    self.rx = None;
                    return;
                }
                Err(mpsc::error::TryRecvError::Empty) => return,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.error = Some("fetch task ended unexpectedly".to_string());
                    self.view = View::Search;
                    self.rx = None;
                    return;
                }
            }
        }
    }

    pub fn next_tab(&mut self) {
        self.selected_tab = (self.selected_tab + 1) % TAB_LABELS.len();
        self.row = 0;
    }

    pub fn prev_tab(&mut self) {
        self.selected_tab = (self.selected_tab + TAB_LABELS.len() - 1) % TAB_LABELS.len();
        self.row = 0;
    }

    /// Row count of the table shown on the active tab, for selection clamping.
    pub fn active_row_count(&self) -> usize {
        let Some(report) = &self.report else { return 0 };
        match self.selected_tab {
            1 => report.hourly.len(),
            2 => report.agents.len(),
            3 => report.maps.len(),
            4 => report.sessions.iter().map(|s| s.games.len()).sum(),
            5 => report.sessions.len(),
            6 => report.rolling_kda.len(),
            7 => report.rolling_win_rate.len(),
            8 => report.decay.points.len(),
            _ => 0,
        }
    }

    pub fn row_down(&mut self) {
        let max = self.active_row_count().saturating_sub(1);
        self.row = (self.row + 1).min(max);
    }

    pub fn row_up(&mut self) {
        self.row = self.row.saturating_sub(1);
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn riot_id_parsing_rejects_bad_input() {
        let mut app = AppState::new();
        for bad in ["", "noseparator", "#tag", "name#"] {
            app.input = bad.to_string();
            assert!(app.parse_riot_id().is_none(), "accepted {bad:?}");
        }

        app.input = "TenZ#0505".to_string();
        assert_eq!(app.parse_riot_id(), Some(("TenZ".to_string(), "0505".to_string())));
    }

    #[test]
    fn tab_cycling_wraps() {
        let mut app = AppState::new();
        app.prev_tab();
        assert_eq!(app.selected_tab, TAB_LABELS.len() - 1);
        app.next_tab();
        assert_eq!(app.selected_tab, 0);
    }

    #[test]
    fn truncate_preserves_short_strings() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer string", 8), "a longe…");
    }
}
