use chrono::Duration;

use crate::types::{MatchSummary, Session};

/// Splits a chronologically-sorted match sequence into sessions wherever the
/// idle gap between one match's end and the next match's start exceeds
/// `gap_threshold`.
///
/// Ordering is the caller's contract (ingestion sorts); this function does
/// not re-sort. The gap is signed: overlapping or slightly out-of-order
/// timestamps produce a negative gap, which never splits. The output
/// partitions the input: concatenating all sessions' matches in order
/// reproduces it exactly.
pub fn segment(matches: &[MatchSummary], gap_threshold: Duration) -> Vec<Session> {
    if matches.is_empty() {
        return Vec::new();
    }

    let mut sessions: Vec<Session> = Vec::new();
    let mut current = Session { index: 0, matches: vec![matches[0].clone()] };

    for m in &matches[1..] {
        let session_end = current.end();
        let gap = m.game_start - session_end;

        if gap > gap_threshold {
            let next_index = current.index + 1;
            sessions.push(current);
            current = Session { index: next_index, matches: Vec::new() };
        }
        current.matches.push(m.clone());
    }

    sessions.push(current);
    sessions
}
