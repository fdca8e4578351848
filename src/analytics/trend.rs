use crate::types::{MatchSummary, RollingMetric};

/// Trailing simple moving average of `selector` over the match sequence.
///
/// The window only shrinks when the whole sequence is shorter than the
/// configured size (effective window = min(window, n)), never mid-sequence,
/// so the output always has max(0, n - effective_window + 1) points.
pub fn rolling_average<F>(matches: &[MatchSummary], window: usize, selector: F) -> Vec<RollingMetric>
where
    F: Fn(&MatchSummary) -> f64,
{
    let n = matches.len();
    if n == 0 || window == 0 {
        return Vec::new();
    }
    let effective_window = window.min(n);

    matches
        .windows(effective_window)
        .enumerate()
        .map(|(i, slice)| {
            let sum: f64 = slice.iter().map(&selector).sum();
            let last = i + effective_window - 1;
            RollingMetric {
                match_index: last,
                match_id: matches[last].match_id.clone(),
                value: sum / effective_window as f64,
            }
        })
        .collect()
}

pub fn rolling_kda(matches: &[MatchSummary], window: usize) -> Vec<RollingMetric> {
    rolling_average(matches, window, MatchSummary::kda)
}

pub fn rolling_win_rate(matches: &[MatchSummary], window: usize) -> Vec<RollingMetric> {
    rolling_average(matches, window, |m| if m.won { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn match_with(kills: u32, deaths: u32, won: bool, i: usize) -> MatchSummary {
        MatchSummary {
            match_id: format!("m-{i}"),
            map: String::new(),
            mode: String::new(),
            agent: String::new(),
            game_start: DateTime::from_timestamp(1_700_000_000 + i as i64 * 3600, 0).unwrap(),
            game_length_secs: 2400,
            kills,
            deaths,
            assists: 0,
            score: 0,
            damage_made: 0,
            rounds_played: 20,
            won,
            rating_delta: None,
        }
    }

    #[test]
    fn output_length_follows_the_window_formula() {
        let matches: Vec<_> = (0..10).map(|i| match_with(10, 10, true, i)).collect();
        assert_eq!(rolling_kda(&matches, 5).len(), 6);
        assert_eq!(rolling_kda(&matches, 10).len(), 1);
        assert_eq!(rolling_kda(&matches, 1).len(), 10);
    }

    #[test]
    fn oversized_window_clamps_to_sequence_length() {
        let matches: Vec<_> = (0..3).map(|i| match_with(10, 10, true, i)).collect();
        let metrics = rolling_kda(&matches, 20);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].match_index, 2);
        assert_eq!(metrics[0].match_id, "m-2");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(rolling_kda(&[], 20).is_empty());
    }

    #[test]
    fn win_rate_is_bounded_and_saturates() {
        let wins: Vec<_> = (0..6).map(|i| match_with(10, 10, true, i)).collect();
        assert!(rolling_win_rate(&wins, 3).iter().all(|m| m.value == 1.0));

        let losses: Vec<_> = (0..6).map(|i| match_with(10, 10, false, i)).collect();
        assert!(rolling_win_rate(&losses, 3).iter().all(|m| m.value == 0.0));

        let mixed: Vec<_> = (0..8)
            .map(|i| match_with(10, 10, i % 2 == 0, i))
            .collect();
        for m in rolling_win_rate(&mixed, 4) {
            assert!((0.0..=1.0).contains(&m.value));
        }
    }

    #[test]
    fn kda_window_averages_the_trailing_values() {
        // KDA per match is 2.0, 1.0, 3.0; trailing pairs average 1.5 and 2.0.
        let matches = vec![
            match_with(20, 10, true, 0),
            match_with(10, 10, true, 1),
            match_with(30, 10, true, 2),
        ];
        let metrics = rolling_kda(&matches, 2);
        assert_eq!(metrics.len(), 2);
        assert!((metrics[0].value - 1.5).abs() < 1e-9);
        assert!((metrics[1].value - 2.0).abs() < 1e-9);
        assert_eq!(metrics[0].match_index, 1);
        assert_eq!(metrics[1].match_index, 2);
    }
}
