use std::collections::BTreeMap;

use crate::types::{DecayCurveModel, DecayPoint, Session};

/// Denominators smaller than this are treated as degenerate variance.
const EPSILON: f64 = 1e-10;

/// Fits average KDA against 1-based in-session game position across every
/// session with at least `min_session_length` games.
///
/// Positions are averaged over all qualifying sessions that reach them, so
/// position 1 typically has the most samples and the tail the fewest. With
/// fewer than two populated positions there is nothing to fit, and the model
/// comes back zeroed, carrying whatever points were found.
pub fn decay_curve(sessions: &[Session], min_session_length: usize) -> DecayCurveModel {
    let mut by_position: BTreeMap<usize, Vec<f64>> = BTreeMap::new();

    for session in sessions {
        if session.game_count() < min_session_length {
            continue;
        }
        for (i, m) in session.matches.iter().enumerate() {
            by_position.entry(i + 1).or_default().push(m.kda());
        }
    }

    let mut model = DecayCurveModel::default();
    // BTreeMap iteration is already ascending by position.
    for (position, kdas) in &by_position {
        let avg = kdas.iter().sum::<f64>() / kdas.len() as f64;
        model.points.push(DecayPoint { position: *position, avg_kda: avg });
    }

    if model.points.len() < 2 {
        return model;
    }

    let n = model.points.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for p in &model.points {
        let x = p.position as f64;
        let y = p.avg_kda;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denom = n * sum_xx - sum_x * sum_x;
    if denom.abs() < EPSILON {
        return model;
    }

    model.slope = (n * sum_xy - sum_x * sum_y) / denom;
    model.intercept = (sum_y - model.slope * sum_x) / n;

    let y_mean = sum_y / n;
    let (mut ss_tot, mut ss_res) = (0.0, 0.0);
    for p in &model.points {
        let predicted = model.predicted(p.position);
        ss_tot += (p.avg_kda - y_mean) * (p.avg_kda - y_mean);
        ss_res += (p.avg_kda - predicted) * (p.avg_kda - predicted);
    }

    model.r_squared = if ss_tot > EPSILON { 1.0 - ss_res / ss_tot } else { 0.0 };
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchSummary;
    use chrono::DateTime;

    fn match_with_kda(kills: u32, deaths: u32, i: usize) -> MatchSummary {
        MatchSummary {
            match_id: format!("m-{i}"),
            map: String::new(),
            mode: String::new(),
            agent: String::new(),
            game_start: DateTime::from_timestamp(1_700_000_000 + i as i64 * 3000, 0).unwrap(),
            game_length_secs: 2400,
            kills,
            deaths,
            assists: 0,
            score: 0,
            damage_made: 0,
            rounds_played: 20,
            won: true,
            rating_delta: None,
        }
    }

    /// Session whose per-game KDA declines linearly from `start_kda`.
    fn declining_session(index: usize, games: usize, start_kda: u32) -> Session {
        let matches = (0..games)
            .map(|i| match_with_kda((start_kda - i as u32) * 10, 10, index * 100 + i))
            .collect();
        Session { index, matches }
    }

    #[test]
    fn short_sessions_contribute_no_points() {
        let sessions = vec![declining_session(0, 2, 5)];
        let model = decay_curve(&sessions, 3);
        assert!(model.points.is_empty());
        assert_eq!(model.slope, 0.0);
        assert_eq!(model.intercept, 0.0);
        assert_eq!(model.r_squared, 0.0);
    }

    #[test]
    fn points_are_sorted_ascending_by_position() {
        let sessions = vec![declining_session(0, 5, 8), declining_session(1, 3, 8)];
        let model = decay_curve(&sessions, 3);

        assert_eq!(model.points.len(), 5);
        for pair in model.points.windows(2) {
            assert!(pair[0].position < pair[1].position);
        }
        // Positions 1-3 average two sessions, 4-5 only the longer one.
        assert_eq!(model.points[0].position, 1);
        assert_eq!(model.points[4].position, 5);
    }

    #[test]
    fn declining_performance_fits_a_negative_slope() {
        // Exact line: KDA 8, 7, 6, 5, 4 at positions 1..=5.
        let sessions = vec![declining_session(0, 5, 8)];
        let model = decay_curve(&sessions, 3);

        assert!((model.slope + 1.0).abs() < 1e-9, "slope={}", model.slope);
        assert!((model.intercept - 9.0).abs() < 1e-9);
        assert!((model.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn r_squared_stays_in_unit_interval_for_noisy_data() {
        let kdas = [30u32, 10, 25, 5, 20];
        let matches: Vec<_> = kdas
            .iter()
            .enumerate()
            .map(|(i, &k)| match_with_kda(k, 10, i))
            .collect();
        let model = decay_curve(&[Session { index: 0, matches }], 3);

        assert!(model.points.len() == 5);
        assert!((0.0..=1.0).contains(&model.r_squared), "r2={}", model.r_squared);
    }

    #[test]
    fn constant_performance_is_degenerate_not_nan() {
        let matches: Vec<_> = (0..4).map(|i| match_with_kda(20, 10, i)).collect();
        let model = decay_curve(&[Session { index: 0, matches }], 3);

        assert_eq!(model.slope, 0.0);
        assert_eq!(model.r_squared, 0.0);
        assert!(model.r_squared.is_finite());
    }

    #[test]
    fn no_sessions_means_empty_model() {
        let model = decay_curve(&[], 3);
        assert!(model.points.is_empty());
        assert_eq!(model.slope, 0.0);
    }
}
