//! Aggregate statistics over finished games.

use serde::{Deserialize, Serialize};

use crate::types::{AlgorithmId, GameRecord};

/// Summary of one algorithm's games. Averages are taken over wins only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub algorithm: String,
    pub total_games: usize,
    pub wins: usize,
    /// Percentage in `0..=100`.
    pub win_rate: f64,
    pub avg_clicks_wins: f64,
    pub avg_time_wins: f64,
    pub avg_guesses_wins: f64,
}

#[inline]
fn mean(sum: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Reduce `records` to a single summary labelled `label`.
///
/// Never produces NaN or infinity: an empty input or a run with no wins
/// reports zeros.
pub fn summarize(records: &[GameRecord], label: &str) -> GameStats {
    let total_games = records.len();
    let (mut wins, mut clicks, mut time, mut guesses) = (0usize, 0.0f64, 0.0f64, 0.0f64);
    for r in records.iter().filter(|r| r.win) {
        wins += 1;
        clicks += r.clicks as f64;
        time += r.time_ms as f64;
        guesses += r.guesses as f64;
    }

    GameStats {
        algorithm: label.to_string(),
        total_games,
        wins,
        win_rate: mean(100.0 * wins as f64, total_games),
        avg_clicks_wins: mean(clicks, wins),
        avg_time_wins: mean(time, wins),
        avg_guesses_wins: mean(guesses, wins),
    }
}

/// One summary per algorithm, in the order algorithms first appear.
pub fn summarize_by_algorithm(records: &[GameRecord]) -> Vec<GameStats> {
    let mut order: Vec<AlgorithmId> = Vec::new();
    for r in records {
        if !order.contains(&r.algorithm) {
            order.push(r.algorithm);
        }
    }
    order
        .into_iter()
        .map(|algorithm| {
            let subset: Vec<GameRecord> = records.iter().filter(|r| r.algorithm == algorithm).cloned().collect();
            summarize(&subset, algorithm.as_str())
        })
        .collect()
}

/// Highest win rate; ties go to the earlier entry.
pub fn best_by_win_rate(stats: &[GameStats]) -> Option<&GameStats> {
    stats.iter().reduce(|best, s| if s.win_rate > best.win_rate { s } else { best })
}
