use crate::models::{Direction, ReversalEvent};

/// Find the most recent MACD zero-line cross
///
/// Scans backwards from the latest sample and returns the first pair
/// `(macd[i-1], macd[i])` that changes side:
/// - `< 0` to `>= 0` is bullish
/// - `> 0` to `<= 0` is bearish
///
/// Samples at indices `0..=guard` are never reported as the cross point
/// (index `guard` may still act as the "previous" sample).
pub fn find_last_zero_cross(macd: &[f64], guard: usize) -> Option<ReversalEvent> {
    (guard + 1..macd.len()).rev().find_map(|i| {
        let prev = macd[i - 1];
        let curr = macd[i];

        if prev < 0.0 && curr >= 0.0 {
            Some(ReversalEvent {
                index: i,
                direction: Direction::Bullish,
            })
        } else if prev > 0.0 && curr <= 0.0 {
            Some(ReversalEvent {
                index: i,
                direction: Direction::Bearish,
            })
        } else {
            None
        }
    })
}
