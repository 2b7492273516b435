use tracing::debug;

use crate::constants::MIN_CANDLES_FOR_PATTERN;
use crate::models::indicators::calculate_macd;
use crate::models::{AlertConfig, CandleSeries, Direction, PatternResult, PatternStatus};
use crate::services::reversal::find_last_zero_cross;
use crate::services::volume_scorer::score_volume;

/// Evaluate the zero-cross expansion pattern on one candle series
///
/// Steps:
/// 1. MACD over the closes
/// 2. Most recent zero-line cross
/// 3. Peak |histogram| from the cross up to the candle before the latest.
///    The latest sample is left out: if it were part of the window the
///    peak could never be below the current distance, so the ratio would
///    be capped at 1.0 and no expansion could ever be detected.
/// 4. Current distance |macd - signal| against that peak
/// 5. Volume confirmation
///
/// `condition_met` requires `distance / peak >= expansion_ratio`;
/// `triggered` additionally requires `volume score >= min_volume_score`.
pub fn evaluate_pattern(series: &CandleSeries, config: &AlertConfig) -> PatternResult {
    let last_time = series.last().map(|c| c.timestamp);

    if series.len() < MIN_CANDLES_FOR_PATTERN {
        return PatternResult::inconclusive(
            PatternStatus::InsufficientData,
            last_time,
            format!(
                "Insufficient data ({} candles, need {})",
                series.len(),
                MIN_CANDLES_FOR_PATTERN
            ),
        );
    }

    let macd = calculate_macd(
        &series.closes(),
        config.macd_fast,
        config.macd_slow,
        config.macd_signal,
    );

    let reversal = match find_last_zero_cross(&macd.macd, config.reversal_guard) {
        Some(reversal) => reversal,
        None => {
            return PatternResult::inconclusive(
                PatternStatus::NoReversal,
                last_time,
                "No recent zero line cross",
            )
        }
    };

    let last_index = macd.len() - 1;
    let peak_window = &macd.histogram[reversal.index..last_index];
    if peak_window.is_empty() {
        return PatternResult {
            reversal: Some(reversal),
            ..PatternResult::inconclusive(
                PatternStatus::NoPostReversalData,
                last_time,
                "No data after reversal",
            )
        };
    }

    let peak_histogram = peak_window.iter().map(|h| h.abs()).fold(0.0, f64::max);

    let (distance, current_histogram) = match macd.last() {
        Some(p) => ((p.macd - p.signal).abs(), p.histogram.abs()),
        None => (0.0, 0.0),
    };
    let distance_ratio = if peak_histogram > 0.0 {
        distance / peak_histogram
    } else {
        0.0
    };
    let condition_met = distance_ratio >= config.expansion_ratio;

    let volume = score_volume(series, Some(reversal.index), &config.volume);
    let triggered = condition_met && volume.score >= config.min_volume_score;

    let cross_time = series.candles()[reversal.index]
        .timestamp
        .format("%H:%M");
    let narrative = format!(
        "Direction: {} | Zero cross: {} | Peak hist: {:.4} | Current distance: {:.4} ({:.1}x) | {}",
        match reversal.direction {
            Direction::Bullish => "Bullish",
            Direction::Bearish => "Bearish",
        },
        cross_time,
        peak_histogram,
        distance,
        distance_ratio,
        volume.narrative
    );

    debug!(
        reversal_index = reversal.index,
        peak_histogram,
        current_histogram,
        distance_ratio,
        volume_score = volume.score,
        "Pattern evaluated"
    );

    PatternResult {
        status: PatternStatus::Evaluated,
        triggered,
        condition_met,
        timestamp: last_time,
        reversal: Some(reversal),
        distance,
        peak_histogram,
        distance_ratio,
        volume,
        narrative,
    }
}
