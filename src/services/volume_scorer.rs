//! Volume confirmation for the MACD expansion pattern
//!
//! Three independent checks feed a 0-10 score:
//!
//! | Check              | Measure                                    | Points  |
//! |--------------------|--------------------------------------------|---------|
//! | Relative volume    | latest volume / MA20 of volume             | 0, 2, 4 |
//! | Order flow         | taker buy (quote) / (volume x close), in % | 0, 2, 4 |
//! | Sustainment        | mean volume since reversal vs 0.9 x MA20   | 0, 2    |
//!
//! The taker buy volume is quote-denominated, so `volume x close` serves as
//! the quote volume approximation.

use crate::constants::{
    MIN_CANDLES_FOR_VOLUME, TAKER_BUY_NEUTRAL_THRESHOLD, VOLUME_MA_PERIOD, VOLUME_SCORE_MODERATE,
    VOLUME_SCORE_STRONG, VOLUME_SUSTAIN_FACTOR,
};
use crate::models::indicators::calculate_sma;
use crate::models::{CandleSeries, VolumeAssessment, VolumeBreakdown, VolumeThresholds};

/// Score the volume behind the latest candle
///
/// # Arguments
/// * `series` - Candle history, at least 25 candles for a non-zero score
/// * `reversal_index` - Index of the last zero-line cross, if any
/// * `thresholds` - Relative volume and taker buy thresholds
pub fn score_volume(
    series: &CandleSeries,
    reversal_index: Option<usize>,
    thresholds: &VolumeThresholds,
) -> VolumeAssessment {
    let last = match series.last() {
        Some(last) if series.len() >= MIN_CANDLES_FOR_VOLUME => last,
        _ => {
            return VolumeAssessment {
                narrative: format!(
                    "Insufficient data for volume analysis ({} candles, need {})",
                    series.len(),
                    MIN_CANDLES_FOR_VOLUME
                ),
                ..Default::default()
            }
        }
    };

    let volumes = series.volumes();
    let volume_ma = calculate_sma(&volumes, VOLUME_MA_PERIOD)
        .last()
        .copied()
        .unwrap_or(0.0);

    // 1. Relative volume
    let ratio = if volume_ma > 0.0 {
        last.volume / volume_ma
    } else {
        0.0
    };

    // 2. Taker buy share
    let quote_volume = last.volume * last.close;
    let taker_ratio = if quote_volume > 0.0 {
        last.taker_buy_volume / quote_volume * 100.0
    } else {
        50.0
    };

    // 3. Volume sustained since the reversal
    let sustained = match reversal_index {
        Some(idx) if idx < volumes.len() => {
            let since = &volumes[idx..];
            let avg_since = since.iter().sum::<f64>() / since.len() as f64;
            avg_since > volume_ma * VOLUME_SUSTAIN_FACTOR
        }
        _ => false,
    };

    let mut reasons = Vec::with_capacity(3);

    let relative_volume = if ratio >= thresholds.strong {
        reasons.push(format!("volume {:.1}x average (strong)", ratio));
        4
    } else if ratio >= thresholds.moderate {
        reasons.push(format!("volume {:.1}x average (moderate)", ratio));
        2
    } else {
        reasons.push(format!("volume {:.1}x average (weak)", ratio));
        0
    };

    let order_flow = if taker_ratio >= thresholds.taker_buy {
        reasons.push(format!("taker buy {:.0}% (institutional)", taker_ratio));
        4
    } else if taker_ratio >= TAKER_BUY_NEUTRAL_THRESHOLD {
        reasons.push(format!("taker buy {:.0}% (neutral)", taker_ratio));
        2
    } else {
        reasons.push(format!("taker buy {:.0}% (retail)", taker_ratio));
        0
    };

    let sustainment = if sustained {
        reasons.push("volume sustained since reversal".to_string());
        2
    } else {
        reasons.push("volume not sustained since reversal".to_string());
        0
    };

    let breakdown = VolumeBreakdown {
        relative_volume,
        order_flow,
        sustainment,
    };
    let score = breakdown.total();

    let label = if score >= VOLUME_SCORE_STRONG {
        "STRONG"
    } else if score >= VOLUME_SCORE_MODERATE {
        "MODERATE"
    } else {
        "WEAK"
    };

    let narrative = format!(
        "Volume {} ({:.1}x) + Taker Buy {:.0}% [{}/10: {}]",
        label,
        ratio,
        taker_ratio,
        score,
        reasons.join(", ")
    );

    VolumeAssessment {
        score,
        ratio,
        taker_ratio,
        sustained,
        breakdown,
        narrative,
    }
}
