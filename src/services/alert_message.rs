use crate::models::{Direction, PatternResult};

/// Confidence shown in alerts: 20% base plus 10% per volume point, capped at 100
pub fn confidence_percent(volume_score: u8) -> u8 {
    (volume_score as u32 * 10 + 20).min(100) as u8
}

fn confidence_label(confidence: u8) -> (&'static str, &'static str) {
    if confidence >= 80 {
        ("💎", "HIGH")
    } else if confidence >= 60 {
        ("✅", "MEDIUM-HIGH")
    } else {
        ("⚠️", "MEDIUM")
    }
}

/// Render the Markdown alert for a triggered pattern
pub fn format_alert_message(symbol: &str, interval_minutes: u32, result: &PatternResult) -> String {
    let confidence = confidence_percent(result.volume.score);
    let (emoji, label) = confidence_label(confidence);
    let direction = result.direction().unwrap_or(Direction::Bullish);
    let action = match direction {
        Direction::Bullish => format!("🔼 {}", direction.trade_side()),
        Direction::Bearish => format!("🔽 {}", direction.trade_side()),
    };
    let time = result
        .timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "n/a".to_string());

    format!(
        "🚨 *MACD {interval}m ALERT* {symbol}\n\
         ━━━━━━━━━━━━━━━━━━━━━━━\n\
         🕗 Time (UTC): {time}\n\
         📊 Pattern: Zero Line Cross + 2x Expansion\n\
         📈 Current distance: {distance:.4}\n\
         📏 Histogram peak: {peak:.4}\n\
         ✅ Condition: {distance:.4} ≥ 2×{peak:.4} ({ratio:.1}x)\n\
         💧 Volume: {volume_ratio:.1}x average\n\
         🏦 Taker Buy: {taker:.0}%\n\
         {emoji} Confidence: {label} ({confidence}%)\n\
         💡 Suggested action: {action}\n\
         ⚠️ *Validation:* only trade with additional confirmation",
        interval = interval_minutes,
        symbol = symbol,
        time = time,
        distance = result.distance,
        peak = result.peak_histogram,
        ratio = result.distance_ratio,
        volume_ratio = result.volume.ratio,
        taker = result.volume.taker_ratio,
        emoji = emoji,
        label = label,
        confidence = confidence,
        action = action,
    )
}
