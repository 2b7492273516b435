use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};

use crate::error::{AppError, Result};
use crate::models::{AlertConfig, AlertHistoryRecord, CandleSeries, PatternResult, SymbolAlertState};
use crate::services::alert_machine::{transition, Transition};
use crate::services::alert_message::format_alert_message;
use crate::services::database::AlertStore;
use crate::services::market_data::CandleProvider;
use crate::services::notifier::Notifier;
use crate::services::pattern_evaluator::evaluate_pattern;

/// What happened to one symbol during a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolOutcome {
    AlertSent,
    CooldownActive,
    DeliveryFailed,
    Reset,
    NoSignal,
    /// Another writer changed the state row first
    StateConflict,
}

/// Summary of one alert cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Trading hours gate was closed, nothing evaluated
    pub skipped: bool,
    pub evaluated: usize,
    pub alerts_sent: usize,
    pub resets: usize,
    pub suppressed: usize,
    pub delivery_failures: usize,
    pub fetch_failures: usize,
    pub history_failures: usize,
    pub outcomes: Vec<(String, SymbolOutcome)>,
}

/// Runs one evaluation pass over all configured symbols
///
/// Collaborators are injected; a missing notifier counts as a failed
/// delivery so state never advances without a sent alert.
pub struct AlertWorker {
    config: AlertConfig,
    provider: Box<dyn CandleProvider>,
    notifier: Option<Box<dyn Notifier>>,
    store: Box<dyn AlertStore>,
}

impl AlertWorker {
    pub fn new(
        config: AlertConfig,
        provider: Box<dyn CandleProvider>,
        notifier: Option<Box<dyn Notifier>>,
        store: Box<dyn AlertStore>,
    ) -> Self {
        Self {
            config,
            provider,
            notifier,
            store,
        }
    }

    /// Evaluate every symbol once at `now`
    ///
    /// Per-symbol collaborator failures are logged and isolated. A store
    /// read or state write failure aborts the cycle with an error.
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleSummary> {
        info!("Starting MACD {}m check", self.config.kline_interval_minutes);

        let gate = self.config.trading_hours.check(now);
        info!("{}", gate.message);
        if !gate.open {
            info!("Skipping check, outside high-liquidity hours");
            return Ok(CycleSummary {
                skipped: true,
                ..Default::default()
            });
        }

        let mut summary = CycleSummary::default();

        for symbol in &self.config.symbols {
            let outcome = self.process_symbol(symbol, now, &mut summary).await?;
            summary.evaluated += 1;
            summary.outcomes.push((symbol.clone(), outcome));
        }

        info!(
            evaluated = summary.evaluated,
            alerts_sent = summary.alerts_sent,
            resets = summary.resets,
            suppressed = summary.suppressed,
            delivery_failures = summary.delivery_failures,
            fetch_failures = summary.fetch_failures,
            "Check completed"
        );

        Ok(summary)
    }

    async fn process_symbol(
        &self,
        symbol: &str,
        now: DateTime<Utc>,
        summary: &mut CycleSummary,
    ) -> Result<SymbolOutcome> {
        info!(symbol, "Analyzing");

        let prev = self.store.load_or_create_state(symbol).await?;

        let series = match self
            .provider
            .fetch_candles(symbol, self.config.kline_interval_minutes, self.config.kline_limit)
            .await
        {
            Ok(series) => series,
            Err(e) => {
                warn!(symbol, error = %e, "Failed to fetch candles, continuing with empty series");
                summary.fetch_failures += 1;
                CandleSeries::empty()
            }
        };

        let result = evaluate_pattern(&series, &self.config);
        info!(symbol, status = ?result.status, "{}", result.narrative);

        let step = transition(&prev, &result, now, self.config.cooldown_secs);

        match &step {
            Transition::CooldownActive { elapsed_secs } => {
                warn!(symbol, elapsed_secs = *elapsed_secs, "Cooldown active");
                summary.suppressed += 1;
                Ok(SymbolOutcome::CooldownActive)
            }
            Transition::Unchanged => {
                let status = if result.condition_met {
                    "Condition met"
                } else {
                    "Condition not met"
                };
                info!(symbol, volume_score = result.volume.score, "{} | volume score {}/10", status, result.volume.score);
                Ok(SymbolOutcome::NoSignal)
            }
            Transition::Notify { next, rearm } => {
                if let Err(e) = self.deliver(symbol, &result).await {
                    warn!(symbol, error = %e, "Alert not sent");
                    summary.delivery_failures += 1;
                    return Ok(SymbolOutcome::DeliveryFailed);
                }

                if !self.commit(symbol, &prev, next).await? {
                    return Ok(SymbolOutcome::StateConflict);
                }

                let record_time = result.timestamp.unwrap_or(now);
                self.record_history(symbol, record_time, &result, &step, summary).await;
                summary.alerts_sent += 1;
                info!(symbol, rearm = *rearm, confidence_score = result.volume.score, "ALERT FIRED");
                Ok(SymbolOutcome::AlertSent)
            }
            Transition::Reset { next } => {
                if !self.commit(symbol, &prev, next).await? {
                    return Ok(SymbolOutcome::StateConflict);
                }

                self.record_history(symbol, now, &result, &step, summary).await;
                summary.resets += 1;
                info!(symbol, "Alert state reset");
                Ok(SymbolOutcome::Reset)
            }
        }
    }

    async fn deliver(&self, symbol: &str, result: &PatternResult) -> Result<()> {
        let notifier = self
            .notifier
            .as_ref()
            .ok_or_else(|| AppError::Notification("No notifier configured".to_string()))?;

        let message = format_alert_message(symbol, self.config.kline_interval_minutes, result);
        notifier.deliver(symbol, &message).await?;
        info!(symbol, channel = notifier.name(), "Alert delivered");
        Ok(())
    }

    async fn commit(
        &self,
        symbol: &str,
        prev: &SymbolAlertState,
        next: &SymbolAlertState,
    ) -> Result<bool> {
        let swapped = self.store.compare_and_swap_state(prev, next).await?;
        if !swapped {
            error!(symbol, "Alert state changed concurrently, dropping this transition");
        }
        Ok(swapped)
    }

    /// History failures never undo the state transition they describe
    async fn record_history(
        &self,
        symbol: &str,
        timestamp: DateTime<Utc>,
        result: &PatternResult,
        step: &Transition,
        summary: &mut CycleSummary,
    ) {
        let Some(decision) = step.history_decision() else {
            return;
        };

        let record = AlertHistoryRecord::from_result(symbol, timestamp, result, decision);
        if let Err(e) = self.store.append_history(&record).await {
            warn!(symbol, decision, error = %e, "Failed to record alert history");
            summary.history_failures += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;
    use crate::services::database::SqliteAlertStore;
    use crate::services::trading_hours::TradingHours;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    /// Serves a fixed series per symbol; unknown symbols fail
    struct FixedProvider {
        series: HashMap<String, CandleSeries>,
        calls: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl CandleProvider for FixedProvider {
        async fn fetch_candles(&self, symbol: &str, _: u32, _: usize) -> Result<CandleSeries> {
            *self.calls.lock().unwrap() += 1;
            self.series
                .get(symbol)
                .cloned()
                .ok_or_else(|| AppError::Network(format!("no data for {}", symbol)))
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    /// Records deliveries, optionally failing every call
    struct RecordingNotifier {
        fail: bool,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn deliver(&self, symbol: &str, _message: &str) -> Result<()> {
            if self.fail {
                return Err(AppError::Notification("channel down".to_string()));
            }
            self.sent.lock().unwrap().push(symbol.to_string());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    /// Delegates to SQLite but refuses history writes
    struct NoHistoryStore(SqliteAlertStore);

    #[async_trait]
    impl AlertStore for NoHistoryStore {
        async fn load_or_create_state(&self, symbol: &str) -> Result<SymbolAlertState> {
            self.0.load_or_create_state(symbol).await
        }

        async fn compare_and_swap_state(&self, prev: &SymbolAlertState, next: &SymbolAlertState) -> Result<bool> {
            self.0.compare_and_swap_state(prev, next).await
        }

        async fn append_history(&self, _record: &AlertHistoryRecord) -> Result<i64> {
            Err(AppError::Database("disk full".to_string()))
        }

        async fn list_states(&self) -> Result<Vec<SymbolAlertState>> {
            self.0.list_states().await
        }

        async fn recent_history(&self, symbol: Option<&str>, limit: i64) -> Result<Vec<AlertHistoryRecord>> {
            self.0.recent_history(symbol, limit).await
        }
    }

    fn t0() -> DateTime<Utc> {
        // Wednesday, inside the 07-10 UTC window
        Utc.with_ymd_and_hms(2025, 3, 5, 8, 0, 0).unwrap()
    }

    /// Decline, reversal, drift and a final breakout candle on heavy,
    /// buyer-dominated volume: triggers with the default config
    fn breakout_series() -> CandleSeries {
        let mut closes: Vec<f64> = (0..100)
            .map(|i| {
                if i < 30 {
                    100.0 - i as f64 * 0.1
                } else if i < 50 {
                    97.0 + (i - 30) as f64 * 0.3
                } else {
                    103.0 + (i - 50) as f64 * 0.05
                }
            })
            .collect();
        closes.push(closes[99] + 15.0);
        candles_from(&closes)
    }

    /// Same history without the breakout: reversal but no expansion
    fn quiet_series() -> CandleSeries {
        let closes: Vec<f64> = (0..100)
            .map(|i| {
                if i < 30 {
                    100.0 - i as f64 * 0.1
                } else if i < 50 {
                    97.0 + (i - 30) as f64 * 0.3
                } else {
                    103.0 + (i - 50) as f64 * 0.05
                }
            })
            .collect();
        candles_from(&closes)
    }

    fn candles_from(closes: &[f64]) -> CandleSeries {
        let start = t0() - Duration::minutes(5 * closes.len() as i64);
        let n = closes.len();
        CandleSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| {
                    let volume = if i == n - 1 {
                        4000.0
                    } else if i < 30 {
                        1000.0
                    } else {
                        2000.0
                    };
                    Candle::new(start + Duration::minutes(5 * i as i64), close, volume, volume * close * 0.7)
                })
                .collect(),
        )
    }

    struct Harness {
        worker: AlertWorker,
        sent: Arc<Mutex<Vec<String>>>,
        calls: Arc<Mutex<usize>>,
        _dir: tempfile::TempDir,
        db_path: std::path::PathBuf,
    }

    async fn harness(
        series: Vec<(&str, CandleSeries)>,
        symbols: &[&str],
        notifier: Option<bool>,
        no_history: bool,
    ) -> Harness {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("alerts.db");
        let sqlite = SqliteAlertStore::new(db_path.clone()).await.unwrap();
        let store: Box<dyn AlertStore> = if no_history {
            Box::new(NoHistoryStore(sqlite))
        } else {
            Box::new(sqlite)
        };

        let sent = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(Mutex::new(0));
        let provider = FixedProvider {
            series: series.into_iter().map(|(s, c)| (s.to_string(), c)).collect(),
            calls: calls.clone(),
        };
        let notifier: Option<Box<dyn Notifier>> = notifier.map(|fail| {
            Box::new(RecordingNotifier {
                fail,
                sent: sent.clone(),
            }) as Box<dyn Notifier>
        });

        let config = AlertConfig {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };

        Harness {
            worker: AlertWorker::new(config, Box::new(provider), notifier, store),
            sent,
            calls,
            _dir: dir,
            db_path,
        }
    }

    async fn history(h: &Harness, symbol: &str) -> Vec<AlertHistoryRecord> {
        let store = SqliteAlertStore::new(h.db_path.clone()).await.unwrap();
        let rows = store.recent_history(Some(symbol), 100).await.unwrap();
        store.close().await;
        rows
    }

    #[tokio::test]
    async fn test_idle_to_alerted() {
        let h = harness(vec![("BTCUSDT", breakout_series())], &["BTCUSDT"], Some(false), false).await;

        let summary = h.worker.run_cycle(t0()).await.unwrap();
        assert_eq!(summary.outcomes, vec![("BTCUSDT".to_string(), SymbolOutcome::AlertSent)]);
        assert_eq!(summary.alerts_sent, 1);
        assert_eq!(*h.sent.lock().unwrap(), vec!["BTCUSDT".to_string()]);

        let state = h.worker.store.load_or_create_state("BTCUSDT").await.unwrap();
        assert!(state.alert_sent);
        assert_eq!(state.last_check_timestamp, t0().timestamp());
        assert_eq!(state.last_zero_cross_index, 38);
        assert!(state.volume_score >= 8);

        let rows = history(&h, "BTCUSDT").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].decision, "ALERTA_ENVIADO");
        assert_eq!(rows[0].direction.as_deref(), Some("bullish"));
    }

    #[tokio::test]
    async fn test_cooldown_then_rearm() {
        let h = harness(vec![("BTCUSDT", breakout_series())], &["BTCUSDT"], Some(false), false).await;

        h.worker.run_cycle(t0()).await.unwrap();
        let alerted = h.worker.store.load_or_create_state("BTCUSDT").await.unwrap();

        // T+500s: inside cooldown, nothing changes
        let summary = h.worker.run_cycle(t0() + Duration::seconds(500)).await.unwrap();
        assert_eq!(summary.outcomes[0].1, SymbolOutcome::CooldownActive);
        assert_eq!(h.sent.lock().unwrap().len(), 1);
        assert_eq!(h.worker.store.load_or_create_state("BTCUSDT").await.unwrap(), alerted);
        assert_eq!(history(&h, "BTCUSDT").await.len(), 1);

        // T+1000s: cooldown elapsed, alert again
        let later = t0() + Duration::seconds(1000);
        let summary = h.worker.run_cycle(later).await.unwrap();
        assert_eq!(summary.outcomes[0].1, SymbolOutcome::AlertSent);
        assert_eq!(h.sent.lock().unwrap().len(), 2);

        let state = h.worker.store.load_or_create_state("BTCUSDT").await.unwrap();
        assert!(state.alert_sent);
        assert_eq!(state.last_check_timestamp, later.timestamp());
        assert_eq!(history(&h, "BTCUSDT").await.len(), 2);
    }

    #[tokio::test]
    async fn test_alerted_resets_once() {
        let h = harness(vec![("BTCUSDT", quiet_series())], &["BTCUSDT"], Some(false), false).await;

        let alerted = SymbolAlertState {
            alert_sent: true,
            last_check_timestamp: t0().timestamp() - 300,
            volume_score: 8,
            ..h.worker.store.load_or_create_state("BTCUSDT").await.unwrap()
        };
        let fresh = SymbolAlertState::new("BTCUSDT");
        assert!(h.worker.store.compare_and_swap_state(&fresh, &alerted).await.unwrap());

        let summary = h.worker.run_cycle(t0()).await.unwrap();
        assert_eq!(summary.outcomes[0].1, SymbolOutcome::Reset);
        assert!(!h.worker.store.load_or_create_state("BTCUSDT").await.unwrap().alert_sent);

        // Second quiet cycle is a no-op
        let summary = h.worker.run_cycle(t0() + Duration::seconds(300)).await.unwrap();
        assert_eq!(summary.outcomes[0].1, SymbolOutcome::NoSignal);

        let rows = history(&h, "BTCUSDT").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].decision, "RESET");
        assert!(h.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_state() {
        let h = harness(vec![("BTCUSDT", breakout_series())], &["BTCUSDT"], Some(true), false).await;

        let summary = h.worker.run_cycle(t0()).await.unwrap();
        assert_eq!(summary.outcomes[0].1, SymbolOutcome::DeliveryFailed);
        assert_eq!(summary.delivery_failures, 1);

        let state = h.worker.store.load_or_create_state("BTCUSDT").await.unwrap();
        assert_eq!(state, SymbolAlertState::new("BTCUSDT"));
        assert!(history(&h, "BTCUSDT").await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_notifier_is_delivery_failure() {
        let h = harness(vec![("BTCUSDT", breakout_series())], &["BTCUSDT"], None, false).await;

        let summary = h.worker.run_cycle(t0()).await.unwrap();
        assert_eq!(summary.outcomes[0].1, SymbolOutcome::DeliveryFailed);
        assert!(!h.worker.store.load_or_create_state("BTCUSDT").await.unwrap().alert_sent);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_isolated() {
        let h = harness(
            vec![("ETHUSDT", breakout_series())],
            &["BTCUSDT", "ETHUSDT"],
            Some(false),
            false,
        )
        .await;

        let summary = h.worker.run_cycle(t0()).await.unwrap();
        assert_eq!(summary.fetch_failures, 1);
        assert_eq!(
            summary.outcomes,
            vec![
                ("BTCUSDT".to_string(), SymbolOutcome::NoSignal),
                ("ETHUSDT".to_string(), SymbolOutcome::AlertSent),
            ]
        );
        assert_eq!(*h.sent.lock().unwrap(), vec!["ETHUSDT".to_string()]);
    }

    #[tokio::test]
    async fn test_history_failure_does_not_block_transition() {
        let h = harness(vec![("BTCUSDT", breakout_series())], &["BTCUSDT"], Some(false), true).await;

        let summary = h.worker.run_cycle(t0()).await.unwrap();
        assert_eq!(summary.outcomes[0].1, SymbolOutcome::AlertSent);
        assert_eq!(summary.history_failures, 1);
        assert!(h.worker.store.load_or_create_state("BTCUSDT").await.unwrap().alert_sent);
    }

    #[tokio::test]
    async fn test_outside_trading_hours_skips_everything() {
        let h = harness(vec![("BTCUSDT", breakout_series())], &["BTCUSDT"], Some(false), false).await;

        let night = Utc.with_ymd_and_hms(2025, 3, 5, 2, 0, 0).unwrap();
        let summary = h.worker.run_cycle(night).await.unwrap();
        assert!(summary.skipped);
        assert_eq!(summary.evaluated, 0);
        assert_eq!(*h.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_custom_trading_hours() {
        let mut h = harness(vec![("BTCUSDT", breakout_series())], &["BTCUSDT"], Some(false), false).await;
        h.worker.config.trading_hours = TradingHours::always_open();

        let night = Utc.with_ymd_and_hms(2025, 3, 5, 2, 0, 0).unwrap();
        let summary = h.worker.run_cycle(night).await.unwrap();
        assert!(!summary.skipped);
        assert_eq!(summary.evaluated, 1);
    }
}
