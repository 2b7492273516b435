pub mod alert_machine;
pub mod alert_message;
pub mod binance_klines;
pub mod database;
pub mod market_data;
pub mod notifier;
pub mod pattern_evaluator;
pub mod reversal;
pub mod synthetic;
pub mod telegram;
pub mod trading_hours;
pub mod volume_scorer;

pub use alert_machine::{transition, AlertPhase, Transition};
pub use binance_klines::{BinanceKlineProvider, DEFAULT_BINANCE_API_URL};
pub use database::{AlertStore, SqliteAlertStore};
pub use market_data::CandleProvider;
pub use notifier::Notifier;
pub use pattern_evaluator::evaluate_pattern;
pub use reversal::find_last_zero_cross;
pub use synthetic::SyntheticProvider;
pub use telegram::TelegramNotifier;
pub use trading_hours::{TradingHours, TradingWindowCheck};
pub use volume_scorer::score_volume;
