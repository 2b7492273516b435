mod alert_config;
mod alert_state;
mod candle;
mod pattern;
pub mod indicators;

pub use alert_config::{AlertConfig, VolumeThresholds};
pub use alert_state::{AlertHistoryRecord, SymbolAlertState};
pub use candle::{Candle, CandleSeries};
pub use indicators::{MacdPoint, MacdSeries};
pub use pattern::{
    Direction, PatternResult, PatternStatus, ReversalEvent, VolumeAssessment, VolumeBreakdown,
};
