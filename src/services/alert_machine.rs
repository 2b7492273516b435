//! Per-symbol alert state machine
//!
//! ```text
//!            triggered + delivered
//!   IDLE ───────────────────────────▶ ALERTED ──┐ triggered, cooldown active:
//!    ▲                                  │  ▲    │ suppressed, no change
//!    │          not triggered           │  └────┘
//!    └──────────────────────────────────┘  triggered, cooldown elapsed
//!                 (RESET record)             + delivered: re-armed
//! ```
//!
//! [`transition`] is pure. The caller performs the side effects it names and
//! only commits a `Notify` transition once delivery succeeded.

use chrono::{DateTime, Utc};

use crate::constants::{DECISION_ALERT_SENT, DECISION_RESET};
use crate::models::{PatternResult, SymbolAlertState};

/// Alert phase derived from a persisted state row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPhase {
    Idle,
    /// Alert sent at `since` (unix seconds)
    Alerted { since: i64 },
}

impl AlertPhase {
    pub fn of(state: &SymbolAlertState) -> Self {
        if state.alert_sent {
            AlertPhase::Alerted {
                since: state.last_check_timestamp,
            }
        } else {
            AlertPhase::Idle
        }
    }
}

/// Decision for one symbol in one cycle
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Send a notification; persist `next` and record the alert only if
    /// delivery succeeds
    Notify {
        next: SymbolAlertState,
        rearm: bool,
    },
    /// Triggered again inside the cooldown window
    CooldownActive { elapsed_secs: i64 },
    /// Pattern gone while alerted
    Reset { next: SymbolAlertState },
    /// Pattern absent and nothing to reset
    Unchanged,
}

impl Transition {
    /// History decision recorded when this transition is committed
    pub fn history_decision(&self) -> Option<&'static str> {
        match self {
            Transition::Notify { .. } => Some(DECISION_ALERT_SENT),
            Transition::Reset { .. } => Some(DECISION_RESET),
            Transition::CooldownActive { .. } | Transition::Unchanged => None,
        }
    }

    /// State to persist when this transition is committed
    pub fn next_state(&self) -> Option<&SymbolAlertState> {
        match self {
            Transition::Notify { next, .. } | Transition::Reset { next } => Some(next),
            Transition::CooldownActive { .. } | Transition::Unchanged => None,
        }
    }
}

/// Decide what to do with `result` given the prior state
pub fn transition(
    prev: &SymbolAlertState,
    result: &PatternResult,
    now: DateTime<Utc>,
    cooldown_secs: i64,
) -> Transition {
    let now_ts = now.timestamp();

    match (AlertPhase::of(prev), result.triggered) {
        (AlertPhase::Alerted { since }, true) if now_ts - since < cooldown_secs => {
            Transition::CooldownActive {
                elapsed_secs: now_ts - since,
            }
        }
        (phase, true) => Transition::Notify {
            next: SymbolAlertState {
                symbol: prev.symbol.clone(),
                last_zero_cross_index: result.reversal.map(|r| r.index as i64).unwrap_or(0),
                max_histogram: result.peak_histogram,
                alert_sent: true,
                last_check_timestamp: now_ts,
                volume_score: result.volume.score as i64,
            },
            rearm: phase != AlertPhase::Idle,
        },
        (AlertPhase::Alerted { .. }, false) => Transition::Reset {
            next: SymbolAlertState {
                alert_sent: false,
                ..prev.clone()
            },
        },
        (AlertPhase::Idle, false) => Transition::Unchanged,
    }
}
