//! Duplicate and rate-limit guard for physical side effects.
//!
//! A misheard utterance can loop ("open browser" five times in a row); the
//! guard keeps a bounded ledger of executed actions and refuses
//! near-duplicates inside a cooldown window. Too many near-duplicates trip
//! a temporary global block on all actions. Uses the monotonic clock only —
//! wall-clock adjustments must not unblock or re-block anything.

use sentinel_common::{plan::reason, ActionKind, GuardConfig};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

/// Ledger entry for one executed action. Immutable once recorded.
#[derive(Debug, Clone)]
pub struct ExecutedAction {
    pub kind: ActionKind,
    pub target: String,
    pub at: Instant,
}

impl ExecutedAction {
    fn matches(&self, kind: ActionKind, target: &str) -> bool {
        self.kind == kind && self.target.eq_ignore_ascii_case(target)
    }
}

/// Why the guard refused an action.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardRefusal {
    /// Global block is active; everything is refused.
    Paused,
    /// The same action ran moments ago.
    Recent { target: String, seconds_ago: f64 },
    /// The repeat threshold was breached; a global block has been set.
    RepeatBlocked { target: String, max_repeats: u32 },
}

impl GuardRefusal {
    /// Machine reason code for the decision record.
    pub fn reason(&self) -> &'static str {
        match self {
            GuardRefusal::Paused => reason::SYSTEM_PAUSED,
            GuardRefusal::Recent { .. } | GuardRefusal::RepeatBlocked { .. } => {
                reason::DUPLICATE_ACTION
            }
        }
    }
}

impl fmt::Display for GuardRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardRefusal::Paused => {
                write!(f, "System paused due to repeated actions. Say 'stop' to reset.")
            }
            GuardRefusal::Recent { target, seconds_ago } => {
                write!(f, "Already done. {} was just handled {:.1}s ago.", target, seconds_ago)
            }
            GuardRefusal::RepeatBlocked { target, max_repeats } => {
                write!(
                    f,
                    "Blocked: '{}' was requested {}+ times. Pausing for safety.",
                    target, max_repeats
                )
            }
        }
    }
}

/// Tracks executed actions and refuses runaway repeats.
pub struct ActionGuard {
    config: GuardConfig,
    history: VecDeque<ExecutedAction>,
    repeat_counts: HashMap<(ActionKind, String), u32>,
    blocked_until: Option<Instant>,
}

impl ActionGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history),
            repeat_counts: HashMap::new(),
            blocked_until: None,
            config,
        }
    }

    fn key(kind: ActionKind, target: &str) -> (ActionKind, String) {
        (kind, target.to_lowercase())
    }

    /// Check whether an action may run now.
    pub fn can_execute(&mut self, kind: ActionKind, target: &str) -> Result<(), GuardRefusal> {
        self.can_execute_at(Instant::now(), kind, target)
    }

    /// Time-explicit variant used by tests.
    pub fn can_execute_at(
        &mut self,
        now: Instant,
        kind: ActionKind,
        target: &str,
    ) -> Result<(), GuardRefusal> {
        if let Some(until) = self.blocked_until {
            if now < until {
                return Err(GuardRefusal::Paused);
            }
            // Block has lapsed.
            self.blocked_until = None;
        }

        let recent = self
            .history
            .iter()
            .rev()
            .find(|entry| entry.matches(kind, target))
            .map(|entry| now.saturating_duration_since(entry.at));

        if let Some(elapsed) = recent {
            if elapsed < self.config.cooldown() {
                let key = Self::key(kind, target);
                let count = self.repeat_counts.entry(key).or_insert(0);
                *count += 1;

                if *count >= self.config.max_repeats {
                    self.blocked_until = Some(now + self.config.block_duration());
                    warn!(
                        "Guard tripped global block: {} '{}' repeated {} times",
                        kind, target, count
                    );
                    return Err(GuardRefusal::RepeatBlocked {
                        target: target.to_string(),
                        max_repeats: self.config.max_repeats,
                    });
                }

                return Err(GuardRefusal::Recent {
                    target: target.to_string(),
                    seconds_ago: elapsed.as_secs_f64(),
                });
            }
        }

        Ok(())
    }

    /// Record a successful dispatch. Decays the repeat counter for the key:
    /// a well-spaced re-invocation forgives prior near-duplicates.
    pub fn record(&mut self, kind: ActionKind, target: &str) {
        self.record_at(Instant::now(), kind, target);
    }

    /// Time-explicit variant used by tests.
    pub fn record_at(&mut self, now: Instant, kind: ActionKind, target: &str) {
        if self.history.len() == self.config.history {
            self.history.pop_front();
        }
        self.history.push_back(ExecutedAction {
            kind,
            target: target.to_string(),
            at: now,
        });

        let key = Self::key(kind, target);
        if let Some(count) = self.repeat_counts.get_mut(&key) {
            *count = count.saturating_sub(1);
        }
        debug!("Guard recorded {} '{}'", kind, target);
    }

    /// Wipe ledger, counters and block. Invoked on a stop command.
    pub fn clear(&mut self) {
        self.history.clear();
        self.repeat_counts.clear();
        self.blocked_until = None;
    }

    /// Clear the block and counters after explicit user confirmation,
    /// keeping the ledger history.
    pub fn force_unblock(&mut self) {
        self.blocked_until = None;
        self.repeat_counts.clear();
    }

    /// Repeat count currently tracked for a key.
    pub fn repeat_count(&self, kind: ActionKind, target: &str) -> u32 {
        self.repeat_counts
            .get(&Self::key(kind, target))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_blocked_at(&self, now: Instant) -> bool {
        self.blocked_until.is_some_and(|until| now < until)
    }
}
