//! Typing debounce and self-mutation suppression.
//!
//! Two independent single-shot timers, owned per editor:
//! - the typing timer delays a check cycle until the user stops typing
//! - the suppression window hides the checker's own document mutations
//!
//! The controller is a pure state machine over `tokio::time::Instant`; the
//! caller passes `now` in and sleeps until [`DebounceController::deadline`].

use std::time::Duration;

use tokio::time::Instant;

use crate::editor::ChangeOrigin;

/// Default length of the suppression window.
pub const SUPPRESSION_WINDOW: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingState {
    Idle,
    Pending { deadline: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionState {
    Open,
    Suppressed { until: Instant },
}

/// What a change notification did to the typing timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDecision {
    /// The timer was (re)started and fires at the given instant.
    Scheduled(Instant),
    /// The change was not made by the user.
    IgnoredOrigin,
    /// The change arrived inside the suppression window.
    IgnoredSuppressed,
}

#[derive(Debug, Clone)]
pub struct DebounceController {
    cooldown: Duration,
    window: Duration,
    typing: TypingState,
    suppression: SuppressionState,
}

impl DebounceController {
    pub fn new(cooldown: Duration, window: Duration) -> Self {
        Self {
            cooldown,
            window,
            typing: TypingState::Idle,
            suppression: SuppressionState::Open,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Handle a document change notification.
    ///
    /// The origin tag decides first: only user changes count. Untagged paths
    /// that still report `User` are caught by the suppression window. A
    /// qualifying change restarts the typing timer rather than stacking.
    pub fn on_change(&mut self, origin: ChangeOrigin, now: Instant) -> ChangeDecision {
        if origin != ChangeOrigin::User {
            return ChangeDecision::IgnoredOrigin;
        }
        if self.is_suppressed(now) {
            return ChangeDecision::IgnoredSuppressed;
        }

        let deadline = now + self.cooldown;
        self.typing = TypingState::Pending { deadline };
        ChangeDecision::Scheduled(deadline)
    }

    /// Open (or restart) the suppression window.
    pub fn suppress(&mut self, now: Instant) {
        self.suppression = SuppressionState::Suppressed {
            until: now + self.window,
        };
    }

    pub fn is_suppressed(&self, now: Instant) -> bool {
        matches!(self.suppression_state(now), SuppressionState::Suppressed { .. })
    }

    pub fn suppression_state(&self, now: Instant) -> SuppressionState {
        match self.suppression {
            SuppressionState::Suppressed { until } if now < until => self.suppression,
            _ => SuppressionState::Open,
        }
    }

    pub fn typing_state(&self) -> TypingState {
        self.typing
    }

    /// When the typing timer fires, if it is pending.
    pub fn deadline(&self) -> Option<Instant> {
        match self.typing {
            TypingState::Pending { deadline } => Some(deadline),
            TypingState::Idle => None,
        }
    }

    /// Fire the typing timer if its deadline has passed.
    ///
    /// Returns true exactly once per pending period; the timer is idle
    /// afterwards.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.typing {
            TypingState::Pending { deadline } if now >= deadline => {
                self.typing = TypingState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Drop a pending typing timer without firing it.
    pub fn cancel(&mut self) {
        self.typing = TypingState::Idle;
    }
}
