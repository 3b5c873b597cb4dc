//! "Just added" indicator for an add-to-cart control.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, warn};
use turbo_cache::mutex_lock;

const SOURCE: &str = "commerce::feedback";

/// How long the indicator stays up after a trigger.
pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackState {
    Idle,
    Adding,
    Added,
}

/// Debounce for one add-to-cart control.
///
/// A trigger moves the state out of `Idle` and starts a timer that puts it
/// back after the configured delay, whatever the network is doing. Triggers
/// while not idle are ignored.
#[derive(Debug, Clone)]
pub struct AddFeedback {
    state: Arc<Mutex<FeedbackState>>,
    delay: Duration,
}

impl Default for AddFeedback {
    fn default() -> Self {
        Self::new(DEFAULT_FEEDBACK_DELAY)
    }
}

impl AddFeedback {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(FeedbackState::Idle)),
            delay,
        }
    }

    pub fn state(&self) -> FeedbackState {
        *mutex_lock(&self.state, SOURCE, "state")
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start the indicator. Returns false if the trigger was ignored.
    pub fn trigger(&self) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            warn!("add feedback triggered outside an async runtime");
            return false;
        };

        {
            let mut state = mutex_lock(&self.state, SOURCE, "trigger");
            if *state != FeedbackState::Idle {
                debug!(state = ?*state, "add feedback busy, trigger ignored");
                return false;
            }
            *state = FeedbackState::Adding;
        }

        let state = Arc::clone(&self.state);
        let delay = self.delay;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            *mutex_lock(&state, SOURCE, "reset") = FeedbackState::Idle;
        });
        true
    }

    /// Record that the local cart now holds the item.
    pub fn mark_added(&self) {
        let mut state = mutex_lock(&self.state, SOURCE, "mark_added");
        if *state == FeedbackState::Adding {
            *state = FeedbackState::Added;
        }
    }
}
