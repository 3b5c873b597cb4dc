//! What happens when the backend answers 401.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};
use turbo_cache::{mutex_lock, Clock, Storage};

use crate::identity::{TOKEN_KEY, USER_ID_KEY, USER_KEY};

/// Path of the login surface.
pub const LOGIN_PATH: &str = "/auth/login";

/// 401s arriving this soon after a reset belong to the same burst.
pub const RESET_BURST_WINDOW: Duration = Duration::from_secs(2);

const SOURCE: &str = "auth::reset";

/// Moves the visitor to another surface of the storefront.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator for headless use: it only logs where the visitor would go.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, path: &str) {
        info!(path, "navigation requested");
    }
}

/// Navigator that remembers every path it was sent to.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<String> {
        mutex_lock(&self.visits, SOURCE, "visits").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        mutex_lock(&self.visits, SOURCE, "navigate").push(path.to_string());
    }
}

/// Clears stored credentials and sends the visitor to login.
///
/// Every 401 leads to login, signed in or not. The 401s of one burst of
/// concurrent requests, those within [`RESET_BURST_WINDOW`] of the reset
/// they follow, clear and navigate once.
pub struct SessionReset {
    storage: Arc<dyn Storage>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    last_reset_ms: Mutex<Option<i64>>,
}

impl SessionReset {
    pub fn new(
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            navigator,
            clock,
            last_reset_ms: Mutex::new(None),
        }
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Handle a 401. Returns true if this call performed the reset, false
    /// when it belongs to a burst that was already handled.
    pub fn handle_unauthorized(&self) -> bool {
        let mut last = mutex_lock(&self.last_reset_ms, SOURCE, "handle_unauthorized");
        let now = self.clock.now_ms();
        let window = i64::try_from(RESET_BURST_WINDOW.as_millis()).unwrap_or(i64::MAX);
        if last.is_some_and(|at| now.saturating_sub(at) < window) {
            debug!("401 within the reset burst window, already handled");
            return false;
        }

        for key in [TOKEN_KEY, USER_KEY, USER_ID_KEY] {
            if let Err(e) = self.storage.delete(key) {
                warn!(key, error = %e, "failed to clear credential during session reset");
            }
        }
        info!(redirect = LOGIN_PATH, "session reset after 401");
        self.navigator.navigate(LOGIN_PATH);
        *last = Some(now);
        true
    }
}
