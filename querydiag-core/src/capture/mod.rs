//! Log Capture - correlation-keyed interception of query-engine log lines
//!
//! The engine reports its per-index cost estimates only through its logging.
//! [`LogInterceptor`] taps that logging without altering it: every event is
//! offered to [`LogInterceptor::decide`], which stores messages from the
//! query-planning logger under the active correlation key and always answers
//! [`Verdict::Neutral`].
//!
//! ```text
//! engine worker threads ──► tracing event ──► CaptureLayer ──► decide()
//!                                                                 │
//!                     correlation key ──► Vec<String> (≤ capacity) ◄┘
//!                                              │
//! Investigator (after execution returns) ──► saved_logs(key) ──► stop_interception(key)
//! ```
//!
//! # Concurrency
//!
//! Appends for one key may come from many threads at once; each key's list
//! has its own lock, so keys never contend with each other beyond the brief
//! map lookup. Reads take a snapshot and are only consistent once the call
//! that produces the lines (query execution) has returned. That ordering is a
//! precondition on the caller and is not enforced here.
//!
//! # Global state
//!
//! [`LogInterceptor::global`] is process-wide and bounded: at most `capacity`
//! lines per live key, and a key lives from its first captured line until its
//! owner calls [`LogInterceptor::stop_interception`]. Nothing expires
//! implicitly.

pub mod context;
mod format;
mod layer;

pub use context::{CorrelationGuard, CORRELATION_FIELD};
pub use format::format_message;
pub use layer::CaptureLayer;

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::config::CaptureConfig;

/// Answer returned to the logging pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Force the event through
    Accept,
    /// Leave the decision to the rest of the pipeline
    Neutral,
    /// Suppress the event
    Deny,
}

type CapturedLog = Arc<Mutex<Vec<String>>>;

/// Correlation-keyed, bounded capture of query-planning log lines
#[derive(Debug)]
pub struct LogInterceptor {
    config: CaptureConfig,
    logs: RwLock<HashMap<String, CapturedLog>>,
}

impl LogInterceptor {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            logs: RwLock::new(HashMap::new()),
        }
    }

    /// Process-wide interceptor with the default configuration
    pub fn global() -> Arc<LogInterceptor> {
        static INTERCEPTOR: OnceLock<Arc<LogInterceptor>> = OnceLock::new();
        INTERCEPTOR
            .get_or_init(|| Arc::new(LogInterceptor::new(CaptureConfig::default())))
            .clone()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Logger name whose events are captured
    pub fn target_logger(&self) -> &str {
        &self.config.target_logger
    }

    /// Observe one log event, using the thread's ambient correlation key
    pub fn decide(
        &self,
        logger_name: &str,
        level: Level,
        template: Option<&str>,
        args: &[&dyn Display],
        throwable: Option<&(dyn std::error::Error + 'static)>,
    ) -> Verdict {
        let key = context::current();
        self.decide_for(key.as_deref(), logger_name, level, template, args, throwable)
    }

    /// Observe one log event under an explicitly resolved correlation key
    pub fn decide_for(
        &self,
        key: Option<&str>,
        logger_name: &str,
        _level: Level,
        template: Option<&str>,
        args: &[&dyn Display],
        _throwable: Option<&(dyn std::error::Error + 'static)>,
    ) -> Verdict {
        let Some(key) = key else {
            return Verdict::Neutral;
        };
        if logger_name != self.config.target_logger {
            return Verdict::Neutral;
        }
        let Some(mut message) = format_message(template, args) else {
            return Verdict::Neutral;
        };

        message.push('\n');
        self.append(key, message);
        Verdict::Neutral
    }

    fn append(&self, key: &str, message: String) {
        let existing = self.logs.read().get(key).cloned();
        let log = match existing {
            Some(log) => log,
            None => self.logs.write().entry(key.to_string()).or_default().clone(),
        };

        let stored = {
            let mut lines = log.lock();
            if lines.len() >= self.config.capacity {
                return;
            }
            lines.push(message);
            lines.len()
        };

        if stored == self.config.capacity {
            tracing::debug!(
                correlation_id = key,
                capacity = self.config.capacity,
                "capture window full, further lines are dropped"
            );
        }
    }

    /// Snapshot of the lines captured under `key`; empty for unknown keys
    pub fn saved_logs(&self, key: &str) -> Vec<String> {
        let log = self.logs.read().get(key).cloned();
        log.map(|log| log.lock().clone()).unwrap_or_default()
    }

    /// Drop everything captured under `key`
    pub fn stop_interception(&self, key: &str) {
        if self.logs.write().remove(key).is_some() {
            tracing::debug!(correlation_id = key, "capture window closed");
        }
    }

    /// Number of keys currently holding captured lines
    pub fn active_windows(&self) -> usize {
        self.logs.read().len()
    }

    /// Activate `key` on this thread and tear its capture down on drop
    pub fn open_window(self: &Arc<Self>, key: &str) -> CaptureWindow {
        tracing::debug!(correlation_id = key, "capture window opened");
        CaptureWindow {
            interceptor: Arc::clone(self),
            key: key.to_string(),
            _scope: context::enter(key),
        }
    }
}

impl Default for LogInterceptor {
    fn default() -> Self {
        Self::new(CaptureConfig::default())
    }
}

/// Scoped capture for one correlation key
///
/// While alive the key is active on the opening thread. Dropping the window
/// restores the previous key and removes every line captured under it, on
/// success and error paths alike.
#[derive(Debug)]
pub struct CaptureWindow {
    interceptor: Arc<LogInterceptor>,
    key: String,
    _scope: CorrelationGuard,
}

impl CaptureWindow {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Lines captured so far
    pub fn lines(&self) -> Vec<String> {
        self.interceptor.saved_logs(&self.key)
    }
}

impl Drop for CaptureWindow {
    fn drop(&mut self) {
        self.interceptor.stop_interception(&self.key);
    }
}
