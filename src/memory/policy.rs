/*!
 * Error Policy
 *
 * Single cross-cutting decision point for runtime failures. Every failure
 * path in the pool hands its error here after statistics are updated; the
 * active strategy decides whether it propagates, degrades to a null result,
 * is reported to a side-channel logger, or aborts the process.
 */

use super::types::{PoolError, PoolResult};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Side-channel error logger
pub type ErrorLogger = Arc<dyn Fn(&str) + Send + Sync>;

/// How runtime failures are surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStrategy {
    /// Return the structured error to the caller
    #[default]
    Propagate,
    /// Return a null handle / no-op without an error
    ReturnNull,
    /// Hand the message to the registered logger, then continue as `ReturnNull`
    LogAndContinue,
    /// Terminate the process immediately
    Abort,
}

#[derive(Clone)]
struct PolicyState {
    strategy: ErrorStrategy,
    logger: Option<ErrorLogger>,
}

/// Swappable error policy
///
/// Readers on failure paths load the current state without locking; updates
/// publish a new state atomically.
pub struct ErrorPolicy {
    state: ArcSwap<PolicyState>,
}

impl ErrorPolicy {
    pub fn new(strategy: ErrorStrategy) -> Self {
        Self {
            state: ArcSwap::from_pointee(PolicyState {
                strategy,
                logger: None,
            }),
        }
    }

    pub fn strategy(&self) -> ErrorStrategy {
        self.state.load().strategy
    }

    pub fn set_strategy(&self, strategy: ErrorStrategy) {
        self.state.rcu(|current| PolicyState {
            strategy,
            logger: current.logger.clone(),
        });
    }

    pub fn set_logger(&self, logger: ErrorLogger) {
        self.state.rcu(|current| PolicyState {
            strategy: current.strategy,
            logger: Some(Arc::clone(&logger)),
        });
    }

    pub fn clear_logger(&self) {
        self.state.rcu(|current| PolicyState {
            strategy: current.strategy,
            logger: None,
        });
    }

    /// Apply the active strategy to `error`
    ///
    /// `Err` means the caller must propagate; `Ok(())` means the caller must
    /// degrade to its null/false result.
    pub fn handle(&self, error: PoolError) -> PoolResult<()> {
        let state = self.state.load();
        let kind = error.kind();

        match state.strategy {
            ErrorStrategy::Propagate => {
                debug!(%kind, %error, "propagating pool error");
                Err(error)
            }
            ErrorStrategy::ReturnNull => {
                debug!(%kind, %error, "suppressing pool error");
                Ok(())
            }
            ErrorStrategy::LogAndContinue => {
                warn!(%kind, %error, "pool error logged and suppressed");
                if let Some(logger) = &state.logger {
                    logger(&error.to_string());
                }
                Ok(())
            }
            ErrorStrategy::Abort => {
                error!(%kind, %error, "fatal pool error, aborting");
                eprintln!("Fatal error: {}", error);
                std::process::abort();
            }
        }
    }
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::new(ErrorStrategy::default())
    }
}

impl std::fmt::Debug for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.load();
        f.debug_struct("ErrorPolicy")
            .field("strategy", &state.strategy)
            .field("has_logger", &state.logger.is_some())
            .finish()
    }
}
