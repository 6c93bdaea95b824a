/*!
 * Structured Tracing
 * Subscriber setup and per-operation spans for the memory pool
 *
 * Features:
 * - JSON-formatted logs for structured parsing
 * - Span per allocation/deallocation with timing fields
 * - Slow operation warnings
 */

use crate::core::limits::SLOW_OPERATION_NS;
use crate::memory::types::PoolError;
use std::time::{Duration, Instant};
use tracing::{field, info, span, trace, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - POOL_TRACE_JSON: Enable JSON output (default: false)
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("POOL_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "structured tracing initialized");
    }
}

/// Span covering a single pool operation
pub struct PoolSpan {
    span: Span,
    start: Instant,
    operation: &'static str,
}

impl PoolSpan {
    pub fn new(operation: &'static str, size: usize) -> Self {
        let span = span!(
            Level::TRACE,
            "pool_op",
            operation = operation,
            size = size,
            duration_ns = field::Empty,
            result = field::Empty,
            error = field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            operation,
        }
    }

    /// Time since the operation started
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Record a failure on the span
    pub fn record_error(&self, error: &PoolError) {
        self.span.record("error", field::display(error));
        self.span.record("result", "error");
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl Drop for PoolSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.span.record("duration_ns", nanos);
        let _entered = self.span.enter();

        if nanos > SLOW_OPERATION_NS {
            warn!(
                operation = self.operation,
                duration_us = duration.as_micros() as u64,
                slow = true,
                "slow pool operation detected"
            );
        } else {
            trace!(operation = self.operation, duration_ns = nanos, "pool operation completed");
        }
    }
}
