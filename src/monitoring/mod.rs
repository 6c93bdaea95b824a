/*!
 * Monitoring
 * Structured tracing for pool operations
 */

pub mod tracer;

pub use tracer::{init_tracing, PoolSpan};
