//! Database backend implementations.
//!
//! Each backend lives in its own file and is gated behind a feature flag.

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "postgres")]
pub use postgres::{rewrite_named_params, PostgresExecutor};
