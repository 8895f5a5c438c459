//! # Structured Logging
//!
//! Initializes the `tracing` subscriber with configurable format (JSON or
//! pretty-printed) and environment-based filtering via `RUST_LOG`.
//!
//! The registry and store emit `debug!` events for committed writes and
//! `warn!` events for rejected registrations, with `fingerprint`, `author`
//! and `seq` fields.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output for local development.
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

impl LogFormat {
    /// Parse a format string. Accepts "json" or "pretty" (case-insensitive).
    /// Returns `Pretty` for any unrecognized value.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_level` when set, e.g.
/// `RUST_LOG=provenance_registry=debug,provenance_store=info`.
///
/// Returns false if a global subscriber was already installed, which makes
/// it safe to call from every test.
pub fn init_logging(default_level: &str, format: LogFormat) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let installed = match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
            .is_ok(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_target(true))
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(?format, "logging initialized");
    }
    installed
}
