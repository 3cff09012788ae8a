//! Tracing initialisation.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "KINEX_LOG";

static INIT: Once = Once::new();

/// Install the global subscriber.
///
/// Reads per-crate levels from `KINEX_LOG`, e.g.
/// `KINEX_LOG=kinex_stats=debug,kinex_cli=info`, falling back to
/// `kinex=info`. Output goes to stderr so stdout carries only the report.
/// Later calls are no-ops.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("kinex=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    });
}
