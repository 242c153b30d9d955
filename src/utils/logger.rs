use std::time::Instant;

use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// default `tushare_examples=info` filter.
pub fn init_logger() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tushare_examples=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_target(true)
                .compact(),
        )
        .init();

    Ok(())
}

/// Scoped logger carried through a command run; every line it emits is
/// tagged with the command name.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    scope: &'static str,
}

impl Logger {
    pub fn new(scope: &'static str) -> Self {
        Self { scope }
    }

    pub fn info(&self, message: &str) {
        info!(scope = self.scope, "{message}");
    }

    pub fn warn(&self, message: &str) {
        warn!(scope = self.scope, "{message}");
    }

    pub fn warn_with_error(&self, message: &str, error: &dyn std::error::Error) {
        warn!(scope = self.scope, error = %error, "{message}");
    }
}

/// Wall-clock timer for end-of-run summaries.
pub struct Timer {
    label: &'static str,
    started: Instant,
}

impl Timer {
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }

    pub fn log_elapsed(&self) {
        let ms = self.started.elapsed().as_secs_f64() * 1000.0;
        info!("{} finished in {ms:.1}ms", self.label);
    }
}
