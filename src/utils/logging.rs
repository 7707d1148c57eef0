//! Process-wide logging setup.  The kernel only emits `tracing` events;
//! the embedding program installs a subscriber once, at start, through
//! [`init`], or hands an explicit [`Dispatch`] to a root coordinator.

use tracing::Dispatch;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Environment variable read when no explicit filter is given.
pub const LOG_ENV: &str = "DEVSIM_LOG";

fn env_filter(filter: Option<&str>) -> EnvFilter {
    match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    }
}

/// Installs the global `fmt` subscriber.  Returns an error when a global
/// subscriber is already installed: initialization is never re-entered.
pub fn init(filter: Option<&str>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    fmt().with_env_filter(env_filter(filter)).try_init()
}

/// Builds a dispatch writing to stderr with the given filter, for a root
/// coordinator which must log to its own sink.
pub fn dispatch(filter: &str) -> Dispatch {
    let subscriber = fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .finish();
    Dispatch::new(subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_can_be_scoped() {
        let dispatch = dispatch("debug");
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::debug!("scoped event");
        });
    }
}
