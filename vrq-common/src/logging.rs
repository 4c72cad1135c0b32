//! Tracing setup for the service binaries
//!
//! The subscriber is installed before configuration is loaded so that
//! config resolution is logged. The configured level is applied afterwards
//! through a reload handle, unless RUST_LOG chose the filter.

use tracing::{warn, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

/// Handle for replacing the filter once the configured level is known
pub type LevelHandle = reload::Handle<EnvFilter, Registry>;

/// Filter for `target` and vrq-common at `level`
pub fn default_filter(target: &str, level: &str) -> EnvFilter {
    EnvFilter::new(format!(
        "{target}={level},vrq_common={level},tower_http=info"
    ))
}

/// Build the subscriber without installing it
///
/// The handle is `None` when the filter came from RUST_LOG.
pub fn subscriber<W>(
    target: &str,
    writer: W,
) -> (impl Subscriber + Send + Sync + 'static, Option<LevelHandle>)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| default_filter(target, "info")));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer));

    (subscriber, (!from_env).then_some(handle))
}

/// Install the global subscriber, logging to stdout
pub fn init_tracing(target: &str) -> Option<LevelHandle> {
    let (subscriber, handle) = subscriber(target, std::io::stdout);
    subscriber.init();
    handle
}

/// Apply the configured level, if RUST_LOG did not set one
pub fn apply_level(handle: Option<&LevelHandle>, target: &str, level: &str) {
    if let Some(handle) = handle {
        if let Err(e) = handle.reload(default_filter(target, level)) {
            warn!("Failed to apply log level {}: {}", level, e);
        }
    }
}
