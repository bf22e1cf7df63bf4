use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured JSON tracing on stderr. Call once at startup.
///
/// The filter comes from `RUST_LOG`; when it is unset or invalid,
/// `default_directive` is used instead (e.g. `"info"`). Output goes to
/// stderr so command output on stdout stays machine-readable.
///
/// Safe to call multiple times; later calls are ignored.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .try_init();
}
