//! Logging setup shared between the library tests and the binary.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Verbosity maps the `-v` flag count: 0 = warn, 1 = info, 2 = debug,
/// 3+ = trace. `RUST_LOG` takes precedence when set.
pub fn init(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
