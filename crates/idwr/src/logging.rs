use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Diagnostics go to stderr; stdout is reserved for command output.
///
/// `-v` forces debug and `-vv` trace; otherwise `RUST_LOG` applies,
/// defaulting to info.
pub fn init(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(verbose > 0);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}
