use tracing::Level;
use tracing_subscriber::prelude::*;

/// Installs the process-wide subscriber: `RUST_LOG` directives on top of an
/// INFO default, written to stderr so stdout stays free for JSON output.
pub fn init_tracing() {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();
}
