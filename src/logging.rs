//! Tracing subscriber setup for the command-line tools.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a compact stderr logger.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks debug over info.
pub fn init_cli_logger(verbose: bool) {
    let default = if verbose { "bookart=debug,info" } else { "bookart=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
