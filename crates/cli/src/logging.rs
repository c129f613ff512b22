//! Log setup. `RUST_LOG` wins over the `-v` mapping when both are present.

use tracing_subscriber::EnvFilter;

pub fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn,flowbot=info",
        1 => "info,flowbot=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
