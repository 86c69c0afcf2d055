//! Log setup for the `algosig` binary.
//!
//! stdout carries command output (addresses, ids, JSON dumps) and must stay
//! clean for piping, so every log line goes to stderr. The library logs at
//! `debug` for signing, grouping and finalize and at `warn` for dropped
//! multisig subsignatures; `-v` flags walk the default filter down to those
//! levels. The binary is named `algosig` too, so one `algosig` directive
//! covers both the library and the commands. `RUST_LOG` replaces the
//! computed filter entirely.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line format, selected with `--log-format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Filter directives for a `-v` count.
///
/// 0 keeps only warnings (dropped subsignatures, failed verification in
/// `inspect`), 1 adds the command summaries, 2 and above turn on the
/// library's per-step debug events.
pub fn directives(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("algosig={level}")
}

/// Install the global subscriber. Call once, before any command runs.
pub fn init_logging(verbosity: u8, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(verbosity)));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .init(),
    }
}
