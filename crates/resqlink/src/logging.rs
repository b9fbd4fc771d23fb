//! Tracing setup for the service and the CLI.
//!
//! `RUST_LOG` wins when set. Otherwise the `-q`/`-v` flags pick the level
//! for the crate itself and for `tower_http`, whose request spans are
//! emitted at debug and so only show up with `-v`.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much the process logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Startup, shutdown and ledger or account mutations.
    #[default]
    Normal,
    /// Adds lookups and one line per HTTP request.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Level for the crate's own events.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter used when `RUST_LOG` is not set.
    #[must_use]
    pub fn directives(self) -> String {
        let level = self.level();
        format!("resqlink={level},tower_http={level}")
    }
}

/// Install the global subscriber. Later calls are no-ops.
///
/// ```no_run
/// use resqlink::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directives()));
    let show_targets = matches!(verbosity, Verbosity::Verbose | Verbosity::Trace);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(show_targets))
        .try_init();
}
