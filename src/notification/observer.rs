//! Per-manager logging scope
//!
//! Each manager logs inside its own span, tagged with its application name, and
//! filters its own diagnostics by a verbosity taken from its configuration. The
//! process-wide subscriber is left to the embedding application.

use tracing::level_filters::LevelFilter;
use tracing::{info_span, Level, Span};

#[derive(Debug, Clone)]
pub struct Observer {
    span: Span,
    verbosity: LevelFilter,
}

impl Observer {
    pub fn new(app_name: &str, verbosity: LevelFilter) -> Self {
        Self {
            span: info_span!("notifications", app = %app_name),
            verbosity,
        }
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.verbosity
    }

    /// Runs `log` inside the manager span if `level` passes the verbosity
    pub fn emit<F: FnOnce()>(&self, level: Level, log: F) {
        if self.enabled(level) {
            self.span.in_scope(log);
        }
    }
}
