//! Structured observability hooks for the comment-command lifecycle.
//!
//! - [`request_span`]: span carrying the request id, repository and pull number
//! - `emit_*`: named lifecycle events, filterable on the `event` field
//!
//! For JSON output, initialise tracing with [`crate::telemetry::init_tracing`].

use tracing::{info, warn, Span};
use uuid::Uuid;

use crate::gate::Rejection;
use crate::models::{CommandName, CommitStatus, VcsHostType};
use crate::outcome::ExecutionOutcome;
use crate::recovery::Panicked;

/// Span wrapping one comment command from receipt to report.
pub fn request_span(request_id: Uuid, repo_full_name: &str, pull_num: u64) -> Span {
    tracing::info_span!(
        "atlantis.command",
        request_id = %request_id,
        repo = %repo_full_name,
        pull = pull_num,
    )
}

/// Emit event: a comment command was received.
pub fn emit_command_received(host: VcsHostType, command: Option<CommandName>, user: &str) {
    match command {
        Some(command) => info!(event = "command.received", host = %host, command = %command, user = %user),
        None => info!(event = "command.received", host = %host, user = %user),
    }
}

/// Emit event: the request was stopped by the authorization gate.
pub fn emit_command_rejected(rejection: &Rejection) {
    info!(event = "command.rejected", reason = %rejection);
}

/// Emit event: the request failed before reaching the project stage.
pub fn emit_command_failed(error: &dyn std::fmt::Display) {
    warn!(event = "command.failed", error = %error);
}

/// Emit event: the request finished and its outcome was reported.
pub fn emit_command_reported(outcome: &ExecutionOutcome, status: CommitStatus) {
    info!(
        event = "command.reported",
        command = %outcome.command,
        status = ?status,
        projects = outcome.results.len(),
        passed = outcome.passed_count(),
        failed = outcome.failed_count(),
        errored = outcome.errored_count(),
    );
}

/// Emit event: a panic was caught at the request boundary.
pub fn emit_command_panicked(panicked: &Panicked) {
    tracing::error!(
        event = "command.panicked",
        panic_msg = %panicked.message,
        location = panicked.location.as_deref().unwrap_or("unknown"),
        "request handler panicked"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_span_create() {
        let span = request_span(Uuid::new_v4(), "runatlantis/atlantis", 1);
        let _entered = span.entered();
    }
}
