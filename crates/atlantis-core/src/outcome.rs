//! Aggregation of project results into a single execution outcome.

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::models::{CommandName, CommitStatus, ProjectResult, ProjectStatus};

/// Aggregate result of one comment command.
///
/// `results` keeps builder order. `error` is set when the command failed
/// before any project could run (e.g. the builder rejected it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub command: CommandName,
    pub results: Vec<ProjectResult>,
    pub error: Option<String>,
}

impl ExecutionOutcome {
    pub fn from_results(command: CommandName, results: Vec<ProjectResult>) -> Self {
        Self {
            command,
            results,
            error: None,
        }
    }

    pub fn from_build_error(command: CommandName, err: &BuildError) -> Self {
        Self {
            command,
            results: Vec::new(),
            error: Some(err.to_string()),
        }
    }

    /// Failed if the command errored or any project did not succeed.
    /// Zero projects is a neutral success.
    pub fn overall_status(&self) -> CommitStatus {
        if self.error.is_some() || self.results.iter().any(|r| !r.passed()) {
            CommitStatus::Failed
        } else {
            CommitStatus::Success
        }
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == ProjectStatus::Failure)
            .count()
    }

    pub fn errored_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == ProjectStatus::Error)
            .count()
    }
}
