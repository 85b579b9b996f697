//! Atlantis Core Library
//!
//! Orchestrates comment commands on pull/merge requests: authorize the
//! request, resolve the provider's pull request, fan out to project
//! commands, and report one commit status and one comment back.

pub mod command_runner;
pub mod config;
pub mod error;
pub mod event_parser;
pub mod fakes;
pub mod gate;
pub mod models;
pub mod obs;
pub mod outcome;
pub mod project;
pub mod recovery;
pub mod render;
pub mod telemetry;
pub mod vcs;

pub use command_runner::{CommandRunner, CommentCommandRequest};
pub use config::{RunnerConfig, DEFAULT_ALLOW_FORK_PRS_FLAG};
pub use error::{BuildError, FetchError, ParseError, PullResolutionError, RepoError, VcsError};
pub use event_parser::{DefaultEventParser, EventParser, ParsedPull};
pub use gate::{AuthorizationGate, Rejection};
pub use models::{
    CommandContext, CommandName, CommentCommand, CommitStatus, ProjectCommandContext,
    ProjectResult, ProjectStatus, PullRequest, PullState, Repo, User, VcsHost, VcsHostType,
};
pub use outcome::ExecutionOutcome;
pub use project::{ProjectCommandBuilder, ProjectCommandRunner};
pub use recovery::{catch_panics, Panicked};
pub use render::{CommentRenderer, MarkdownRenderer, HELP_TEXT};
pub use telemetry::init_tracing;
pub use vcs::{
    CommitStatusUpdater, DefaultCommitStatusUpdater, GithubPull, GithubPullGetter,
    GitlabMergeRequest, GitlabMergeRequestGetter, RawPull, VcsClient,
};

/// Atlantis version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
