//! Comment-command orchestration.
//!
//! [`CommandRunner`] drives one request through
//! `Received → ConfigChecked → PullFetched → PullParsed → Authorized → Built
//! → Executed → Reported`. Any step before `Reported` may stop the request:
//! an unconfigured provider is logged only, every other stop posts exactly
//! one comment. A request never posts more than one comment or more than one
//! commit status, and a panic anywhere inside it is converted into a comment
//! instead of unwinding into the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn, Instrument};
use uuid::Uuid;

use crate::config::RunnerConfig;
use crate::error::PullResolutionError;
use crate::event_parser::EventParser;
use crate::gate::{AuthorizationGate, Rejection};
use crate::models::{CommandContext, CommentCommand, PullRequest, Repo, User, VcsHostType};
use crate::obs;
use crate::outcome::ExecutionOutcome;
use crate::project::{ProjectCommandBuilder, ProjectCommandRunner};
use crate::recovery::catch_panics;
use crate::render::CommentRenderer;
use crate::vcs::{
    CommitStatusUpdater, GithubPullGetter, GitlabMergeRequestGetter, RawPull, VcsClient,
};

/// Input of [`CommandRunner::run_comment_command`].
#[derive(Debug, Clone)]
pub struct CommentCommandRequest {
    /// Repository the comment was made on.
    pub base_repo: Repo,
    /// Head repository, when the webhook already carried it.
    pub maybe_head_repo: Option<Repo>,
    /// Raw pull request, when the webhook already carried it. Skips the fetch.
    pub maybe_pull: Option<RawPull>,
    pub user: User,
    pub pull_num: u64,
    /// `None` when the comment could not be parsed into a command.
    pub command: Option<CommentCommand>,
}

impl CommentCommandRequest {
    pub fn new(base_repo: Repo, user: User, pull_num: u64, command: Option<CommentCommand>) -> Self {
        Self {
            base_repo,
            maybe_head_repo: None,
            maybe_pull: None,
            user,
            pull_num,
            command,
        }
    }

    pub fn with_head_repo(mut self, head_repo: Repo) -> Self {
        self.maybe_head_repo = Some(head_repo);
        self
    }

    pub fn with_pull(mut self, pull: RawPull) -> Self {
        self.maybe_pull = Some(pull);
        self
    }
}

/// Provider-specific pull request source selected for a request.
#[derive(Clone, Copy)]
enum PullSource<'a> {
    Github(&'a dyn GithubPullGetter),
    Gitlab(&'a dyn GitlabMergeRequestGetter),
}

/// Orchestrates comment commands. Collaborators are shared across
/// concurrently running requests; per-request state lives on the stack of
/// [`CommandRunner::run_comment_command`].
pub struct CommandRunner {
    pub vcs_client: Arc<dyn VcsClient>,
    pub commit_status_updater: Arc<dyn CommitStatusUpdater>,
    pub event_parser: Arc<dyn EventParser>,
    pub renderer: Arc<dyn CommentRenderer>,
    /// `None` when GitHub is not configured.
    pub github_pull_getter: Option<Arc<dyn GithubPullGetter>>,
    /// `None` when GitLab is not configured.
    pub gitlab_merge_request_getter: Option<Arc<dyn GitlabMergeRequestGetter>>,
    pub project_command_builder: Arc<dyn ProjectCommandBuilder>,
    pub project_command_runner: Arc<dyn ProjectCommandRunner>,
    pub config: RunnerConfig,
}

impl CommandRunner {
    /// Run the request on its own task. The returned handle resolves once
    /// the request reached a terminal state; it never carries a panic from
    /// the request itself.
    pub fn spawn(self: &Arc<Self>, request: CommentCommandRequest) -> JoinHandle<()> {
        let runner = Arc::clone(self);
        tokio::spawn(async move { runner.run_comment_command(request).await })
    }

    /// Run one comment command to a terminal state.
    ///
    /// All outcomes are observed through the VCS client, the commit status
    /// updater and the logs.
    pub async fn run_comment_command(&self, request: CommentCommandRequest) {
        let span = obs::request_span(Uuid::new_v4(), &request.base_repo.full_name, request.pull_num);
        let base_repo = request.base_repo.clone();
        let pull_num = request.pull_num;
        let commented = AtomicBool::new(false);

        let result = catch_panics(self.execute(request, &commented))
            .instrument(span.clone())
            .await;

        if let Err(panicked) = result {
            async {
                obs::emit_command_panicked(&panicked);
                if commented.load(Ordering::SeqCst) {
                    error!("comment already posted for this request, not reporting the panic");
                    return;
                }
                self.comment(&base_repo, pull_num, &panicked.comment(), &commented)
                    .await;
            }
            .instrument(span)
            .await;
        }
    }

    async fn execute(&self, request: CommentCommandRequest, commented: &AtomicBool) {
        let CommentCommandRequest {
            base_repo,
            maybe_head_repo,
            maybe_pull,
            user,
            pull_num,
            command,
        } = request;
        let host = base_repo.host_type();
        obs::emit_command_received(host, command.as_ref().map(|c| c.name), &user.username);

        let gate = AuthorizationGate::new(&self.config);
        let source = match gate.require_provider(host, self.pull_source(host)) {
            Ok(source) => source,
            Err(rejection) => {
                self.reject(&base_repo, pull_num, &rejection, commented).await;
                return;
            }
        };

        let (pull, head_repo) = match self
            .resolve_pull(source, &base_repo, maybe_head_repo, maybe_pull, pull_num)
            .await
        {
            Ok(resolved) => resolved,
            Err(err) => {
                obs::emit_command_failed(&err);
                self.comment(&base_repo, pull_num, &err.comment(), commented)
                    .await;
                return;
            }
        };

        if let Err(rejection) = gate.check_pull(&base_repo, &head_repo, &pull) {
            self.reject(&base_repo, pull_num, &rejection, commented).await;
            return;
        }

        let Some(command) = command else {
            warn!("no command to run for this comment");
            return;
        };

        let ctx = CommandContext {
            base_repo,
            head_repo,
            pull,
            user,
        };
        let outcome = self.build_and_run(&ctx, &command).await;
        self.report(&ctx.base_repo, &ctx.pull, &outcome, commented)
            .await;
    }

    fn pull_source(&self, host: VcsHostType) -> Option<PullSource<'_>> {
        match host {
            VcsHostType::Github => self
                .github_pull_getter
                .as_deref()
                .map(PullSource::Github),
            VcsHostType::Gitlab => self
                .gitlab_merge_request_getter
                .as_deref()
                .map(PullSource::Gitlab),
        }
    }

    /// Fetch (unless the raw pull was supplied) and parse the pull request.
    /// Returns the pull request and its head repository.
    async fn resolve_pull(
        &self,
        source: PullSource<'_>,
        base_repo: &Repo,
        maybe_head_repo: Option<Repo>,
        maybe_pull: Option<RawPull>,
        pull_num: u64,
    ) -> Result<(PullRequest, Repo), PullResolutionError> {
        match source {
            PullSource::Github(getter) => {
                let raw = match maybe_pull {
                    Some(RawPull::Github(raw)) => raw,
                    _ => getter
                        .get_pull_request(base_repo, pull_num)
                        .await
                        .map_err(PullResolutionError::GithubFetch)?,
                };
                let parsed = self.event_parser.parse_github_pull(&raw)?;
                Ok((parsed.pull, parsed.head_repo))
            }
            PullSource::Gitlab(getter) => {
                let raw = match maybe_pull {
                    Some(RawPull::Gitlab(raw)) => raw,
                    _ => getter
                        .get_merge_request(&base_repo.full_name, pull_num)
                        .await
                        .map_err(PullResolutionError::GitlabFetch)?,
                };
                let pull = self
                    .event_parser
                    .parse_gitlab_merge_request(&raw, base_repo)?;
                let head_repo = maybe_head_repo.unwrap_or_else(|| base_repo.clone());
                Ok((pull, head_repo))
            }
        }
    }

    /// Expand the command into projects and run them. Results keep builder
    /// order however many run at once.
    async fn build_and_run(&self, ctx: &CommandContext, command: &CommentCommand) -> ExecutionOutcome {
        let projects = match self
            .project_command_builder
            .build_commands(ctx, command)
            .await
        {
            Ok(projects) => projects,
            Err(err) => {
                warn!(error = %err, "building project commands failed");
                return ExecutionOutcome::from_build_error(command.name, &err);
            }
        };
        debug!(projects = projects.len(), "running project commands");

        let runner = &self.project_command_runner;
        let results = stream::iter(projects)
            .map(|project| async move { runner.run(&project).await })
            .buffered(self.config.parallel_projects.max(1))
            .collect::<Vec<_>>()
            .await;
        ExecutionOutcome::from_results(command.name, results)
    }

    /// Post the commit status and the rendered comment. Both are attempted
    /// independently and failures are only logged.
    async fn report(
        &self,
        base_repo: &Repo,
        pull: &PullRequest,
        outcome: &ExecutionOutcome,
        commented: &AtomicBool,
    ) {
        let status = outcome.overall_status();
        if outcome.command.updates_commit_status() {
            if let Err(err) = self
                .commit_status_updater
                .update(base_repo, pull, status, outcome.command)
                .await
            {
                error!(error = %err, "unable to update commit status");
            }
        }

        let body = self.renderer.render(outcome);
        self.comment(base_repo, pull.num, &body, commented).await;
        obs::emit_command_reported(outcome, status);
    }

    /// Report a gate rejection: user-visible ones are commented back, the
    /// rest are only logged.
    async fn reject(&self, repo: &Repo, pull_num: u64, rejection: &Rejection, commented: &AtomicBool) {
        if !rejection.is_user_visible() {
            error!("{rejection}");
            return;
        }
        obs::emit_command_rejected(rejection);
        self.comment(repo, pull_num, &rejection.to_string(), commented)
            .await;
    }

    /// Post a comment unless one was already posted for this request.
    async fn comment(&self, repo: &Repo, pull_num: u64, body: &str, commented: &AtomicBool) {
        if commented.swap(true, Ordering::SeqCst) {
            error!("refusing to post a second comment for this request");
            return;
        }
        if let Err(err) = self.vcs_client.create_comment(repo, pull_num, body).await {
            error!(error = %err, "unable to comment on pull request");
        }
    }
}
