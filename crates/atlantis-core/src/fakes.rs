//! In-memory fakes for every collaborator (testing only).
//!
//! The recording fakes capture each call so tests can assert on exactly which
//! side effects a request produced. Stubs are scripted with [`Stub`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{BuildError, FetchError, ParseError, VcsError};
use crate::event_parser::{EventParser, ParsedPull};
use crate::models::{
    CommandContext, CommandName, CommentCommand, CommitStatus, ProjectCommandContext,
    ProjectResult, ProjectStatus, PullRequest, Repo,
};
use crate::project::{ProjectCommandBuilder, ProjectCommandRunner};
use crate::vcs::{
    CommitStatusUpdater, GithubPull, GithubPullGetter, GitlabMergeRequest,
    GitlabMergeRequestGetter, VcsClient,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted behaviour of a stubbed call.
#[derive(Debug, Clone)]
pub enum Stub<T> {
    Return(T),
    Fail(String),
    Panic(String),
}

impl<T: Clone> Stub<T> {
    fn resolve<E>(&self, fail: impl FnOnce(String) -> E) -> Result<T, E> {
        match self {
            Stub::Return(value) => Ok(value.clone()),
            Stub::Fail(msg) => Err(fail(msg.clone())),
            Stub::Panic(msg) => panic!("{msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// VCS client / status updater
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedComment {
    pub repo: Repo,
    pub pull_num: u64,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedStatus {
    pub repo: Repo,
    pub pull_num: u64,
    pub status: CommitStatus,
    pub description: String,
}

/// [`VcsClient`] that records comments and statuses.
#[derive(Debug, Default)]
pub struct RecordingVcsClient {
    comments: Mutex<Vec<PostedComment>>,
    statuses: Mutex<Vec<PostedStatus>>,
    comment_error: Option<String>,
}

impl RecordingVcsClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record comments but report every one as failed.
    pub fn failing_comments(msg: impl Into<String>) -> Self {
        Self {
            comment_error: Some(msg.into()),
            ..Self::default()
        }
    }

    pub fn comments(&self) -> Vec<PostedComment> {
        lock(&self.comments).clone()
    }

    pub fn statuses(&self) -> Vec<PostedStatus> {
        lock(&self.statuses).clone()
    }
}

#[async_trait]
impl VcsClient for RecordingVcsClient {
    async fn create_comment(&self, repo: &Repo, pull_num: u64, body: &str) -> Result<(), VcsError> {
        lock(&self.comments).push(PostedComment {
            repo: repo.clone(),
            pull_num,
            body: body.to_string(),
        });
        match &self.comment_error {
            Some(msg) => Err(VcsError::Api(msg.clone())),
            None => Ok(()),
        }
    }

    async fn update_status(
        &self,
        repo: &Repo,
        pull: &PullRequest,
        status: CommitStatus,
        description: &str,
    ) -> Result<(), VcsError> {
        lock(&self.statuses).push(PostedStatus {
            repo: repo.clone(),
            pull_num: pull.num,
            status,
            description: description.to_string(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub repo: Repo,
    pub pull_num: u64,
    pub status: CommitStatus,
    pub command: CommandName,
}

/// [`CommitStatusUpdater`] that records updates.
#[derive(Debug, Default)]
pub struct RecordingStatusUpdater {
    updates: Mutex<Vec<StatusUpdate>>,
    error: Option<String>,
}

impl RecordingStatusUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record updates but report every one as failed.
    pub fn failing(msg: impl Into<String>) -> Self {
        Self {
            error: Some(msg.into()),
            ..Self::default()
        }
    }

    pub fn updates(&self) -> Vec<StatusUpdate> {
        lock(&self.updates).clone()
    }
}

#[async_trait]
impl CommitStatusUpdater for RecordingStatusUpdater {
    async fn update(
        &self,
        repo: &Repo,
        pull: &PullRequest,
        status: CommitStatus,
        command: CommandName,
    ) -> Result<(), VcsError> {
        lock(&self.updates).push(StatusUpdate {
            repo: repo.clone(),
            pull_num: pull.num,
            status,
            command,
        });
        match &self.error {
            Some(msg) => Err(VcsError::Api(msg.clone())),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Pull request sources
// ---------------------------------------------------------------------------

/// Scripted [`GithubPullGetter`].
#[derive(Debug)]
pub struct StubGithubPullGetter {
    behavior: Stub<GithubPull>,
    calls: Mutex<Vec<(String, u64)>>,
}

impl StubGithubPullGetter {
    pub fn new(behavior: Stub<GithubPull>) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(repo full name, pull number)` of every call.
    pub fn calls(&self) -> Vec<(String, u64)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl GithubPullGetter for StubGithubPullGetter {
    async fn get_pull_request(&self, repo: &Repo, num: u64) -> Result<GithubPull, FetchError> {
        lock(&self.calls).push((repo.full_name.clone(), num));
        self.behavior.resolve(FetchError::Transport)
    }
}

/// Scripted [`GitlabMergeRequestGetter`].
#[derive(Debug)]
pub struct StubGitlabMergeRequestGetter {
    behavior: Stub<GitlabMergeRequest>,
    calls: Mutex<Vec<(String, u64)>>,
}

impl StubGitlabMergeRequestGetter {
    pub fn new(behavior: Stub<GitlabMergeRequest>) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, u64)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl GitlabMergeRequestGetter for StubGitlabMergeRequestGetter {
    async fn get_merge_request(
        &self,
        repo_full_name: &str,
        num: u64,
    ) -> Result<GitlabMergeRequest, FetchError> {
        lock(&self.calls).push((repo_full_name.to_string(), num));
        self.behavior.resolve(FetchError::Transport)
    }
}

// ---------------------------------------------------------------------------
// Event parser
// ---------------------------------------------------------------------------

/// Scripted [`EventParser`]. Unscripted providers fail to parse.
#[derive(Debug)]
pub struct StubEventParser {
    github: Stub<ParsedPull>,
    gitlab: Stub<PullRequest>,
}

impl StubEventParser {
    pub fn github(behavior: Stub<ParsedPull>) -> Self {
        Self {
            github: behavior,
            gitlab: Stub::Fail("gitlab parsing not stubbed".to_string()),
        }
    }

    pub fn gitlab(behavior: Stub<PullRequest>) -> Self {
        Self {
            github: Stub::Fail("github parsing not stubbed".to_string()),
            gitlab: behavior,
        }
    }
}

impl EventParser for StubEventParser {
    fn parse_github_pull(&self, _pull: &GithubPull) -> Result<ParsedPull, ParseError> {
        self.github.resolve(ParseError::Invalid)
    }

    fn parse_gitlab_merge_request(
        &self,
        _mr: &GitlabMergeRequest,
        _base_repo: &Repo,
    ) -> Result<PullRequest, ParseError> {
        self.gitlab.resolve(ParseError::Invalid)
    }
}

// ---------------------------------------------------------------------------
// Project builder / runner
// ---------------------------------------------------------------------------

/// [`ProjectCommandBuilder`] that expands every command into a fixed list of
/// directories, or fails with a fixed error.
#[derive(Debug)]
pub struct StaticProjectCommandBuilder {
    dirs: Result<Vec<String>, BuildError>,
    calls: Mutex<usize>,
}

impl StaticProjectCommandBuilder {
    pub fn dirs(dirs: &[&str]) -> Self {
        Self {
            dirs: Ok(dirs.iter().map(|d| d.to_string()).collect()),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(err: BuildError) -> Self {
        Self {
            dirs: Err(err),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *lock(&self.calls)
    }
}

#[async_trait]
impl ProjectCommandBuilder for StaticProjectCommandBuilder {
    async fn build_commands(
        &self,
        ctx: &CommandContext,
        command: &CommentCommand,
    ) -> Result<Vec<ProjectCommandContext>, BuildError> {
        *lock(&self.calls) += 1;
        let dirs = self.dirs.clone()?;
        Ok(dirs
            .into_iter()
            .map(|dir| ProjectCommandContext {
                base_repo: ctx.base_repo.clone(),
                head_repo: ctx.head_repo.clone(),
                pull: ctx.pull.clone(),
                user: ctx.user.clone(),
                command: command.name,
                repo_rel_dir: dir,
                workspace: command
                    .workspace
                    .clone()
                    .unwrap_or_else(|| "default".to_string()),
                extra_args: command.flags.clone(),
            })
            .collect())
    }
}

/// [`ProjectCommandRunner`] with per-directory scripted results and delays.
/// Unscripted directories succeed with `ran <command> in <dir>`.
#[derive(Debug, Default)]
pub struct ScriptedProjectCommandRunner {
    results: HashMap<String, (ProjectStatus, String)>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProjectCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(
        mut self,
        dir: impl Into<String>,
        status: ProjectStatus,
        output: impl Into<String>,
    ) -> Self {
        self.results.insert(dir.into(), (status, output.into()));
        self
    }

    pub fn with_delay(mut self, dir: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(dir.into(), delay);
        self
    }

    /// Directories in the order their runs started.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl ProjectCommandRunner for ScriptedProjectCommandRunner {
    async fn run(&self, ctx: &ProjectCommandContext) -> ProjectResult {
        lock(&self.calls).push(ctx.repo_rel_dir.clone());
        if let Some(delay) = self.delays.get(&ctx.repo_rel_dir) {
            tokio::time::sleep(*delay).await;
        }
        match self.results.get(&ctx.repo_rel_dir) {
            Some((status, output)) => ProjectResult {
                repo_rel_dir: ctx.repo_rel_dir.clone(),
                workspace: ctx.workspace.clone(),
                status: *status,
                output: output.clone(),
            },
            None => ProjectResult::success(
                ctx,
                format!("ran {} in {}", ctx.command, ctx.repo_rel_dir),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Canonical test values.
pub mod fixtures {
    use crate::event_parser::ParsedPull;
    use crate::models::{PullRequest, PullState, Repo, User, VcsHost, VcsHostType};
    use crate::vcs::github::{GithubBranch, GithubRepository, GithubUser};
    use crate::vcs::{GithubPull, GitlabMergeRequest};

    fn repo(host_type: VcsHostType, hostname: &str, owner: &str) -> Repo {
        let full_name = format!("{owner}/atlantis");
        Repo {
            clone_url: format!("https://user:password@{hostname}/{full_name}.git"),
            sanitized_clone_url: format!("https://user:<redacted>@{hostname}/{full_name}.git"),
            full_name,
            owner: owner.to_string(),
            name: "atlantis".to_string(),
            vcs_host: VcsHost {
                hostname: hostname.to_string(),
                host_type,
            },
        }
    }

    pub fn github_repo() -> Repo {
        repo(VcsHostType::Github, "github.com", "runatlantis")
    }

    pub fn gitlab_repo() -> Repo {
        repo(VcsHostType::Gitlab, "gitlab.com", "runatlantis")
    }

    /// Same repository name, different owner.
    pub fn github_fork() -> Repo {
        repo(VcsHostType::Github, "github.com", "forkrepo")
    }

    pub fn user() -> User {
        User::new("lkysow")
    }

    pub fn pull() -> PullRequest {
        PullRequest {
            num: 1,
            head_commit: "8ed0280678d49d42cd286610aabcfceb5bb673c6".to_string(),
            url: "https://github.com/runatlantis/atlantis/pull/1".to_string(),
            head_branch: "branch".to_string(),
            base_branch: "main".to_string(),
            author: "lkysow".to_string(),
            state: PullState::Open,
            base_repo: github_repo(),
        }
    }

    pub fn parsed_pull(head_repo: Repo, state: PullState) -> ParsedPull {
        let mut pull = pull();
        pull.state = state;
        ParsedPull {
            pull,
            base_repo: github_repo(),
            head_repo,
        }
    }

    pub fn github_pull() -> GithubPull {
        GithubPull {
            number: Some(1),
            state: Some("open".to_string()),
            merged: Some(false),
            html_url: Some("https://github.com/runatlantis/atlantis/pull/1".to_string()),
            user: Some(GithubUser {
                login: Some("lkysow".to_string()),
            }),
            head: Some(GithubBranch {
                git_ref: Some("branch".to_string()),
                sha: Some("8ed0280678d49d42cd286610aabcfceb5bb673c6".to_string()),
                repo: Some(GithubRepository {
                    full_name: Some("runatlantis/atlantis".to_string()),
                    clone_url: Some("https://github.com/runatlantis/atlantis.git".to_string()),
                }),
            }),
            base: Some(GithubBranch {
                git_ref: Some("main".to_string()),
                sha: None,
                repo: Some(GithubRepository {
                    full_name: Some("runatlantis/atlantis".to_string()),
                    clone_url: Some("https://github.com/runatlantis/atlantis.git".to_string()),
                }),
            }),
        }
    }

    pub fn gitlab_merge_request() -> GitlabMergeRequest {
        GitlabMergeRequest {
            iid: Some(1),
            state: Some("opened".to_string()),
            sha: Some("8ed0280678d49d42cd286610aabcfceb5bb673c6".to_string()),
            web_url: Some("https://gitlab.com/runatlantis/atlantis/merge_requests/1".to_string()),
            source_branch: Some("branch".to_string()),
            target_branch: Some("main".to_string()),
            author: Some(crate::vcs::gitlab::GitlabUser {
                username: Some("lkysow".to_string()),
            }),
        }
    }
}
