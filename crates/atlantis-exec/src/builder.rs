//! Default project command builder.
//!
//! A command targets the repository root unless the user named a directory
//! with `-d`. Only `plan` and `apply` expand into project runs.

use std::path::{Component, Path};

use async_trait::async_trait;
use tracing::debug;

use atlantis_core::{
    BuildError, CommandContext, CommandName, CommentCommand, ProjectCommandBuilder,
    ProjectCommandContext,
};

use crate::config::ExecConfig;

/// Workspace used when the comment does not name one.
pub const DEFAULT_WORKSPACE: &str = "default";

pub struct DefaultProjectCommandBuilder {
    config: ExecConfig,
}

impl DefaultProjectCommandBuilder {
    pub fn new(config: ExecConfig) -> Self {
        Self { config }
    }

    /// Normalise a user-supplied directory into a repo-relative path.
    /// Absolute paths and `..` components are rejected.
    pub fn clean_dir(dir: &str) -> Result<String, BuildError> {
        let invalid = |reason: &str| BuildError::InvalidDir {
            dir: dir.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = Vec::new();
        for component in Path::new(dir).components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir => return Err(invalid("must not contain '..'")),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid("must be relative to the repository root"))
                }
            }
        }
        if parts.is_empty() {
            return Ok(".".to_string());
        }
        Ok(parts.join("/"))
    }
}

#[async_trait]
impl ProjectCommandBuilder for DefaultProjectCommandBuilder {
    async fn build_commands(
        &self,
        ctx: &CommandContext,
        command: &CommentCommand,
    ) -> Result<Vec<ProjectCommandContext>, BuildError> {
        if !matches!(command.name, CommandName::Plan | CommandName::Apply) {
            return Ok(Vec::new());
        }

        let repo_rel_dir = match &command.dir {
            Some(dir) => Self::clean_dir(dir)?,
            None => ".".to_string(),
        };
        let is_dir = tokio::fs::metadata(self.config.root_dir.join(&repo_rel_dir))
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(BuildError::InvalidDir {
                dir: repo_rel_dir,
                reason: "directory does not exist".to_string(),
            });
        }

        let workspace = command
            .workspace
            .clone()
            .unwrap_or_else(|| DEFAULT_WORKSPACE.to_string());
        debug!(dir = %repo_rel_dir, %workspace, "built project command");

        Ok(vec![ProjectCommandContext {
            base_repo: ctx.base_repo.clone(),
            head_repo: ctx.head_repo.clone(),
            pull: ctx.pull.clone(),
            user: ctx.user.clone(),
            command: command.name,
            repo_rel_dir,
            workspace,
            extra_args: command.flags.clone(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlantis_core::fakes::fixtures;
    use tempfile::TempDir;

    fn ctx() -> CommandContext {
        CommandContext {
            base_repo: fixtures::github_repo(),
            head_repo: fixtures::github_repo(),
            pull: fixtures::pull(),
            user: fixtures::user(),
        }
    }

    #[test]
    fn test_clean_dir() {
        assert_eq!(DefaultProjectCommandBuilder::clean_dir("").unwrap(), ".");
        assert_eq!(DefaultProjectCommandBuilder::clean_dir("./").unwrap(), ".");
        assert_eq!(
            DefaultProjectCommandBuilder::clean_dir("./env/staging/").unwrap(),
            "env/staging"
        );
        assert!(DefaultProjectCommandBuilder::clean_dir("../other").is_err());
        assert!(DefaultProjectCommandBuilder::clean_dir("env/../../x").is_err());
        assert!(DefaultProjectCommandBuilder::clean_dir("/etc").is_err());
    }

    #[tokio::test]
    async fn test_defaults_to_repo_root_and_default_workspace() {
        let root = TempDir::new().unwrap();
        let builder = DefaultProjectCommandBuilder::new(ExecConfig::new(root.path()));
        let command = CommentCommand::new(CommandName::Plan).with_flags(vec!["-lock=false".into()]);

        let projects = builder.build_commands(&ctx(), &command).await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].repo_rel_dir, ".");
        assert_eq!(projects[0].workspace, "default");
        assert_eq!(projects[0].command, CommandName::Plan);
        assert_eq!(projects[0].extra_args, vec!["-lock=false".to_string()]);
    }

    #[tokio::test]
    async fn test_dir_and_workspace_filters() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("env/staging")).unwrap();
        let builder = DefaultProjectCommandBuilder::new(ExecConfig::new(root.path()));
        let command = CommentCommand::new(CommandName::Apply)
            .with_dir("env/staging/")
            .with_workspace("staging");

        let projects = builder.build_commands(&ctx(), &command).await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].repo_rel_dir, "env/staging");
        assert_eq!(projects[0].workspace, "staging");
    }

    #[tokio::test]
    async fn test_missing_dir_is_a_build_error() {
        let root = TempDir::new().unwrap();
        let builder = DefaultProjectCommandBuilder::new(ExecConfig::new(root.path()));
        let command = CommentCommand::new(CommandName::Plan).with_dir("nope");

        let err = builder.build_commands(&ctx(), &command).await.unwrap_err();
        assert!(matches!(err, BuildError::InvalidDir { ref dir, .. } if dir == "nope"));
    }

    #[tokio::test]
    async fn test_file_is_not_a_project_dir() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("main.tf"), "").unwrap();
        let builder = DefaultProjectCommandBuilder::new(ExecConfig::new(root.path()));
        let command = CommentCommand::new(CommandName::Plan).with_dir("main.tf");

        let err = builder.build_commands(&ctx(), &command).await.unwrap_err();
        assert!(matches!(err, BuildError::InvalidDir { ref dir, .. } if dir == "main.tf"));
        assert!(err.to_string().contains("directory does not exist"));
    }

    #[tokio::test]
    async fn test_parent_dir_is_rejected_before_touching_disk() {
        let root = TempDir::new().unwrap();
        let builder = DefaultProjectCommandBuilder::new(ExecConfig::new(root.path()));
        let command = CommentCommand::new(CommandName::Plan).with_dir("../..");

        let err = builder.build_commands(&ctx(), &command).await.unwrap_err();
        assert!(err.to_string().contains("'..'"));
    }

    #[tokio::test]
    async fn test_non_project_commands_expand_to_nothing() {
        let root = TempDir::new().unwrap();
        let builder = DefaultProjectCommandBuilder::new(ExecConfig::new(root.path()));

        for name in [CommandName::Help, CommandName::Unlock] {
            let projects = builder
                .build_commands(&ctx(), &CommentCommand::new(name))
                .await
                .unwrap();
            assert!(projects.is_empty());
        }
    }
}
