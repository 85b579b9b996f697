//! Comment rendering.

use std::fmt::Write as _;

use crate::models::{CommandName, ProjectResult, ProjectStatus};
use crate::outcome::ExecutionOutcome;

/// Usage text posted for `atlantis help`.
pub const HELP_TEXT: &str = "```cmake
atlantis
Terraform For Teams

Usage:
  atlantis <command> [options] -- [terraform options]

Examples:
  # run plan in the root directory passing the -target flag to terraform
  atlantis plan -d . -- -target=resource

  # apply all unapplied plans
  atlantis apply

  # apply the plan for the root directory and staging workspace
  atlantis apply -d . -w staging

Commands:
  plan   Runs 'terraform plan' for the changes in this pull request.
  apply  Runs 'terraform apply' on all unapplied plans.
  unlock Removes all atlantis locks and discards all plans for this PR.
  help   View help.

Flags:
  -h, --help   help for atlantis
```";

/// Turns an [`ExecutionOutcome`] into a comment body.
///
/// Rendering must be deterministic: identical outcomes yield identical text.
pub trait CommentRenderer: Send + Sync {
    fn render(&self, outcome: &ExecutionOutcome) -> String;
}

/// Markdown renderer for GitHub and GitLab comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    fn heading(result: &ProjectResult) -> String {
        format!(
            "dir: `{}` workspace: `{}`",
            result.repo_rel_dir, result.workspace
        )
    }

    fn section(command: CommandName, result: &ProjectResult) -> String {
        let output = result.output.trim_end();
        match result.status {
            ProjectStatus::Success => format!("```\n{output}\n```"),
            ProjectStatus::Failure => {
                format!("**{} Failed**\n```\n{output}\n```", command.title())
            }
            ProjectStatus::Error => {
                format!("**{} Error**\n```\n{output}\n```", command.title())
            }
        }
    }
}

impl CommentRenderer for MarkdownRenderer {
    fn render(&self, outcome: &ExecutionOutcome) -> String {
        let title = outcome.command.title();

        if let Some(err) = &outcome.error {
            return format!("**{title} Error**\n```\n{}\n```", err.trim_end());
        }
        if outcome.command == CommandName::Help {
            return HELP_TEXT.to_string();
        }

        match outcome.results.as_slice() {
            [] => format!("Ran {title} for 0 projects"),
            [only] => format!(
                "Ran {title} in {}\n\n{}",
                Self::heading(only),
                Self::section(outcome.command, only)
            ),
            results => {
                let mut body = format!("Ran {title} for {} projects:\n", results.len());
                for (i, result) in results.iter().enumerate() {
                    let _ = writeln!(body, "{}. {}", i + 1, Self::heading(result));
                }
                for (i, result) in results.iter().enumerate() {
                    let _ = write!(
                        body,
                        "\n### {}. {}\n{}\n",
                        i + 1,
                        Self::heading(result),
                        Self::section(outcome.command, result)
                    );
                    if i + 1 < results.len() {
                        body.push_str("\n---\n");
                    }
                }
                body
            }
        }
    }
}
