//! Project-level collaborator contracts.

use async_trait::async_trait;

use crate::error::BuildError;
use crate::models::{CommandContext, CommentCommand, ProjectCommandContext, ProjectResult};

/// Expands one comment command into zero or more project units.
///
/// The returned order is the order results are reported in.
#[async_trait]
pub trait ProjectCommandBuilder: Send + Sync {
    async fn build_commands(
        &self,
        ctx: &CommandContext,
        command: &CommentCommand,
    ) -> Result<Vec<ProjectCommandContext>, BuildError>;
}

/// Runs one project unit. Failures are encoded in the returned
/// [`ProjectResult`], never returned as an error.
#[async_trait]
pub trait ProjectCommandRunner: Send + Sync {
    async fn run(&self, ctx: &ProjectCommandContext) -> ProjectResult;
}
