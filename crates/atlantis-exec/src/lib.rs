//! Atlantis Exec: project command expansion and execution
//!
//! - [`DefaultProjectCommandBuilder`]: one project at the repository root,
//!   or at the directory named with `-d`
//! - [`ShellProjectCommandRunner`]: runs the configured program per project
//!   with a timeout

pub mod builder;
pub mod config;
pub mod error;
pub mod runner;

pub use builder::{DefaultProjectCommandBuilder, DEFAULT_WORKSPACE};
pub use config::ExecConfig;
pub use error::{ExecError, Result};
pub use runner::ShellProjectCommandRunner;
