//! Error types for project command execution.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("no program configured to run project commands")]
    EmptyCommand,

    #[error("starting {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },

    #[error("waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ExecError>;
