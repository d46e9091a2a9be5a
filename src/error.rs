use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("Task '{0}' is not registered")]
    UnknownTask(String),

    #[error("Dependency cycle through task '{0}'")]
    Cycle(String),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Couldn't start '{command}'.\n{source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}.\n{stderr}{stdout}")]
    Tool {
        command: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },

    #[error("Couldn't stage the intermediate artifact.\n{0}")]
    Io(#[from] std::io::Error),

    #[error("Couldn't convert path to UTF-8.\n{0}")]
    PathFormat(#[from] camino::FromPathBufError),
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Couldn't touch the build directory.\n{0}")]
    Io(#[from] std::io::Error),

    #[error("Couldn't compile glob pattern.\n{0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Couldn't run glob.\n{0}")]
    Glob(#[from] glob::GlobError),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Task '{0}':\n{1}")]
    Task(String, anyhow::Error),
}
