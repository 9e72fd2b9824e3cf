//! Infrastructure-level errors (wraps application errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::application::ApplicationError;

/// Failures of the process environment the services run in.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("cannot resolve working directory: {0}")]
    WorkingDir(#[source] std::io::Error),

    #[error("config directory {} is not a directory", .0.display())]
    ConfigDir(PathBuf),
}
