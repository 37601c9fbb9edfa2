//! Typed configuration errors.
//!
//! Deciding on corrupt input is unsafe, so these abort the iteration. Callers
//! can tell them apart from other failures with `downcast_ref::<ConfigError>()`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("{} failed schema validation: {}", .path.display(), .messages.join("; "))]
    Schema {
        path: PathBuf,
        messages: Vec<String>,
    },
    #[error("invalid config {}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Schema { path, .. }
            | ConfigError::Invalid { path, .. } => path,
        }
    }
}
