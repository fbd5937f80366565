//! User-visible failures of a validation run.
//!
//! Probe failures never show up here; they are folded into
//! [`ProbeResult::Unreachable`](crate::proxy::ProbeResult).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot read endpoint list {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write results to {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SiftError {
    pub fn load(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Load {
            path: path.into(),
            source,
        }
    }

    pub fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_path() {
        let err = SiftError::load(
            "missing.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        let message = err.to_string();
        assert!(message.contains("missing.txt"));
        assert!(message.contains("not found"));

        let err = SiftError::Config("worker count must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "invalid configuration: worker count must be at least 1"
        );
    }
}
