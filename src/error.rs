use std::io;

use thiserror::Error;

/// Everything that can abort a clean run.
#[derive(Debug, Error)]
pub enum Error {
    // Configuration
    #[error("invalid duration {input:?}: {reason}")]
    InvalidDuration { input: String, reason: String },

    // Fetching the release inventory
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("command {command} {status}, {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("failed to decode release list: {0}")]
    Decode(#[from] serde_json::Error),

    // Selection
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("release {release} has an unparsable update time {updated:?}: {reason}")]
    InvalidTimestamp {
        release: String,
        updated: String,
        reason: String,
    },

    // Deletion
    #[error("failed to uninstall release {release}: {output}")]
    Uninstall { release: String, output: String },

    #[error("failed to uninstall release {release}, could not run {program}: {source}")]
    UninstallSpawn {
        release: String,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
