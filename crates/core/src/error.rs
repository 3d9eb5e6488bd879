use std::path::PathBuf;

/// Infrastructure failures. These abort the run: without a log file the run
/// cannot be audited, so none of them are swallowed.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The log directory did not exist and could not be created.
    #[error("cannot create log directory {}: {source}", .path.display())]
    CreateLogDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The per-run log file could not be opened.
    #[error("cannot create log file {}: {source}", .path.display())]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing or flushing the log file failed.
    #[error("cannot write log file {}: {source}", .path.display())]
    WriteLog {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The run record could not be serialized.
    #[error("cannot serialize run record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A lifecycle phase tried to write a key that an earlier phase owns.
    #[error("run record key '{0}' written twice")]
    DuplicateKey(String),

    /// No user action is registered under the derived name.
    #[error("no user action registered as '{name}' (target '{target}')")]
    UnknownTarget { name: String, target: String },

    /// The harness configuration file is unreadable or malformed.
    #[error("invalid configuration {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}
