//! Best-effort source-control identity.
//!
//! A run outside a repository, on a host without `git`, or in a directory
//! the user cannot read is still a valid run; sources report `None` and the
//! orchestrator records that fact instead of failing.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Serialize;

/// Commit and branch of the working tree a run started in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VcsIdentity {
    pub commit: String,
    /// `None` on a detached HEAD.
    pub branch: Option<String>,
}

pub trait VcsSource {
    /// `None` when the identity cannot be determined for any reason.
    fn identity(&self) -> Option<VcsIdentity>;
}

/// Asks the `git` executable about the repository containing `dir`.
#[derive(Debug, Clone)]
pub struct GitCli {
    dir: PathBuf,
    ceiling: Option<PathBuf>,
}

impl GitCli {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        GitCli {
            dir: dir.into(),
            ceiling: None,
        }
    }

    /// Stop repository discovery at `ceiling` (`GIT_CEILING_DIRECTORIES`).
    pub fn with_ceiling_dir(mut self, ceiling: impl Into<PathBuf>) -> Self {
        self.ceiling = Some(ceiling.into());
        self
    }

    fn git(&self, args: &[&str]) -> Option<String> {
        let mut command = Command::new("git");
        command
            .args(args)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stderr(Stdio::null());
        if let Some(ceiling) = &self.ceiling {
            command.env("GIT_CEILING_DIRECTORIES", ceiling);
        }
        let output = command.output();
        let output = match output {
            Ok(o) => o,
            Err(e) => {
                tracing::debug!(error = %e, "git could not be started");
                return None;
            }
        };
        if !output.status.success() {
            tracing::debug!(status = %output.status, ?args, "git exited unsuccessfully");
            return None;
        }
        let text = String::from_utf8(output.stdout).ok()?;
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

impl VcsSource for GitCli {
    fn identity(&self) -> Option<VcsIdentity> {
        let commit = self.git(&["rev-parse", "HEAD"])?;
        let branch = self.git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        // rev-parse prints the literal "HEAD" when no branch is checked out
        let branch = (branch != "HEAD").then_some(branch);
        Some(VcsIdentity { commit, branch })
    }
}
