//! Process-wide facts captured once, before any user code runs.

use std::env;
use std::path::PathBuf;
use std::process::Command;

use time::OffsetDateTime;

use crate::clock::{format_timestamp, Clock};
use crate::error::HarnessError;
use crate::record::RunRecord;
use crate::{HARNESS_VERSION, RECORD_SCHEMA_VERSION};

#[derive(Debug, Clone)]
pub struct SystemSnapshot {
    pub run_id: String,
    pub argv: Vec<String>,
    pub os: String,
    pub user: String,
    pub host: String,
    pub harness_version: String,
    pub cwd: PathBuf,
    pub start_time: OffsetDateTime,
    /// Empty when the user action does not name its application.
    pub app_name: String,
}

impl SystemSnapshot {
    /// Capture the environment. `argv` is passed in rather than read from
    /// the process so callers decide what gets recorded.
    pub fn capture(argv: &[String], app_name: String, clock: &dyn Clock) -> Self {
        SystemSnapshot {
            run_id: new_run_id(),
            argv: argv.to_vec(),
            os: env::consts::OS.to_string(),
            user: current_user(),
            host: current_host(),
            harness_version: HARNESS_VERSION.to_string(),
            cwd: env::current_dir().unwrap_or_default(),
            start_time: clock.now(),
            app_name,
        }
    }

    /// First eight hex digits of the run id.
    pub fn short_run_id(&self) -> &str {
        let end = self.run_id.len().min(8);
        &self.run_id[..end]
    }

    /// Append the system facts, in their fixed order, to `record`.
    pub fn write_into(&self, record: &mut RunRecord) -> Result<(), HarnessError> {
        record.insert("schema_version", RECORD_SCHEMA_VERSION)?;
        record.insert("run_id", &self.run_id)?;
        record.insert("argv", &self.argv)?;
        record.insert("os", &self.os)?;
        record.insert("user", &self.user)?;
        record.insert("host", &self.host)?;
        record.insert("harness_version", &self.harness_version)?;
        record.insert("cwd", self.cwd.display().to_string())?;
        record.insert("start_time", format_timestamp(self.start_time))?;
        if !self.app_name.is_empty() {
            record.insert("app_name", &self.app_name)?;
        }
        Ok(())
    }
}

/// 128 random bits as 32 lowercase hex digits.
pub fn new_run_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

fn current_user() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|key| env::var(key).ok().filter(|v| !v.is_empty()))
        .unwrap_or_default()
}

fn current_host() -> String {
    if let Ok(hostname) = std::fs::read_to_string("/etc/hostname") {
        let hostname = hostname.trim();
        if !hostname.is_empty() {
            return hostname.to_string();
        }
    }
    for key in ["HOSTNAME", "COMPUTERNAME"] {
        if let Ok(hostname) = env::var(key) {
            if !hostname.is_empty() {
                return hostname;
            }
        }
    }
    Command::new("hostname")
        .output()
        .ok()
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
