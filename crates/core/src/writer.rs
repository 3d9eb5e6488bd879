//! One log file per run.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::HarnessError;
use crate::record::RunRecord;

/// An open, not yet written run log. Consumed by [`LogWriter::finish`];
/// the file handle is released on every path out of this type.
#[derive(Debug)]
pub struct LogWriter {
    path: PathBuf,
    out: BufWriter<File>,
}

impl LogWriter {
    /// File name for a run: `<action>-<stamp>-<run id prefix>.txt`.
    pub fn file_name(action: &str, stamp: &str, run_id: &str) -> String {
        format!("{}-{}-{}.txt", action, stamp, run_id)
    }

    /// Create `dir` if needed and open a fresh log file in it. An existing
    /// file with the same name is never overwritten.
    pub fn create(dir: &Path, action: &str, stamp: &str, run_id: &str) -> Result<Self, HarnessError> {
        fs::create_dir_all(dir).map_err(|source| HarnessError::CreateLogDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(Self::file_name(action, stamp, run_id));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| HarnessError::CreateLogFile {
                path: path.clone(),
                source,
            })?;
        Ok(LogWriter {
            path,
            out: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `record` as indented JSON, flush, sync, and close.
    pub fn finish(mut self, record: &RunRecord) -> Result<PathBuf, HarnessError> {
        let text = record.to_pretty_json()?;
        let path = self.path.clone();
        let write_err = |source| HarnessError::WriteLog {
            path: path.clone(),
            source,
        };
        self.out.write_all(text.as_bytes()).map_err(write_err)?;
        self.out.write_all(b"\n").map_err(write_err)?;
        self.out.flush().map_err(write_err)?;
        self.out.get_ref().sync_all().map_err(write_err)?;
        Ok(self.path)
    }
}
