//! Run lifecycle.
//!
//! For the `train` action the phases run exactly once, in order:
//!
//! 1. `Init` -- system facts captured at construction go into the record
//! 2. `CreateLog` -- the log directory and a fresh log file are created
//! 3. `CollectVcs` -- commit and branch, or `not_git_repo`
//! 4. `Execute` -- the user action's `train()`, the only fault-isolated call
//! 5. `CollectParameters` / `CollectInputFiles` / `CollectOutputFiles` --
//!    skipped when `Execute` failed
//! 6. `Finalize` -- `end_time` and `total_seconds`
//! 7. `Close` -- the record is serialized and the file closed
//!
//! Any other action is reported as unimplemented and creates no log.
//! Harness failures (log directory, log file, serialization) propagate.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::action::{ActionError, UserAction};
use crate::args::ParsedArguments;
use crate::clock::{elapsed_seconds, format_file_stamp, format_timestamp, Clock, SystemClock};
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::fingerprint::fingerprint;
use crate::record::RunRecord;
use crate::snapshot::SystemSnapshot;
use crate::vcs::{GitCli, VcsSource};
use crate::writer::LogWriter;

/// The only action with a lifecycle.
pub const TRAIN_ACTION: &str = "train";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    CreateLog,
    CollectVcs,
    Execute,
    CollectParameters,
    CollectInputFiles,
    CollectOutputFiles,
    Finalize,
    Close,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::CreateLog => "create_log",
            Phase::CollectVcs => "collect_vcs",
            Phase::Execute => "execute",
            Phase::CollectParameters => "collect_parameters",
            Phase::CollectInputFiles => "collect_input_files",
            Phase::CollectOutputFiles => "collect_output_files",
            Phase::Finalize => "finalize",
            Phase::Close => "close",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The action has no lifecycle; nothing was written.
    Unsupported { action: String },
    /// A log was written. `error` is set when the user action failed.
    Completed {
        log_path: PathBuf,
        run_id: String,
        phases: Vec<Phase>,
        error: Option<String>,
    },
}

pub struct Orchestrator {
    args: ParsedArguments,
    action: Box<dyn UserAction>,
    log_dir: PathBuf,
    clock: Box<dyn Clock>,
    vcs: Box<dyn VcsSource>,
    snapshot: SystemSnapshot,
    record: RunRecord,
    phases: Vec<Phase>,
}

impl Orchestrator {
    /// Orchestrator using the system clock and `git` in the working directory.
    pub fn new(args: ParsedArguments, action: Box<dyn UserAction>, config: &HarnessConfig) -> Self {
        Self::with_collaborators(
            args,
            action,
            config,
            Box::new(SystemClock),
            Box::new(GitCli::new(".")),
        )
    }

    /// The system snapshot, including the start time, is taken here,
    /// before any user code beyond the action's constructor has run.
    pub fn with_collaborators(
        args: ParsedArguments,
        action: Box<dyn UserAction>,
        config: &HarnessConfig,
        clock: Box<dyn Clock>,
        vcs: Box<dyn VcsSource>,
    ) -> Self {
        let snapshot = SystemSnapshot::capture(&args.raw_argv, action.app_name(), clock.as_ref());
        Orchestrator {
            args,
            action,
            log_dir: config.log_dir.clone(),
            clock,
            vcs,
            snapshot,
            record: RunRecord::new(),
            phases: Vec::new(),
        }
    }

    /// Record `argv` instead of the vector the arguments were parsed from.
    /// Binaries that strip their own flags before parsing pass the full
    /// process argument vector here.
    pub fn with_process_argv(mut self, argv: Vec<String>) -> Self {
        self.snapshot.argv = argv;
        self
    }

    pub fn snapshot(&self) -> &SystemSnapshot {
        &self.snapshot
    }

    pub fn run(self) -> Result<RunOutcome, HarnessError> {
        if self.args.action != TRAIN_ACTION {
            println!("Action '{}' is not implemented", self.args.action);
            tracing::info!(action = %self.args.action, "unimplemented action, no log written");
            return Ok(RunOutcome::Unsupported {
                action: self.args.action,
            });
        }
        self.run_training()
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(%phase, run_id = %self.snapshot.run_id, "entering phase");
        self.phases.push(phase);
    }

    fn run_training(mut self) -> Result<RunOutcome, HarnessError> {
        self.enter(Phase::Init);
        self.snapshot.write_into(&mut self.record)?;

        self.enter(Phase::CreateLog);
        let writer = LogWriter::create(
            &self.log_dir,
            &self.args.action,
            &format_file_stamp(self.snapshot.start_time),
            self.snapshot.short_run_id(),
        )?;
        println!("Log file created: {}", writer.path().display());

        self.enter(Phase::CollectVcs);
        self.collect_vcs()?;

        self.enter(Phase::Execute);
        let failure = match self.execute() {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "user action failed");
                self.record.insert("error", e.message())?;
                self.record.insert("error_stack", e.stack_trace())?;
                Some(e.message().to_string())
            }
        };

        if failure.is_none() {
            self.enter(Phase::CollectParameters);
            if let Some(parameters) = self.action.parameters() {
                self.record.insert("parameters", parameters)?;
            }

            self.enter(Phase::CollectInputFiles);
            if let Some(files) = self.action.input_files() {
                self.record.insert("input_files", fingerprint_map(&files))?;
            }

            self.enter(Phase::CollectOutputFiles);
            if let Some(files) = self.action.output_files() {
                self.record.insert("output_files", fingerprint_map(&files))?;
            }
        }

        self.enter(Phase::Finalize);
        let end_time = self.clock.now();
        self.record.insert("end_time", format_timestamp(end_time))?;
        self.record.insert(
            "total_seconds",
            elapsed_seconds(self.snapshot.start_time, end_time),
        )?;

        self.enter(Phase::Close);
        let log_path = writer.finish(&self.record)?;
        tracing::info!(path = %log_path.display(), failed = failure.is_some(), "run log written");

        Ok(RunOutcome::Completed {
            log_path,
            run_id: self.snapshot.run_id,
            phases: self.phases,
            error: failure,
        })
    }

    fn collect_vcs(&mut self) -> Result<(), HarnessError> {
        match self.vcs.identity() {
            Some(id) => {
                self.record.insert("git_commit", id.commit)?;
                match id.branch {
                    Some(branch) => self.record.insert("git_branch", branch)?,
                    None => tracing::debug!("detached HEAD, no branch recorded"),
                }
            }
            None => {
                tracing::debug!("no version control identity");
                self.record.insert("not_git_repo", true)?;
            }
        }
        Ok(())
    }

    /// The failure boundary: errors and panics from user code become data.
    fn execute(&mut self) -> Result<(), ActionError> {
        let action = &mut self.action;
        catch_panic(|| action.train())?
    }
}

/// The panic hook is process-wide; only one boundary may swap it at a time.
static HOOK_LOCK: Mutex<()> = Mutex::new(());

thread_local! {
    /// Location and backtrace of the last panic on this thread, taken by
    /// the hook before unwinding starts.
    static PANIC_SITE: RefCell<Option<(Option<String>, Backtrace)>> = const { RefCell::new(None) };
}

/// Runs `f`, turning a panic into an [`ActionError`] whose backtrace points
/// at the panicking frame. The previous hook still runs and is restored.
fn catch_panic<R>(f: impl FnOnce() -> R) -> Result<R, ActionError> {
    let _guard = HOOK_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    PANIC_SITE.with(|site| site.borrow_mut().take());

    let previous = Arc::new(panic::take_hook());
    let chained = Arc::clone(&previous);
    let owner = thread::current().id();
    panic::set_hook(Box::new(move |info| {
        if thread::current().id() == owner {
            let location = info.location().map(|l| l.to_string());
            let backtrace = Backtrace::force_capture();
            PANIC_SITE.with(|site| *site.borrow_mut() = Some((location, backtrace)));
        }
        (**chained)(info);
    }));

    let outcome = panic::catch_unwind(AssertUnwindSafe(f));

    // Dropping our hook releases `chained`, leaving `previous` unique.
    drop(panic::take_hook());
    match Arc::try_unwrap(previous) {
        Ok(hook) => panic::set_hook(hook),
        Err(_) => tracing::warn!("previous panic hook still shared, default hook left in place"),
    }

    outcome.map_err(|payload| {
        let (location, backtrace) = PANIC_SITE
            .with(|site| site.borrow_mut().take())
            .unwrap_or_else(|| (None, Backtrace::force_capture()));
        ActionError::from_panic(
            format!("panic: {}", panic_message(payload.as_ref())),
            location,
            backtrace,
        )
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Path → `"size,hash"`, or `""` when the file is missing. A file that
/// exists but cannot be read is also recorded as `""`.
fn fingerprint_map(files: &[String]) -> BTreeMap<String, String> {
    files
        .iter()
        .map(|path| {
            let value = match fingerprint(path) {
                Ok(fp) => fp.to_string(),
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "cannot fingerprint file");
                    String::new()
                }
            };
            (path.clone(), value)
        })
        .collect()
}
