//! User actions bundled with the `runlog` binary.
//!
//! - default: runs a shell command (`-c`) or a script file (`-f`), `-c` first
//! - `classifier`, `qa`: demonstration actions that only announce themselves

use std::path::PathBuf;
use std::process::Command;

use runlog_core::{ActionError, ActionRegistry, ParsedArguments, UserAction};
use serde_json::Value;

pub fn registry(base_name: &str) -> ActionRegistry {
    let mut registry = ActionRegistry::new(base_name);
    registry
        .register_default(|args| Box::new(ShellAction::from_args(args)))
        .register("classifier", |_| {
            Box::new(DemoAction::new("awesome_classifier"))
        })
        .register("qa", |_| {
            Box::new(DemoAction::new("question_answering_model"))
        });
    registry
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Invocation {
    Command(String),
    Script(PathBuf),
}

/// Runs what `-c` or `-f` names and waits for it, however long it takes.
///
/// Options it reads: `c`, `f`, `app` (application name), `inputs` and
/// `outputs` (comma-separated file lists to fingerprint). All options are
/// recorded as the run's parameters.
#[derive(Debug)]
pub struct ShellAction {
    invocation: Option<Invocation>,
    app_name: String,
    inputs: Option<Vec<String>>,
    outputs: Option<Vec<String>>,
    parameters: Option<Value>,
}

impl ShellAction {
    pub fn from_args(args: &ParsedArguments) -> Self {
        let invocation = match (args.option("c"), args.option("f")) {
            (Some(cmd), _) => Some(Invocation::Command(cmd.to_string())),
            (None, Some(file)) => Some(Invocation::Script(PathBuf::from(file))),
            (None, None) => None,
        };

        let mut inputs = args.option("inputs").map(split_list);
        if let Some(Invocation::Script(path)) = &invocation {
            inputs
                .get_or_insert_with(Vec::new)
                .insert(0, path.display().to_string());
        }

        let parameters = if args.options.is_empty() {
            None
        } else {
            serde_json::to_value(&args.options).ok()
        };

        ShellAction {
            invocation,
            app_name: args.option("app").unwrap_or_default().to_string(),
            inputs,
            outputs: args.option("outputs").map(split_list),
            parameters,
        }
    }

    fn command(&self) -> Option<Command> {
        let invocation = self.invocation.as_ref()?;
        let mut command = shell();
        match invocation {
            Invocation::Command(cmd) => {
                command.arg(shell_flag()).arg(cmd);
            }
            Invocation::Script(path) => {
                #[cfg(windows)]
                command.arg(shell_flag());
                command.arg(path);
            }
        }
        Some(command)
    }
}

impl UserAction for ShellAction {
    fn train(&mut self) -> Result<(), ActionError> {
        let Some(mut command) = self.command() else {
            println!("Nothing to run: pass -c <command> or -f <script>");
            return Ok(());
        };
        tracing::info!(?command, "running training command");
        let status = command
            .status()
            .map_err(|e| ActionError::context(format!("cannot start {:?}", command), e))?;
        if status.success() {
            Ok(())
        } else {
            Err(ActionError::msg(format!("training command failed: {}", status)))
        }
    }

    fn app_name(&self) -> String {
        self.app_name.clone()
    }

    fn input_files(&self) -> Option<Vec<String>> {
        self.inputs.clone()
    }

    fn output_files(&self) -> Option<Vec<String>> {
        self.outputs.clone()
    }

    fn parameters(&self) -> Option<Value> {
        self.parameters.clone()
    }
}

#[cfg(unix)]
fn shell() -> Command {
    Command::new("sh")
}

#[cfg(unix)]
fn shell_flag() -> &'static str {
    "-c"
}

#[cfg(windows)]
fn shell() -> Command {
    Command::new("cmd")
}

#[cfg(windows)]
fn shell_flag() -> &'static str {
    "/C"
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Placeholder application that names itself but has no training yet.
#[derive(Debug)]
pub struct DemoAction {
    app_name: &'static str,
}

impl DemoAction {
    fn new(app_name: &'static str) -> Self {
        println!("{}: initializing..", app_name);
        DemoAction { app_name }
    }
}

impl UserAction for DemoAction {
    fn train(&mut self) -> Result<(), ActionError> {
        println!("{}: `train` not implemented..", self.app_name);
        Ok(())
    }

    fn app_name(&self) -> String {
        self.app_name.to_string()
    }
}
