use std::io::{self, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::process::CommandExt;
use std::process::{self, Child, Stdio};

use thiserror::Error;

use crate::ast::{Chain, Command, Condition};
use crate::builtins::{self, Builtin, BuiltinAction};
use crate::process::{Fork, close_fd, exit_child, fork, redirect_fd, wait_for_pid};
use crate::redirect::{self, StdioGuard};
use crate::resolver;
use crate::status;

/// Status recorded when the shell itself fails to set up a chain.
const GENERIC_FAILURE: i32 = 1;
/// Status of a stage whose program could not be found.
const NOT_FOUND: i32 = 127;
/// Status of a stage whose program was found but could not be executed.
const NOT_EXECUTABLE: i32 = 126;

/// State carried from one chain to the next.
#[derive(Debug, Default)]
pub struct Session {
    last_exit_status: i32,
    has_run_any_command: bool,
}

impl Session {
    pub fn last_exit_status(&self) -> i32 {
        self.last_exit_status
    }

    pub fn has_run_any_command(&self) -> bool {
        self.has_run_any_command
    }

    /// Decide whether a chain with `condition` may run.
    pub fn admit(&self, condition: Condition) -> Result<(), Skip> {
        match condition {
            Condition::Unconditional => Ok(()),
            _ if !self.has_run_any_command => Err(Skip::NothingRunYet),
            Condition::IfPrevSucceeded if self.last_exit_status != 0 => {
                Err(Skip::PreviousFailed(self.last_exit_status))
            }
            Condition::IfPrevFailed if self.last_exit_status == 0 => Err(Skip::PreviousSucceeded),
            _ => Ok(()),
        }
    }

    pub(crate) fn record(&mut self, status: i32) {
        self.last_exit_status = status;
        self.has_run_any_command = true;
    }
}

/// Why a chain was not run.
#[derive(Debug, Error, PartialEq)]
pub enum Skip {
    #[error("'and' or 'or' used before any command has run")]
    NothingRunYet,
    #[error("skipping command: 'and' after a failure (status {0})")]
    PreviousFailed(i32),
    #[error("skipping command: 'or' after a success")]
    PreviousSucceeded,
}

/// Failures of the shell process itself while assembling a pipeline.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("pipe: {0}")]
    Pipe(#[source] io::Error),
    #[error("fork: {0}")]
    Fork(#[source] io::Error),
    #[error("dup: {0}")]
    Dup(#[source] io::Error),
}

/// What the read loop should do after a chain.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Continue,
    Exit(i32),
}

/// Run one chain and record its status in `session`.
///
/// The chain is consumed; a skipped chain leaves `session` untouched.
pub fn execute(chain: Chain, session: &mut Session) -> Outcome {
    if let Err(skip) = session.admit(chain.condition()) {
        eprintln!("mysh: {skip}");
        return Outcome::Continue;
    }
    session.has_run_any_command = true;

    match chain.stages() {
        [stage] => match stage.builtin {
            Some(builtin) => run_builtin_in_shell(builtin, stage, session),
            None => {
                session.record(run_external(stage));
                Outcome::Continue
            }
        },
        [left, right] => {
            let status = run_pipeline(left, right).unwrap_or_else(|e| {
                eprintln!("mysh: {e}");
                GENERIC_FAILURE
            });
            session.record(status);
            Outcome::Continue
        }
        _ => {
            eprintln!("mysh: unsupported pipeline length {}", chain.stages().len());
            session.record(GENERIC_FAILURE);
            Outcome::Continue
        }
    }
}

/// Run a builtin in the shell's own process so it can change shell state.
fn run_builtin_in_shell(builtin: Builtin, stage: &Command, session: &mut Session) -> Outcome {
    let guard = match StdioGuard::install(stage.input.as_deref(), stage.output.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("mysh: {e}");
            session.record(GENERIC_FAILURE);
            return Outcome::Continue;
        }
    };

    let action = builtins::execute(builtin, &stage.args, &mut io::stdout(), &mut io::stderr());
    drop(guard);

    session.record(action.status());
    match action {
        BuiltinAction::Continue(_) => Outcome::Continue,
        BuiltinAction::Exit(code) => Outcome::Exit(code),
    }
}

/// Build the OS command for an external stage, or report why there is none.
fn prepare_external(stage: &Command) -> Result<process::Command, i32> {
    let path = resolver::resolve(&stage.program).map_err(|e| {
        eprintln!("mysh: {e}");
        NOT_FOUND
    })?;

    let mut command = process::Command::new(path);
    command.arg0(&stage.program).args(&stage.args[1..]);
    Ok(command)
}

fn spawn_failure_status(program: &str, err: &io::Error) -> i32 {
    if err.kind() == io::ErrorKind::NotFound {
        eprintln!("mysh: {program}: command not found");
        NOT_FOUND
    } else {
        eprintln!("mysh: {program}: {err}");
        NOT_EXECUTABLE
    }
}

/// Run a single external stage with its redirections and return its status.
///
/// Redirection targets are opened before the program is looked up, so a
/// missing program still truncates its `>` file.
fn run_external(stage: &Command) -> i32 {
    let input = match stage.input.as_deref().map(redirect::open_input).transpose() {
        Ok(file) => file,
        Err(e) => {
            eprintln!("mysh: {e}");
            return GENERIC_FAILURE;
        }
    };
    let output = match stage.output.as_deref().map(redirect::open_output).transpose() {
        Ok(file) => file,
        Err(e) => {
            eprintln!("mysh: {e}");
            return GENERIC_FAILURE;
        }
    };

    let mut command = match prepare_external(stage) {
        Ok(command) => command,
        Err(status) => return status,
    };
    if let Some(file) = input {
        command.stdin(Stdio::from(file));
    }
    if let Some(file) = output {
        command.stdout(Stdio::from(file));
    }

    let _ = io::stdout().flush();
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return spawn_failure_status(&stage.program, &e),
    };

    match child.wait() {
        Ok(status) => status::exit_code(status),
        Err(e) => {
            eprintln!("mysh: {}: {e}", stage.program);
            GENERIC_FAILURE
        }
    }
}

/// Which end of the pipe a stage is attached to.
enum PipeEnd<'a> {
    /// Stage writes into the pipe (left side).
    Write(&'a os_pipe::PipeWriter),
    /// Stage reads from the pipe (right side).
    Read(&'a os_pipe::PipeReader),
}

impl PipeEnd<'_> {
    fn raw_fd(&self) -> RawFd {
        match self {
            PipeEnd::Write(writer) => writer.as_raw_fd(),
            PipeEnd::Read(reader) => reader.as_raw_fd(),
        }
    }

    /// The standard descriptor this end replaces in the stage's process.
    fn target_fd(&self) -> RawFd {
        match self {
            PipeEnd::Write(_) => libc::STDOUT_FILENO,
            PipeEnd::Read(_) => libc::STDIN_FILENO,
        }
    }
}

/// A launched pipeline stage.
enum Stage {
    Spawned(Child),
    Forked(libc::pid_t),
    /// Never started; carries the status it would have failed with.
    Failed(i32),
}

impl Stage {
    fn wait(self) -> i32 {
        let result = match self {
            Stage::Spawned(mut child) => child.wait().map(status::exit_code),
            Stage::Forked(pid) => wait_for_pid(pid),
            Stage::Failed(status) => Ok(status),
        };
        result.unwrap_or_else(|e| {
            eprintln!("mysh: wait: {e}");
            GENERIC_FAILURE
        })
    }
}

/// Run `left | right`. The chain's status is `right`'s.
///
/// Stage redirections are ignored inside a pipeline.
fn run_pipeline(left: &Command, right: &Command) -> Result<i32, ExecError> {
    let (reader, writer) = os_pipe::pipe().map_err(ExecError::Pipe)?;
    let pipe_fds = [reader.as_raw_fd(), writer.as_raw_fd()];

    let first = launch_stage(left, PipeEnd::Write(&writer), pipe_fds)?;
    let second = match launch_stage(right, PipeEnd::Read(&reader), pipe_fds) {
        Ok(stage) => stage,
        Err(e) => {
            drop(reader);
            drop(writer);
            first.wait();
            return Err(e);
        }
    };

    drop(reader);
    drop(writer);

    first.wait();
    Ok(second.wait())
}

fn launch_stage(
    stage: &Command,
    end: PipeEnd<'_>,
    pipe_fds: [RawFd; 2],
) -> Result<Stage, ExecError> {
    match stage.builtin {
        Some(builtin) => fork_builtin(builtin, stage, &end, pipe_fds),
        None => spawn_external(stage, end),
    }
}

/// Run a builtin in a child process attached to the pipe.
fn fork_builtin(
    builtin: Builtin,
    stage: &Command,
    end: &PipeEnd<'_>,
    pipe_fds: [RawFd; 2],
) -> Result<Stage, ExecError> {
    let _ = io::stdout().flush();

    match fork().map_err(ExecError::Fork)? {
        Fork::Parent(pid) => Ok(Stage::Forked(pid)),
        Fork::Child => {
            if let Err(e) = redirect_fd(end.raw_fd(), end.target_fd()) {
                eprintln!("mysh: {}: {e}", builtin.name());
                exit_child(1);
            }
            for fd in pipe_fds {
                close_fd(fd);
            }

            let action =
                builtins::execute(builtin, &stage.args, &mut io::stdout(), &mut io::stderr());
            exit_child(action.status())
        }
    }
}

fn spawn_external(stage: &Command, end: PipeEnd<'_>) -> Result<Stage, ExecError> {
    let mut command = match prepare_external(stage) {
        Ok(command) => command,
        Err(status) => return Ok(Stage::Failed(status)),
    };

    match end {
        PipeEnd::Write(writer) => {
            command.stdout(writer.try_clone().map_err(ExecError::Dup)?);
        }
        PipeEnd::Read(reader) => {
            command.stdin(reader.try_clone().map_err(ExecError::Dup)?);
        }
    }

    let _ = io::stdout().flush();
    match command.spawn() {
        Ok(child) => Ok(Stage::Spawned(child)),
        Err(e) => Ok(Stage::Failed(spawn_failure_status(&stage.program, &e))),
    }
}
