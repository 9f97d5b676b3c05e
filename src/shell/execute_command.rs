//! Runs parsed command chains: builtins in-process, everything else in a
//! forked child placed in its own process group.

use std::ffi::CString;
use std::io::{self, Write};
use std::process;

use log::{debug, info};
use nix::errno::Errno;
use nix::sys::wait::WaitStatus;
use nix::unistd::{self, ForkResult, Pid};

use crate::core::command::{Builtin, Command};
use crate::core::job::JobStatus;
use crate::errors::{report_error, Error, ErrorKind, Result, ResultExt};
use crate::shell::{builtins, job_control, CommandResult, Shell};
use crate::util;

/// Runs the commands of a `&&` chain in order, stopping after the first one
/// that does not succeed. Returns the outcome of the last command run.
///
/// Only unrecoverable errors such as a failed fork are returned; everything
/// else is reported on stderr and counted as `CommandResult::Failure`.
pub fn run_chain(shell: &mut Shell, command: &Command) -> Result<CommandResult> {
    let mut result = CommandResult::Success;
    for command in command.chain() {
        shell.reap_jobs();
        result = run_command(shell, command)?;
        if !result.is_success() {
            debug!("stopping chain after {} ({:?})", command, result);
            break;
        }
    }

    Ok(result)
}

fn run_command(shell: &mut Shell, command: &Command) -> Result<CommandResult> {
    match (command.builtin(), command.is_background()) {
        (Some(builtin), false) => Ok(builtins::run(
            shell,
            builtin,
            command.args(),
            &mut io::stdout(),
        )),
        (None, false) => run_in_foreground(shell, command),
        (_, true) => run_in_background(shell, command),
    }
}

fn run_in_foreground(shell: &mut Shell, command: &Command) -> Result<CommandResult> {
    let pid = spawn(shell, command)?;
    let status = match job_control::wait_in_foreground(pid, shell.is_job_control_enabled()) {
        Ok(status) => status,
        Err(e) => {
            report_error(&e);
            return Ok(CommandResult::Failure);
        }
    };
    debug!("{} ({}) finished with {:?}", command, pid, status);

    Ok(match status {
        WaitStatus::Exited(_, 0) => CommandResult::Success,
        WaitStatus::Stopped(..) => {
            match shell
                .job_manager_mut()
                .insert(pid, command.detach(), JobStatus::Stopped)
            {
                Ok(job_id) => info!("stopped {} as job [{}]", command, job_id),
                Err(e) => report_error(&e),
            }
            CommandResult::Failure
        }
        _ => CommandResult::Failure,
    })
}

fn run_in_background(shell: &mut Shell, command: &Command) -> Result<CommandResult> {
    let pid = spawn(shell, command)?;
    match shell
        .job_manager_mut()
        .insert(pid, command.detach(), JobStatus::Running)
    {
        Ok(job_id) => info!("started {} as job [{}]", command, job_id),
        Err(e) => report_error(&e),
    }

    Ok(CommandResult::Success)
}

/// Forks a child running `command` in a new process group led by itself.
fn spawn(shell: &mut Shell, command: &Command) -> Result<Pid> {
    // anything still buffered would otherwise be written by both processes
    let temp_result = io::stdout().flush();
    log_if_err!(temp_result, "failed to flush stdout before fork");

    match unsafe { unistd::fork() }.chain_err(|| ErrorKind::Fork)? {
        ForkResult::Child => {
            let pid = unistd::getpid();
            let temp_result = unistd::setpgid(pid, pid);
            log_if_err!(temp_result, "failed to set process group of {}", pid);

            if shell.is_job_control_enabled() {
                if !command.is_background() {
                    let temp_result = unistd::tcsetpgrp(util::get_terminal(), pid);
                    log_if_err!(temp_result, "failed to give terminal to {}", pid);
                }
                job_control::restore_default_signals();
            }

            let exit_code = match command.builtin() {
                Some(builtin) => run_builtin_in_child(shell, builtin, command),
                None => exec_external(command),
            };
            process::exit(exit_code)
        }
        ForkResult::Parent { child } => {
            // fails with EACCES once the child has exec'd
            let temp_result = unistd::setpgid(child, child);
            log_if_err!(temp_result, "failed to set process group of {}", child);
            debug!("forked {} for {}", child, command);
            Ok(child)
        }
    }
}

fn run_builtin_in_child(shell: &mut Shell, builtin: Builtin, command: &Command) -> i32 {
    match builtins::run(shell, builtin, command.args(), &mut io::stdout()) {
        CommandResult::Failure => 1,
        CommandResult::Success | CommandResult::Quit => 0,
    }
}

/// Replaces the child with `command`'s program, searched for in `PATH`.
/// Only returns, with the exit code of the child, if exec fails.
fn exec_external(command: &Command) -> i32 {
    let argv = match command
        .argv()
        .iter()
        .map(|arg| CString::new(arg.as_bytes()))
        .collect::<::std::result::Result<Vec<_>, _>>()
    {
        Ok(argv) => argv,
        Err(_) => {
            report_error(&ErrorKind::InvalidCommand(command.name().to_string()).into());
            return 1;
        }
    };

    let errno = match unistd::execvp(&argv[0], &argv) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };
    debug!("execvp({}) failed: {}", command.name(), errno);

    let error: Error = match errno {
        Errno::ENOENT => ErrorKind::CommandNotFound(command.name().to_string()).into(),
        _ => ErrorKind::InvalidCommand(command.name().to_string()).into(),
    };
    report_error(&error);
    1
}
