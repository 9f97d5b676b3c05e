//! Smash builtins
//!
//! This module includes the commands the shell runs itself instead of
//! executing a program: directory and pid queries, the job control
//! commands, `quit` and `diff`.

use log::debug;

use self::prelude::*;

use self::diff::Diff;
use self::dirs::{Cd, Pwd, ShowPid};
use self::jobs::{Bg, Fg, Jobs};
use self::kill::Kill;
use self::quit::Quit;
use crate::errors::report_error;

pub mod prelude {
    pub use std::io::Write;

    pub use super::BuiltinCommand;
    pub use crate::core::command::Builtin;
    pub use crate::errors::{Error, ErrorKind, Result, ResultExt};
    pub use crate::shell::{CommandResult, Shell};
}

mod diff;
mod dirs;
mod jobs;
mod kill;
mod quit;

/// Represents a smash builtin command such as cd or fg.
pub trait BuiltinCommand {
    /// Which builtin this is; its name prefixes every error it reports.
    const BUILTIN: Builtin;

    /// Runs the command with the given arguments in the `shell` environment.
    fn run(shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> Result<CommandResult>;

    /// Error reported as `<name>: <message>`.
    fn failure<S: Into<String>>(message: S) -> ErrorKind {
        ErrorKind::BuiltinCommand(Self::BUILTIN.name().to_string(), message.into())
    }
}

/// Runs `builtin` and reports its error, if any, on stderr.
pub fn run(
    shell: &mut Shell,
    builtin: Builtin,
    args: &[String],
    stdout: &mut dyn Write,
) -> CommandResult {
    debug!("running builtin {} with {:?}", builtin, args);
    let result = match builtin {
        Builtin::ShowPid => ShowPid::run(shell, args, stdout),
        Builtin::Pwd => Pwd::run(shell, args, stdout),
        Builtin::Cd => Cd::run(shell, args, stdout),
        Builtin::Jobs => Jobs::run(shell, args, stdout),
        Builtin::Kill => Kill::run(shell, args, stdout),
        Builtin::Fg => Fg::run(shell, args, stdout),
        Builtin::Bg => Bg::run(shell, args, stdout),
        Builtin::Quit => Quit::run(shell, args, stdout),
        Builtin::Diff => Diff::run(shell, args, stdout),
    };

    let temp_result = stdout.flush();
    log_if_err!(temp_result, "failed to flush output of {}", builtin);

    match result {
        Ok(command_result) => command_result,
        Err(e) => {
            report_error(&e);
            CommandResult::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::ShellConfig;

    #[test]
    fn test_run_reports_failures() {
        let mut shell = Shell::new(ShellConfig::noninteractive());
        let mut out = Vec::new();
        let result = run(&mut shell, Builtin::Jobs, &["extra".to_string()], &mut out);
        assert_eq!(result, CommandResult::Failure);
        assert!(out.is_empty());
    }

    #[test]
    fn test_run_passes_through_quit() {
        let mut shell = Shell::new(ShellConfig::noninteractive());
        let mut out = Vec::new();
        assert_eq!(
            run(&mut shell, Builtin::Quit, &[], &mut out),
            CommandResult::Quit
        );
    }

    #[test]
    fn test_failure_is_prefixed_with_name() {
        let error: Error = Kill::failure("invalid arguments").into();
        assert_eq!(error.chained_message(), "kill: invalid arguments");
    }
}
