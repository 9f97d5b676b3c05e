//! Error module. See the [error-chain](https://crates.io/crates/error-chain) crate for details.

use error_chain::error_chain;

error_chain! {
    foreign_links {
        Docopt(::docopt::Error);
        Io(::std::io::Error);
        Nix(::nix::Error);
    }

    errors {
        /// Generic syntax error containing the offending token
        Syntax(token: String) {
            description("syntax error")
            display("syntax error near '{}'", token)
        }
        /// A single command carries more tokens than the shell accepts
        TooManyArguments(max: usize) {
            description("too many arguments")
            display("too many arguments (at most {} per command)", max)
        }
        LineTooLong(max: usize) {
            description("command line too long")
            display("command line too long (at most {} characters)", max)
        }
        /// A builtin rejected its arguments or failed to do its work
        BuiltinCommand(command: String, message: String) {
            description("builtin command failed")
            display("{}: {}", command, message)
        }
        NoSuchJob(command: String, job_id: usize) {
            description("no such job")
            display("{}: job id {} does not exist", command, job_id)
        }
        CommandNotFound(program: String) {
            description("command not found")
            display("external: cannot find program")
        }
        /// The program exists but could not be executed
        InvalidCommand(program: String) {
            description("invalid command")
            display("external: invalid command")
        }
        JobsListFull(capacity: usize) {
            description("jobs list is full")
            display("jobs: jobs list is full ({} jobs)", capacity)
        }
        Fork {
            description("fork failed")
            display("fork failed")
        }
        Wait {
            description("waitpid failed")
            display("waitpid")
        }
    }
}

impl Error {
    pub(crate) fn builtin_command<S1, S2>(command: S1, message: S2) -> Error
    where
        S1: AsRef<str>,
        S2: AsRef<str>,
    {
        ErrorKind::BuiltinCommand(command.as_ref().to_string(), message.as_ref().to_string())
            .into()
    }

    pub(crate) fn no_such_job<S: AsRef<str>>(command: S, job_id: usize) -> Error {
        ErrorKind::NoSuchJob(command.as_ref().to_string(), job_id).into()
    }

    /// Renders the error followed by its causes, separated by `": "`.
    pub fn chained_message(&self) -> String {
        self.iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(": ")
    }
}

/// Prints `smash error: <context>: <message>` to stderr.
pub fn report_error(error: &Error) {
    eprintln!("smash error: {}", error.chained_message());
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn test_builtin_command_display() {
        let error = Error::builtin_command("kill", "invalid arguments");
        assert_eq!(error.chained_message(), "kill: invalid arguments");
    }

    #[test]
    fn test_no_such_job_display() {
        let error = Error::no_such_job("fg", 3);
        assert_eq!(error.chained_message(), "fg: job id 3 does not exist");
    }

    #[test]
    fn test_chained_cause_is_appended() {
        let result: Result<()> = Err::<(), _>(Errno::ECHILD).chain_err(|| ErrorKind::Wait);
        let message = result.unwrap_err().chained_message();
        assert!(message.starts_with("waitpid: "), "{}", message);
        assert!(message.contains("ECHILD"), "{}", message);
    }
}
