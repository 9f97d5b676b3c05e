use log::warn;
use nix::errno::Errno;
use nix::libc;

use crate::core::job::{Job, JobId};
use crate::shell::builtins::prelude::*;
use crate::util;

pub struct Kill;

impl BuiltinCommand for Kill {
    const BUILTIN: Builtin = Builtin::Kill;

    fn run(shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> Result<CommandResult> {
        let (signum, job_id) = match args {
            [signum, job_id] => (
                util::parse_non_negative::<i32>(signum),
                util::parse_non_negative::<usize>(job_id),
            ),
            _ => return Err(Self::failure("invalid arguments").into()),
        };
        let (signum, job_id) = match (signum, job_id) {
            (Some(signum), Some(job_id)) => (signum, JobId(job_id)),
            _ => return Err(Self::failure("invalid arguments").into()),
        };

        let pid = shell
            .job_manager()
            .get_by_id(job_id)
            .map(Job::pid)
            .ok_or_else(|| Error::no_such_job(Self::BUILTIN.name(), job_id.0))?;

        // the raw number: real-time signals have no `Signal` variant and 0 only
        // checks that the job can be signaled
        let temp_result = Errno::result(unsafe { libc::kill(pid.as_raw(), signum) });
        if let Err(e) = temp_result {
            warn!("kill({}, {}) failed: {}", pid, signum, e);
            return Err(Self::failure("job cannot be signaled").into());
        }

        writeln!(stdout, "signal number {} was sent to pid {}", signum, pid)?;
        Ok(CommandResult::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::Command;
    use crate::core::job::JobStatus;
    use crate::shell::ShellConfig;
    use nix::unistd::Pid;

    const MISSING_PID: i32 = 0x7fff_fff0;

    fn shell_with_job() -> Shell {
        let mut shell = Shell::new(ShellConfig::noninteractive());
        let argv = vec!["sleep".to_string(), "100".to_string()];
        shell
            .job_manager_mut()
            .insert(
                Pid::from_raw(MISSING_PID),
                Command::new(argv, true),
                JobStatus::Running,
            )
            .unwrap();
        shell
    }

    fn kill(shell: &mut Shell, args: &[&str]) -> (String, String) {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let message = match Kill::run(shell, &args, &mut out) {
            Ok(r) => panic!("expected an error, got {:?}", r),
            Err(e) => e.chained_message(),
        };
        (message, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_invalid_arguments() {
        let mut shell = shell_with_job();
        let cases: [&[&str]; 5] = [&[], &["9"], &["9", "0", "1"], &["-9", "0"], &["9", "x"]];
        for args in cases.iter() {
            let (message, output) = kill(&mut shell, args);
            assert_eq!(message, "kill: invalid arguments", "{:?}", args);
            assert_eq!(output, "");
        }
    }

    #[test]
    fn test_missing_job() {
        let mut shell = shell_with_job();
        let (message, _) = kill(&mut shell, &["9", "3"]);
        assert_eq!(message, "kill: job id 3 does not exist");
    }

    #[test]
    fn test_unknown_signal() {
        let mut shell = shell_with_job();
        let (message, output) = kill(&mut shell, &["999", "0"]);
        assert_eq!(message, "kill: job cannot be signaled");
        assert_eq!(output, "");
    }

    #[test]
    fn test_signal_zero_checks_the_job() {
        let mut shell = Shell::new(ShellConfig::noninteractive());
        let argv = vec!["smash".to_string()];
        shell
            .job_manager_mut()
            .insert(Pid::this(), Command::new(argv, true), JobStatus::Running)
            .unwrap();

        let args = vec!["0".to_string(), "0".to_string()];
        let mut out = Vec::new();
        let result = Kill::run(&mut shell, &args, &mut out).unwrap();
        assert_eq!(result, CommandResult::Success);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("signal number 0 was sent to pid {}\n", Pid::this())
        );
    }

    #[test]
    fn test_vanished_process() {
        let mut shell = shell_with_job();
        let (message, output) = kill(&mut shell, &["15", "0"]);
        assert_eq!(message, "kill: job cannot be signaled");
        assert_eq!(output, "");
        // the job is only forgotten once it is reaped
        assert_eq!(shell.job_manager().len(), 1);
    }
}
