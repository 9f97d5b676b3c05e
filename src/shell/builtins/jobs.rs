use std::time::Instant;

use log::{debug, warn};
use nix::sys::signal::{self, Signal};

use crate::core::job::{Job, JobId};
use crate::shell::builtins::prelude::*;
use crate::shell::job_control::{self, TerminalState};
use crate::util;

pub struct Jobs;

impl BuiltinCommand for Jobs {
    const BUILTIN: Builtin = Builtin::Jobs;

    fn run(shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> Result<CommandResult> {
        if !args.is_empty() {
            return Err(Self::failure("expected 0 arguments").into());
        }

        shell.reap_jobs();
        shell.job_manager().write_jobs(stdout, Instant::now())?;
        Ok(CommandResult::Success)
    }
}

pub struct Fg;

impl BuiltinCommand for Fg {
    const BUILTIN: Builtin = Builtin::Fg;

    fn run(shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> Result<CommandResult> {
        let job_id = match args {
            [] => shell
                .job_manager()
                .highest_id()
                .ok_or_else(|| Self::failure("jobs list is empty"))?,
            [job_id] => parse_job_id::<Self>(job_id)?,
            _ => return Err(Self::failure("invalid arguments").into()),
        };
        let job = find_job::<Self>(shell, job_id)?;
        let (pid, stopped) = (job.pid(), job.is_stopped());

        writeln!(stdout, "{}", job.summary())?;
        stdout.flush()?;

        let _terminal_state = if shell.is_job_control_enabled() {
            TerminalState::acquire(pid)
        } else {
            None
        };
        if stopped {
            continue_job::<Self>(shell, job_id)?;
        }

        let status = job_control::wait_for_process(pid)?;
        debug!("job [{}] left the foreground with {:?}", job_id, status);
        shell.job_manager_mut().update_job_status(status);
        Ok(CommandResult::Success)
    }
}

pub struct Bg;

impl BuiltinCommand for Bg {
    const BUILTIN: Builtin = Builtin::Bg;

    fn run(shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> Result<CommandResult> {
        let job_id = match args {
            [] => shell
                .job_manager()
                .highest_stopped_id()
                .ok_or_else(|| Self::failure("there are no stopped jobs to resume"))?,
            [job_id] => parse_job_id::<Self>(job_id)?,
            _ => return Err(Self::failure("invalid arguments").into()),
        };
        let job = find_job::<Self>(shell, job_id)?;
        if !job.is_stopped() {
            return Err(
                Self::failure(format!("job id {} is already in background", job_id)).into(),
            );
        }

        writeln!(stdout, "{}", job.summary())?;
        continue_job::<Self>(shell, job_id)?;
        Ok(CommandResult::Success)
    }
}

fn parse_job_id<B: BuiltinCommand>(arg: &str) -> Result<JobId> {
    util::parse_non_negative(arg)
        .map(JobId)
        .ok_or_else(|| B::failure("invalid arguments").into())
}

fn find_job<B: BuiltinCommand>(shell: &Shell, job_id: JobId) -> Result<&Job> {
    shell
        .job_manager()
        .get_by_id(job_id)
        .ok_or_else(|| Error::no_such_job(B::BUILTIN.name(), job_id.0))
}

/// Sends SIGCONT to a stopped job and marks it running.
fn continue_job<B: BuiltinCommand>(shell: &mut Shell, job_id: JobId) -> Result<()> {
    let job = shell
        .job_manager_mut()
        .get_by_id_mut(job_id)
        .ok_or_else(|| Error::no_such_job(B::BUILTIN.name(), job_id.0))?;
    if let Err(e) = signal::kill(job.pid(), Signal::SIGCONT) {
        warn!("failed to send SIGCONT to {}: {}", job.pid(), e);
        return Err(B::failure("kill failed").into());
    }
    job.mark_running();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::Command;
    use crate::core::job::JobStatus;
    use crate::shell::ShellConfig;
    use nix::unistd::Pid;

    // Larger than any pid the kernel hands out, so signals to it fail.
    const MISSING_PID: i32 = 0x7fff_fff0;

    fn shell() -> Shell {
        Shell::new(ShellConfig::noninteractive())
    }

    fn add_job(shell: &mut Shell, line: &str, status: JobStatus) -> JobId {
        let argv = line.split_whitespace().map(String::from).collect();
        let raw_pid = MISSING_PID - shell.job_manager().len() as i32;
        shell
            .job_manager_mut()
            .insert(Pid::from_raw(raw_pid), Command::new(argv, true), status)
            .unwrap()
    }

    fn run<B: BuiltinCommand>(
        shell: &mut Shell,
        args: &[&str],
    ) -> (Result<CommandResult>, String) {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let result = B::run(shell, &args, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    fn error_message(result: Result<CommandResult>) -> String {
        match result {
            Ok(r) => panic!("expected an error, got {:?}", r),
            Err(e) => e.chained_message(),
        }
    }

    #[test]
    fn test_jobs_empty() {
        let mut shell = shell();
        let (result, output) = run::<Jobs>(&mut shell, &[]);
        assert_eq!(result.unwrap(), CommandResult::Success);
        assert_eq!(output, "");
    }

    #[test]
    fn test_jobs_lists_in_id_order() {
        let mut shell = shell();
        add_job(&mut shell, "sleep 100", JobStatus::Running);
        add_job(&mut shell, "sleep 200", JobStatus::Stopped);

        let (result, output) = run::<Jobs>(&mut shell, &[]);
        assert_eq!(result.unwrap(), CommandResult::Success);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[0] sleep 100 &: "), "{}", lines[0]);
        assert!(lines[0].ends_with(" secs"), "{}", lines[0]);
        assert!(lines[1].starts_with("[1] sleep 200 &: "), "{}", lines[1]);
        assert!(lines[1].ends_with(" secs (stopped)"), "{}", lines[1]);
    }

    #[test]
    fn test_jobs_rejects_arguments() {
        let mut shell = shell();
        let (result, _) = run::<Jobs>(&mut shell, &["1"]);
        assert_eq!(error_message(result), "jobs: expected 0 arguments");
    }

    #[test]
    fn test_fg_with_empty_jobs_list() {
        let mut shell = shell();
        let (result, output) = run::<Fg>(&mut shell, &[]);
        assert_eq!(error_message(result), "fg: jobs list is empty");
        assert_eq!(output, "");
    }

    #[test]
    fn test_fg_invalid_arguments() {
        let mut shell = shell();
        add_job(&mut shell, "sleep 100", JobStatus::Running);
        let cases: [&[&str]; 3] = [&["-1"], &["x"], &["0", "1"]];
        for args in cases.iter() {
            let (result, output) = run::<Fg>(&mut shell, args);
            assert_eq!(error_message(result), "fg: invalid arguments");
            assert_eq!(output, "");
        }
    }

    #[test]
    fn test_fg_missing_job() {
        let mut shell = shell();
        add_job(&mut shell, "sleep 100", JobStatus::Running);
        let (result, _) = run::<Fg>(&mut shell, &["4"]);
        assert_eq!(error_message(result), "fg: job id 4 does not exist");
    }

    #[test]
    fn test_bg_without_stopped_jobs() {
        let mut shell = shell();
        add_job(&mut shell, "sleep 100", JobStatus::Running);
        let (result, output) = run::<Bg>(&mut shell, &[]);
        assert_eq!(
            error_message(result),
            "bg: there are no stopped jobs to resume"
        );
        assert_eq!(output, "");
    }

    #[test]
    fn test_bg_running_job() {
        let mut shell = shell();
        add_job(&mut shell, "sleep 100", JobStatus::Running);
        let (result, output) = run::<Bg>(&mut shell, &["0"]);
        assert_eq!(error_message(result), "bg: job id 0 is already in background");
        assert_eq!(output, "");
    }

    #[test]
    fn test_bg_missing_job_and_invalid_arguments() {
        let mut shell = shell();
        let (result, _) = run::<Bg>(&mut shell, &["3"]);
        assert_eq!(error_message(result), "bg: job id 3 does not exist");
        let (result, _) = run::<Bg>(&mut shell, &["1", "2"]);
        assert_eq!(error_message(result), "bg: invalid arguments");
    }

    #[test]
    fn test_bg_prints_job_before_continuing() {
        let mut shell = shell();
        add_job(&mut shell, "sleep 100", JobStatus::Running);
        let job_id = add_job(&mut shell, "sleep 200", JobStatus::Stopped);

        let (result, output) = run::<Bg>(&mut shell, &[]);
        // the job's process does not exist, so the signal cannot be delivered
        assert_eq!(error_message(result), "bg: kill failed");
        assert_eq!(output, format!("[1] sleep 200 &: {}\n", MISSING_PID - 1));
        assert!(shell.job_manager().get_by_id(job_id).unwrap().is_stopped());
    }
}
