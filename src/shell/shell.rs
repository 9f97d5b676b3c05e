//! Smash - Shell Module
//!
//! The Shell owns the jobs list and the previous working directory, reads
//! command lines and hands each parsed chain to the dispatcher.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use nix::unistd::{self, Pid};

use crate::core::parser;
use crate::errors::{report_error, Error, ErrorKind, Result, ResultExt};
use crate::shell::{
    execute_command,
    job_control::{self, JobManager},
    CommandResult, ShellConfig,
};
use crate::util;

const PROMPT: &str = "smash > ";

/// Smash Shell
pub struct Shell {
    /// Process id reported by `showpid`.
    pid: Pid,
    /// Working directory before the last successful `cd`.
    previous_dir: Option<PathBuf>,
    job_manager: JobManager,
    config: ShellConfig,
    /// Is `false` when job control is disabled by the config, stdin is not a
    /// terminal, or initializing job control fails.
    job_control: bool,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Shell {
        let mut shell = Shell {
            pid: unistd::getpid(),
            previous_dir: None,
            job_manager: JobManager::with_capacity(config.max_jobs),
            config,
            job_control: false,
        };

        if config.enable_job_control && util::isatty() {
            match job_control::initialize_job_control() {
                Ok(()) => shell.job_control = true,
                Err(e) => error!(
                    "failed to initialize shell for job control despite isatty: {}",
                    e
                ),
            }
        }

        info!("smash started up");
        shell
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub(crate) fn is_job_control_enabled(&self) -> bool {
        self.job_control
    }

    pub fn previous_dir(&self) -> Option<&Path> {
        self.previous_dir.as_ref().map(PathBuf::as_path)
    }

    pub(crate) fn set_previous_dir(&mut self, dir: PathBuf) {
        self.previous_dir = Some(dir);
    }

    pub fn job_manager(&self) -> &JobManager {
        &self.job_manager
    }

    pub fn job_manager_mut(&mut self) -> &mut JobManager {
        &mut self.job_manager
    }

    /// Collects finished and stopped children, reporting any failure.
    pub fn reap_jobs(&mut self) {
        if let Err(e) = self.job_manager.reap() {
            report_error(&e);
        }
    }

    /// Runs one command line.
    ///
    /// Malformed lines are reported on stderr and yield
    /// `CommandResult::Failure`; only errors the shell cannot recover from,
    /// such as a failed fork, are returned.
    pub fn execute_command_string(&mut self, input: &str) -> Result<CommandResult> {
        let line = input.trim_end_matches(|c| c == '\n' || c == '\r');
        if line.chars().count() > self.config.max_line_length {
            report_error(&ErrorKind::LineTooLong(self.config.max_line_length).into());
            return Ok(CommandResult::Failure);
        }

        let command = match parser::parse(line, self.config.max_args) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(CommandResult::Success),
            Err(e) => {
                report_error(&e);
                return Ok(CommandResult::Failure);
            }
        };

        debug!("executing {}", command);
        execute_command::run_chain(self, &command)
    }

    /// Runs every line of a smash script, stopping early on `quit`.
    pub fn execute_commands_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path)
            .chain_err(|| format!("cannot open script {}", path.display()))?;
        self.execute_lines(BufReader::new(file), false)
    }

    /// Runs jobs from stdin until EOF or `quit`.
    pub fn execute_from_stdin(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let display_prompt = self.config.display_prompt;
        self.execute_lines(stdin.lock(), display_prompt)
    }

    fn execute_lines<R: BufRead>(&mut self, mut input: R, display_prompt: bool) -> Result<()> {
        loop {
            if display_prompt {
                print!("{}", PROMPT);
                let temp_result = io::stdout().flush();
                log_if_err!(temp_result, "failed to flush prompt");
            }

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => {
                    info!("end of input, shutting down");
                    if display_prompt {
                        println!();
                    }
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    report_error(&Error::with_chain(e, "cannot read command line"));
                    continue;
                }
            }

            if self.execute_command_string(&line)? == CommandResult::Quit {
                break;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Shell {{ pid: {}, previous_dir: {:?}, job_control: {}, config: {:?} }}\n{:?}",
            self.pid, self.previous_dir, self.job_control, self.config, self.job_manager
        )
    }
}
