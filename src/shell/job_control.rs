//! The jobs list and the process-level plumbing around it: reaping children,
//! waiting for a job in the foreground and handing the terminal over to it.

use std::fmt;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::termios::{self, Termios};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, Pid};

use crate::core::command::Command;
use crate::core::job::{Job, JobId, JobStatus};
use crate::errors::{ErrorKind, Result, ResultExt};
use crate::util;

const JOB_CONTROL_SIGNALS: [Signal; 5] = [
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGTSTP,
    Signal::SIGTTIN,
    Signal::SIGTTOU,
];

/// Makes the shell the foreground process group of its terminal and ignores
/// the interactive signals so they only reach jobs.
pub fn initialize_job_control() -> Result<()> {
    let shell_terminal = util::get_terminal();

    // Loop until the shell is in the foreground
    loop {
        let shell_pgid = unistd::getpgrp();
        if unistd::tcgetpgrp(shell_terminal)? == shell_pgid {
            break;
        }
        signal::kill(Pid::from_raw(-shell_pgid.as_raw()), Signal::SIGTTIN)?;
    }

    for &sig in &JOB_CONTROL_SIGNALS {
        unsafe { signal::signal(sig, SigHandler::SigIgn) }?;
    }

    // Put ourselves in our own process group
    let shell_pid = unistd::getpid();
    if unistd::getpgrp() != shell_pid {
        unistd::setpgid(shell_pid, shell_pid)?;
    }

    let temp_result = unistd::tcsetpgrp(shell_terminal, shell_pid);
    log_if_err!(temp_result, "failed to grab control of terminal");

    Ok(())
}

/// Undoes `initialize_job_control` in a freshly forked child.
pub fn restore_default_signals() {
    for &sig in JOB_CONTROL_SIGNALS.iter().chain(&[Signal::SIGCHLD]) {
        let temp_result = unsafe { signal::signal(sig, SigHandler::SigDfl) };
        log_if_err!(temp_result, "failed to reset {} handler", sig);
    }
}

/// Blocks until `pid` terminates or stops.
///
/// With `take_terminal`, the process group `pid` leads owns the terminal for
/// the duration of the wait.
pub fn wait_in_foreground(pid: Pid, take_terminal: bool) -> Result<WaitStatus> {
    let _terminal_state = if take_terminal {
        TerminalState::acquire(pid)
    } else {
        None
    };
    wait_for_process(pid)
}

/// Blocks until `pid` terminates or stops.
pub fn wait_for_process(pid: Pid) -> Result<WaitStatus> {
    loop {
        match wait::waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
            Ok(status @ WaitStatus::Exited(..))
            | Ok(status @ WaitStatus::Signaled(..))
            | Ok(status @ WaitStatus::Stopped(..)) => return Ok(status),
            Ok(status) => debug!("ignoring wait status {:?} of {}", status, pid),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e).chain_err(|| ErrorKind::Wait),
        }
    }
}

/// Fixed-capacity table of jobs indexed by job id.
///
/// Ids are small integers starting at 0; a new job always gets the lowest id
/// not held by a live job.
pub struct JobManager {
    slots: Vec<Option<Job>>,
    count: usize,
    /// Lowest free slot, equal to the capacity when the table is full
    next_id_hint: usize,
}

impl JobManager {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            count: 0,
            next_id_hint: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Starts tracking `pid`, returning the id assigned to it.
    ///
    /// When the table is full the process is not tracked and
    /// `ErrorKind::JobsListFull` is returned.
    pub fn insert(&mut self, pid: Pid, command: Command, status: JobStatus) -> Result<JobId> {
        let capacity = self.capacity();
        if self.count >= capacity {
            warn!("jobs list is full, not tracking {} ({})", pid, command);
            return Err(ErrorKind::JobsListFull(capacity).into());
        }
        debug_assert!(self.get_by_pid(pid).is_none(), "{} is already tracked", pid);

        let job_id = self.next_id_hint;
        debug_assert!(self.slots[job_id].is_none());
        self.slots[job_id] = Some(Job::new(JobId(job_id), pid, command, status));
        self.count += 1;

        let slots = &self.slots;
        self.next_id_hint = (job_id + 1..capacity)
            .find(|&i| slots[i].is_none())
            .unwrap_or(capacity);

        debug!("added job [{}] for {}", job_id, pid);
        Ok(JobId(job_id))
    }

    pub fn get_by_id(&self, job_id: JobId) -> Option<&Job> {
        self.slots.get(job_id.0).and_then(Option::as_ref)
    }

    pub fn get_by_id_mut(&mut self, job_id: JobId) -> Option<&mut Job> {
        self.slots.get_mut(job_id.0).and_then(Option::as_mut)
    }

    pub fn get_by_pid(&self, pid: Pid) -> Option<&Job> {
        self.jobs().find(|job| job.pid() == pid)
    }

    pub fn get_by_pid_mut(&mut self, pid: Pid) -> Option<&mut Job> {
        self.slots
            .iter_mut()
            .filter_map(Option::as_mut)
            .find(|job| job.pid() == pid)
    }

    pub fn remove_by_id(&mut self, job_id: JobId) -> Option<Job> {
        let job = self.slots.get_mut(job_id.0)?.take()?;
        self.count -= 1;
        if job_id.0 < self.next_id_hint {
            self.next_id_hint = job_id.0;
        }
        debug!("removed job [{}]", job_id);
        Some(job)
    }

    pub fn remove_by_pid(&mut self, pid: Pid) -> Option<Job> {
        let job_id = self.get_by_pid(pid)?.id();
        self.remove_by_id(job_id)
    }

    /// Live jobs in ascending id order.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn highest_id(&self) -> Option<JobId> {
        self.jobs().last().map(Job::id)
    }

    pub fn highest_stopped_id(&self) -> Option<JobId> {
        self.jobs().filter(|job| job.is_stopped()).last().map(Job::id)
    }

    /// Writes one `jobs` line per job, in ascending id order.
    pub fn write_jobs(&self, out: &mut dyn Write, now: Instant) -> Result<()> {
        for job in self.jobs() {
            writeln!(out, "{}", job.listing(now))?;
        }
        Ok(())
    }

    /// Collects every pending status change of the shell's children without
    /// blocking. Terminated jobs are removed, stopped and continued ones are
    /// marked accordingly.
    pub fn reap(&mut self) -> Result<()> {
        let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
        loop {
            match wait::waitpid(None, Some(flags)) {
                Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
                Ok(status) => self.update_job_status(status),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e).chain_err(|| ErrorKind::Wait),
            }
        }

        Ok(())
    }

    /// Applies one status reported by `waitpid`. Statuses of processes that
    /// are not in the table are ignored.
    pub fn update_job_status(&mut self, wait_status: WaitStatus) {
        match wait_status {
            WaitStatus::Exited(pid, status_code) => {
                if let Some(job) = self.remove_by_pid(pid) {
                    info!("job [{}] ({}) exited with {}", job.id(), pid, status_code);
                }
            }
            WaitStatus::Signaled(pid, signal, _) => {
                if let Some(job) = self.remove_by_pid(pid) {
                    info!("job [{}] ({}) terminated by {}", job.id(), pid, signal);
                }
            }
            WaitStatus::Stopped(pid, signal) => {
                if let Some(job) = self.get_by_pid_mut(pid) {
                    debug!("job [{}] ({}) stopped by {}", job.id(), pid, signal);
                    job.mark_stopped();
                }
            }
            WaitStatus::Continued(pid) => {
                if let Some(job) = self.get_by_pid_mut(pid) {
                    debug!("job [{}] ({}) continued", job.id(), pid);
                    job.mark_running();
                }
            }
            status => debug!("ignoring wait status {:?}", status),
        }
    }

    /// Terminates every job in id order: SIGTERM first, then SIGKILL for the
    /// ones still alive after `grace_period`. Progress is written to `out`.
    pub fn kill_all(
        &mut self,
        out: &mut dyn Write,
        grace_period: Duration,
        poll_interval: Duration,
    ) -> Result<()> {
        let job_ids: Vec<JobId> = self.jobs().map(Job::id).collect();
        for job_id in job_ids {
            let job = match self.remove_by_id(job_id) {
                Some(job) => job,
                None => continue,
            };
            let pid = job.pid();

            write!(
                out,
                "[{}] {} - sending SIGTERM... ",
                job.id(),
                job.command().name()
            )?;
            out.flush()?;

            let temp_result = signal::kill(pid, Signal::SIGTERM);
            log_if_err!(temp_result, "failed to send SIGTERM to {}", pid);
            if job.is_stopped() {
                // a stopped process only acts on SIGTERM once continued
                let temp_result = signal::kill(pid, Signal::SIGCONT);
                log_if_err!(temp_result, "failed to send SIGCONT to {}", pid);
            }

            if wait_for_exit(pid, grace_period, poll_interval) {
                writeln!(out, "done")?;
            } else {
                writeln!(out, "sending SIGKILL... done")?;
                let temp_result = signal::kill(pid, Signal::SIGKILL);
                log_if_err!(temp_result, "failed to send SIGKILL to {}", pid);
                let temp_result = wait::waitpid(pid, None);
                log_if_err!(temp_result, "failed to reap {}", pid);
            }
            out.flush()?;
        }

        Ok(())
    }
}

/// Polls `pid` every `poll_interval` until it terminates or `grace_period`
/// has passed. Returns `true` if it terminated.
fn wait_for_exit(pid: Pid, grace_period: Duration, poll_interval: Duration) -> bool {
    let start = Instant::now();
    loop {
        match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) => return true,
            // someone else already reaped it
            Err(Errno::ECHILD) => return true,
            Ok(_) => {}
            Err(e) => warn!("waitpid({}) failed: {}", pid, e),
        }

        if start.elapsed() >= grace_period {
            return false;
        }
        thread::sleep(poll_interval);
    }
}

impl fmt::Debug for JobManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{} jobs\tcapacity: {}\tnext id: {}",
            self.count,
            self.capacity(),
            self.next_id_hint
        )?;
        for job in self.jobs() {
            writeln!(f, "{:?}", job)?;
        }

        Ok(())
    }
}

/// RAII struct to encapsulate handing the terminal to a job.
#[derive(Debug)]
pub struct TerminalState {
    shell_pgid: Pid,
    shell_tmodes: Option<Termios>,
}

impl TerminalState {
    /// Gives the terminal to the process group `job_pgid`. The shell gets it
    /// back, along with its terminal modes, when the guard is dropped.
    pub fn acquire(job_pgid: Pid) -> Option<TerminalState> {
        debug!("setting terminal process group to {}", job_pgid);
        let shell_terminal = util::get_terminal();
        let shell_tmodes = termios::tcgetattr(shell_terminal).ok();
        match unistd::tcsetpgrp(shell_terminal, job_pgid) {
            Ok(()) => Some(TerminalState {
                shell_pgid: unistd::getpgrp(),
                shell_tmodes,
            }),
            Err(e) => {
                // the job may already be gone
                warn!("failed to give terminal to {}: {}", job_pgid, e);
                None
            }
        }
    }
}

impl Drop for TerminalState {
    fn drop(&mut self) {
        debug!("putting shell back into foreground and restoring shell's terminal modes");
        let shell_terminal = util::get_terminal();
        let temp_result = unistd::tcsetpgrp(shell_terminal, self.shell_pgid);
        log_if_err!(temp_result, "failed to take back control of terminal");
        if let Some(ref shell_tmodes) = self.shell_tmodes {
            let temp_result =
                termios::tcsetattr(shell_terminal, termios::SetArg::TCSADRAIN, shell_tmodes);
            log_if_err!(
                temp_result,
                "error restoring terminal configuration for shell"
            );
        }
    }
}
