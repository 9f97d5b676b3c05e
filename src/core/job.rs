use std::fmt;
use std::time::{Duration, Instant};

use nix::unistd::Pid;

use crate::core::command::Command;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub usize);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Stopped,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

/// A child process tracked by the shell.
#[derive(Clone)]
pub struct Job {
    id: JobId,
    pid: Pid,
    command: Command,
    created_at: Instant,
    status: JobStatus,
}

impl Job {
    pub fn new(id: JobId, pid: Pid, command: Command, status: JobStatus) -> Self {
        Self {
            id,
            pid,
            command,
            created_at: Instant::now(),
            status,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_stopped(&self) -> bool {
        self.status == JobStatus::Stopped
    }

    pub fn mark_stopped(&mut self) {
        self.status = JobStatus::Stopped;
    }

    pub fn mark_running(&mut self) {
        self.status = JobStatus::Running;
    }

    /// Time spent in the jobs list, as of `now`.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// `[<id>] <command line>: <pid>`, as echoed by `fg` and `bg`.
    pub fn summary(&self) -> String {
        format!("[{}] {}: {}", self.id, self.command, self.pid)
    }

    /// `[<id>] <command line>: <pid> <secs> secs[ (stopped)]`, as listed by
    /// `jobs`.
    pub fn listing(&self, now: Instant) -> String {
        let mut line = format!("{} {} secs", self.summary(), self.elapsed(now).as_secs());
        if self.is_stopped() {
            line.push_str(" (stopped)");
        }
        line
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "id: {}\tpid: {}\tstatus: {}\tcommand: {}",
            self.id, self.pid, self.status, self.command
        )
    }
}
