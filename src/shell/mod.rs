use std::time::Duration;

pub use self::shell::Shell;

pub mod builtins;
pub mod execute_command;
pub mod job_control;
#[allow(clippy::module_inception)]
pub mod shell;

/// Maximum number of characters in one command line.
pub const MAX_LINE_LENGTH: usize = 120;
/// Maximum number of tokens in one command, the command name included.
pub const MAX_ARGS: usize = 20;
/// Maximum number of jobs tracked at the same time.
pub const MAX_JOBS: usize = 100;

const QUIT_KILL_GRACE_PERIOD: Duration = Duration::from_secs(5);
const QUIT_KILL_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of running one command of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandResult {
    Success,
    Failure,
    /// The shell should release its state and exit.
    Quit,
}

impl CommandResult {
    pub fn is_success(self) -> bool {
        self == CommandResult::Success
    }
}

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Determines if `smash > ` is printed before reading each line.
    pub display_prompt: bool,

    /// Determines if foreground jobs are given the terminal. Only honoured
    /// when stdin is a terminal.
    pub enable_job_control: bool,

    pub max_line_length: usize,
    pub max_args: usize,
    pub max_jobs: usize,

    /// How long `quit kill` waits for a job to exit after SIGTERM before
    /// sending SIGKILL.
    pub quit_kill_grace_period: Duration,
    pub quit_kill_poll_interval: Duration,
}

impl ShellConfig {
    /// Creates an interactive shell
    ///
    /// # Complete List
    /// - The prompt is displayed
    /// - Job Control is enabled
    pub fn interactive() -> Self {
        Self {
            display_prompt: true,
            enable_job_control: true,
            ..Default::default()
        }
    }

    /// Creates a noninteractive shell, e.g. for `-c` and scripts
    ///
    /// # Complete List
    /// - The prompt is not displayed
    /// - Job Control is disabled; jobs can still be started in the background
    ///   and managed with the job builtins.
    pub fn noninteractive() -> Self {
        Default::default()
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            display_prompt: false,
            enable_job_control: false,
            max_line_length: MAX_LINE_LENGTH,
            max_args: MAX_ARGS,
            max_jobs: MAX_JOBS,
            quit_kill_grace_period: QUIT_KILL_GRACE_PERIOD,
            quit_kill_poll_interval: QUIT_KILL_POLL_INTERVAL,
        }
    }
}
