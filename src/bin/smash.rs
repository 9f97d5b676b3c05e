use std::path::PathBuf;
use std::process;

use docopt::Docopt;
use log::{debug, error, info};
use nix::unistd::Pid;
use serde_derive::Deserialize;
use smash::errors::{report_error, Result};
use smash::{Shell, ShellConfig};

const LOG_FILE_NAME: &str = ".smash_log";

const USAGE: &str = "
smash.

Usage:
    smash [options]
    smash [options] -c <command>
    smash [options] <file>
    smash (-h | --help)
    smash --version

Options:
    -h --help       Show this screen.
    --version       Show version.
    -c              If the -c option is present, then commands are read from the first non-option
                        argument command_string.
    --log=<path>    File to write log to, defaults to ~/.smash_log
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_command: Option<String>,
    arg_file: Option<String>,
    flag_version: bool,
    flag_c: bool,
    flag_log: Option<String>,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    init_logger(&args.flag_log);
    debug!("{:?}", args);

    let result = if args.flag_version {
        println!("smash version {}", env!("CARGO_PKG_VERSION"));
        Ok(())
    } else if args.flag_c || args.arg_file.is_some() {
        execute_from_command_string_or_file(&args)
    } else {
        execute_from_stdin()
    };

    if let Err(e) = result {
        error!("smash exiting after fatal error: {}", e);
        report_error(&e);
        process::exit(1);
    }
    info!("smash has shut down");
}

/// Logging is best effort: the shell runs without it when the log file
/// cannot be opened.
fn init_logger(path: &Option<String>) {
    let log_path = match path.clone().map(PathBuf::from).or_else(default_log_path) {
        Some(log_path) => log_path,
        None => return,
    };

    let log_file = match fern::log_file(&log_path) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!("smash: cannot open log file {}: {}", log_path.display(), e);
            return;
        }
    };

    let result = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                Pid::this(),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Trace)
        .chain(log_file)
        .apply();
    if let Err(e) = result {
        eprintln!("smash: cannot set up logging: {}", e);
    }
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOG_FILE_NAME))
}

fn execute_from_command_string_or_file(args: &Args) -> Result<()> {
    let mut shell = Shell::new(ShellConfig::noninteractive());

    if let Some(ref command) = args.arg_command {
        shell.execute_command_string(command)?;
    } else if let Some(ref file_path) = args.arg_file {
        shell.execute_commands_from_file(file_path)?;
    }

    Ok(())
}

fn execute_from_stdin() -> Result<()> {
    let mut shell = Shell::new(ShellConfig::interactive());
    shell.execute_from_stdin()
}
