use std::env;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use nix::errno::Errno;

use crate::shell::builtins::prelude::*;

pub struct ShowPid;

impl BuiltinCommand for ShowPid {
    const BUILTIN: Builtin = Builtin::ShowPid;

    fn run(shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> Result<CommandResult> {
        if !args.is_empty() {
            return Err(Self::failure("expected 0 arguments").into());
        }

        writeln!(stdout, "smash pid is {}", shell.pid())?;
        Ok(CommandResult::Success)
    }
}

pub struct Pwd;

impl BuiltinCommand for Pwd {
    const BUILTIN: Builtin = Builtin::Pwd;

    fn run(_shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> Result<CommandResult> {
        if !args.is_empty() {
            return Err(Self::failure("expected 0 arguments").into());
        }

        let current_dir = env::current_dir().chain_err(|| Self::failure("getcwd failed"))?;
        writeln!(stdout, "{}", current_dir.display())?;
        Ok(CommandResult::Success)
    }
}

pub struct Cd;

impl BuiltinCommand for Cd {
    const BUILTIN: Builtin = Builtin::Cd;

    fn run(shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> Result<CommandResult> {
        let target = match args {
            [] => return Ok(CommandResult::Success),
            [target] => target,
            _ => return Err(Self::failure("expected 1 arguments").into()),
        };

        let current_dir = env::current_dir().chain_err(|| Self::failure("getcwd failed"))?;
        let target_dir = if target == "-" {
            let previous_dir = shell
                .previous_dir()
                .ok_or_else(|| Self::failure("old pwd not set"))?
                .to_path_buf();
            writeln!(stdout, "{}", previous_dir.display())?;
            previous_dir
        } else {
            PathBuf::from(target)
        };

        if let Err(e) = env::set_current_dir(&target_dir) {
            debug!("chdir({}) failed: {}", target_dir.display(), e);
            return Err(chdir_failure(&e, &target_dir).into());
        }

        shell.set_previous_dir(current_dir);
        Ok(CommandResult::Success)
    }
}

fn chdir_failure(error: &io::Error, target_dir: &Path) -> ErrorKind {
    let message = match error.raw_os_error().map(Errno::from_i32) {
        Some(Errno::ENOENT) => "target directory does not exist".to_string(),
        Some(Errno::ENOTDIR) => format!("{}: not a directory", target_dir.display()),
        _ => "chdir failed".to_string(),
    };
    Cd::failure(message)
}
