use log::info;

use crate::shell::builtins::prelude::*;

pub struct Quit;

impl BuiltinCommand for Quit {
    const BUILTIN: Builtin = Builtin::Quit;

    fn run(shell: &mut Shell, args: &[String], stdout: &mut dyn Write) -> Result<CommandResult> {
        match args {
            [] => {}
            [arg] if arg == "kill" => {
                let config = *shell.config();
                shell.job_manager_mut().kill_all(
                    stdout,
                    config.quit_kill_grace_period,
                    config.quit_kill_poll_interval,
                )?;
            }
            [_] => return Err(Self::failure("unexpected arguments").into()),
            _ => return Err(Self::failure("expected 0 or 1 arguments").into()),
        }

        info!("quit requested, {} jobs left", shell.job_manager().len());
        Ok(CommandResult::Quit)
    }
}
