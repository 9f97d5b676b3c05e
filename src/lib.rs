//! Smash - a small job control shell
//!
//! Reads command lines, runs the builtins in-process and everything else in
//! forked children, and keeps a table of background and stopped jobs.

#![deny(trivial_casts, trivial_numeric_casts, unused_import_braces)]

/// Logs the error of a `Result` that is otherwise ignored.
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {
        if let Err(ref e) = $result {
            log::error!(concat!($fmt, ": {}"), e);
        }
    };
    ($result:expr, $fmt:expr, $($arg:tt)*) => {
        if let Err(ref e) = $result {
            log::error!(concat!($fmt, ": {}"), $($arg)*, e);
        }
    };
}

pub mod core;
pub mod errors;
pub mod shell;
mod util;

pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::shell::{CommandResult, Shell, ShellConfig};
