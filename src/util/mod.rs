use std::io;
use std::os::unix::prelude::*;

use lazy_static::lazy_static;
use nix::unistd;
use regex::Regex;

lazy_static! {
    static ref NON_NEGATIVE_INTEGER: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

pub fn get_terminal() -> RawFd {
    io::stdin().as_raw_fd()
}

pub fn isatty() -> bool {
    let temp_result = unistd::isatty(get_terminal());
    log_if_err!(temp_result, "unistd::isatty");
    temp_result.unwrap_or(false)
}

/// Parses a non-negative integer literal made only of ASCII digits; signs,
/// whitespace and empty strings are rejected.
pub fn parse_non_negative<T: std::str::FromStr>(literal: &str) -> Option<T> {
    if NON_NEGATIVE_INTEGER.is_match(literal) {
        literal.parse().ok()
    } else {
        None
    }
}
