//! Command line parser
//!
//! A line is a sequence of whitespace separated tokens. Standalone `&&`
//! tokens split it into segments which run one after the other for as long as
//! they succeed; a standalone `&` ending a segment runs that segment in the
//! background. There is no quoting, expansion or redirection.

use log::debug;

use crate::core::command::Command;
use crate::errors::{ErrorKind, Result};

const AND_TOKEN: &str = "&&";
const BACKGROUND_TOKEN: &str = "&";

/// Parses `line` into a chain of commands.
///
/// Returns `Ok(None)` when the line holds no tokens. A segment may hold at
/// most `max_args` tokens, the command name included.
pub fn parse(line: &str, max_args: usize) -> Result<Option<Command>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut segments = Vec::new();
    for segment in tokens.split(|token| *token == AND_TOKEN) {
        if segment.is_empty() {
            return Err(ErrorKind::Syntax(AND_TOKEN.to_string()).into());
        }
        segments.push(parse_segment(segment, max_args)?);
    }

    // link back to front so every command owns the rest of the line
    let head = segments.into_iter().rev().fold(None, |next, mut command| {
        command.set_next(next);
        Some(command)
    });
    debug!("parsed command: {:?}", head);
    Ok(head)
}

fn parse_segment(tokens: &[&str], max_args: usize) -> Result<Command> {
    let (tokens, background) = match tokens.split_last() {
        Some((last, rest)) if *last == BACKGROUND_TOKEN && !rest.is_empty() => (rest, true),
        _ => (tokens, false),
    };

    if tokens.len() > max_args {
        return Err(ErrorKind::TooManyArguments(max_args).into());
    }

    let argv = tokens.iter().map(|token| token.to_string()).collect();
    Ok(Command::new(argv, background))
}
