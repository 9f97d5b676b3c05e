//! Data model shared by the parser and the shell: commands and jobs.

pub mod command;
pub mod job;
pub mod parser;
