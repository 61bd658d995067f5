//! Host command line protocol.
//!
//! One command per line: `<cover> <command> [argument]`, or the global
//! `status`. Text after `#` is a comment.

use std::str::FromStr;

use relay_cover_common::cover::CoverError;
use relay_cover_engine::HostCommand;

#[derive(Debug, Clone, PartialEq)]
pub enum HostLine {
    /// Blank or comment-only line.
    Empty,
    /// Log the state of every cover.
    Status,
    Command { cover: String, command: HostCommand },
}

impl FromStr for HostLine {
    type Err = CoverError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }
        if line.eq_ignore_ascii_case("status") {
            return Ok(Self::Status);
        }

        let Some((cover, rest)) = line.split_once(char::is_whitespace) else {
            return Err(CoverError::InvalidCommand(format!(
                "missing command for '{line}'"
            )));
        };
        Ok(Self::Command {
            cover: cover.to_string(),
            command: rest.parse()?,
        })
    }
}
