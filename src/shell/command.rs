/*!
 * Shell Commands
 * Parsing of one input line into a scheduler directive or a foreground command
 */

use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::types::Tier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Blank line
    Empty,
    /// `submit <path> [<priority>]`
    Submit { program: String, tier: Option<Tier> },
    /// `run`
    Run,
    /// `pause`
    Pause,
    /// `jobs [--json]`
    Jobs { json: bool },
    /// `exit`
    Exit,
    /// Anything else, run synchronously in the foreground
    External { program: String, args: Vec<String> },
}

impl ShellCommand {
    /// Parse a line split on whitespace
    pub fn parse(line: &str) -> ProcessResult<Self> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(ShellCommand::Empty);
        };
        let rest: Vec<&str> = words.collect();

        match (head, rest.as_slice()) {
            ("submit", []) => Err(ProcessError::InvalidCommand(
                "submit needs a program path".into(),
            )),
            ("submit", [program]) => Ok(ShellCommand::Submit {
                program: program.to_string(),
                tier: None,
            }),
            ("submit", [program, priority]) => Ok(ShellCommand::Submit {
                program: program.to_string(),
                tier: Some(parse_tier(priority)?),
            }),
            ("submit", _) => Err(ProcessError::InvalidCommand(
                "submit takes a program path and an optional priority".into(),
            )),
            ("run", []) => Ok(ShellCommand::Run),
            ("pause", []) => Ok(ShellCommand::Pause),
            ("jobs", []) => Ok(ShellCommand::Jobs { json: false }),
            ("jobs", ["--json"]) => Ok(ShellCommand::Jobs { json: true }),
            ("exit", []) => Ok(ShellCommand::Exit),
            (program, args) => Ok(ShellCommand::External {
                program: program.to_string(),
                args: args.iter().map(|arg| arg.to_string()).collect(),
            }),
        }
    }
}

fn parse_tier(text: &str) -> ProcessResult<Tier> {
    text.parse::<u8>()
        .ok()
        .and_then(Tier::new)
        .ok_or_else(|| ProcessError::InvalidPriority(text.to_string()))
}
