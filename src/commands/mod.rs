//! Chat command parsing and handlers.
//!
//! A command line starts with `!`, followed by a command name and
//! whitespace-separated arguments. Names are matched case-insensitively
//! against the closed [`Command`] table; anything else is ignored.

pub mod calc;
pub mod configure;
pub mod dispatcher;
pub mod dj;
pub mod simple;

pub use dispatcher::{Dispatcher, Services};

/// Prefix that marks a chat line as a command.
pub const COMMAND_PREFIX: char = '!';

/// Known chat commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `!ask <question>`
    Ask,
    /// `!choice <a> <b> ...`
    Choice,
    /// `!calc <expression>`
    Calc,
    /// `!gpt <question>` or `!gpt clear`
    Gpt,
    /// `!dj <subcommand> [args]`
    Dj,
    /// `!config <KIND> <value>`
    Config,
}

impl Command {
    /// Look up a command by name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "ask" => Some(Self::Ask),
            "choice" => Some(Self::Choice),
            "calc" => Some(Self::Calc),
            "gpt" => Some(Self::Gpt),
            "dj" => Some(Self::Dj),
            "config" => Some(Self::Config),
            _ => None,
        }
    }
}

/// A recognized command with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Which command was invoked.
    pub command: Command,
    /// Whitespace-separated arguments after the command name.
    pub args: Vec<String>,
}

impl ParsedCommand {
    /// Arguments re-joined with single spaces.
    #[must_use]
    pub fn joined_args(&self) -> String {
        self.args.join(" ")
    }
}

/// Trim and drop control characters other than whitespace.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect()
}

/// Parse a chat line into a known command.
///
/// Returns `None` for lines without the prefix and for unknown commands.
#[must_use]
pub fn parse(raw: &str) -> Option<ParsedCommand> {
    let text = normalize(raw);
    let body = text.strip_prefix(COMMAND_PREFIX)?;
    let mut words = body.split_whitespace();
    let command = Command::from_name(words.next()?)?;

    Some(ParsedCommand {
        command,
        args: words.map(str::to_owned).collect(),
    })
}
