//! Parsing of slash commands from message text.

/// A recognised bot command with its first argument, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Generate(Option<String>),
    Ban(Option<String>),
    List,
    Verify(Option<String>),
}

impl Command {
    /// Parse `/name[@bot] [arg ...]`. Returns `None` for plain text and for
    /// commands the bot does not know.
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let head = words.next()?.strip_prefix('/')?;
        let name = head.split_once('@').map_or(head, |(name, _bot)| name);
        let arg = words.next().map(str::to_string);

        match name {
            "start" => Some(Self::Start),
            "generate" => Some(Self::Generate(arg)),
            "ban" => Some(Self::Ban(arg)),
            "list" => Some(Self::List),
            "verify" => Some(Self::Verify(arg)),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Generate(_) => "generate",
            Self::Ban(_) => "ban",
            Self::List => "list",
            Self::Verify(_) => "verify",
        }
    }

    /// Whether the command is restricted to operators.
    pub const fn is_privileged(&self) -> bool {
        !matches!(self, Self::Start)
    }
}
