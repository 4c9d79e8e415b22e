//! Commands accepted by a session driver.

use roster_core::FilterKey;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    SwitchFilter(FilterKey),
    LoadMore,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandParseError {
    #[error("Empty command")]
    Empty,
    #[error("Missing tag (usage: tag <value>)")]
    MissingTag,
    #[error("Unknown command: {0}")]
    Unknown(String),
}

/// Line commands: `all`, `local` (or `read`), `tag <value>`, `more`,
/// `quit`.
impl FromStr for SessionCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        match verb.to_ascii_lowercase().as_str() {
            "" => Err(CommandParseError::Empty),
            "all" => Ok(Self::SwitchFilter(FilterKey::All)),
            "local" | "read" => Ok(Self::SwitchFilter(FilterKey::Local)),
            "tag" if rest.is_empty() => Err(CommandParseError::MissingTag),
            "tag" => Ok(Self::SwitchFilter(FilterKey::from_wire(rest))),
            "more" => Ok(Self::LoadMore),
            "quit" | "exit" => Ok(Self::Shutdown),
            _ => Err(CommandParseError::Unknown(line.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("all".parse::<SessionCommand>(), Ok(SessionCommand::SwitchFilter(FilterKey::All)));
        assert_eq!(" MORE ".parse::<SessionCommand>(), Ok(SessionCommand::LoadMore));
        assert_eq!("read".parse::<SessionCommand>(), Ok(SessionCommand::SwitchFilter(FilterKey::Local)));
        assert_eq!(
            "tag 👍".parse::<SessionCommand>(),
            Ok(SessionCommand::SwitchFilter(FilterKey::tag("👍")))
        );
        assert_eq!("quit".parse::<SessionCommand>(), Ok(SessionCommand::Shutdown));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<SessionCommand>(), Err(CommandParseError::Empty));
        assert_eq!("tag".parse::<SessionCommand>(), Err(CommandParseError::MissingTag));
        assert!(matches!(
            "dance".parse::<SessionCommand>(),
            Err(CommandParseError::Unknown(_))
        ));
    }
}
