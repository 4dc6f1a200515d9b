use std::str::FromStr;

use crate::data::types::{Base, GamePk, TeamId};

/// One line typed into the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Watch(GamePk),
    ToggleFavorite(TeamId),
    SelectBase(Base),
    CloseTooltip,
    Standings(TeamId),
    Teams,
    Stats,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid {0}: {1}")]
    InvalidArgument(&'static str, String),
}

pub const HELP: &str = "\
next | n              next live game
prev | p              previous live game
watch | w <gamePk>    watch another live game
fav | f <teamId>      add or remove a favorite team
base | b <1|2|3>      show the runner on a base
close                 close the runner card
standings <teamId>    team standings
teams                 list teams
stats                 poll counters
quit | q              exit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Err(CommandError::Empty);
        };
        let arg = parts.next();

        match word.to_ascii_lowercase().as_str() {
            "next" | "n" => Ok(Command::Next),
            "prev" | "p" => Ok(Command::Prev),
            "watch" | "w" => Ok(Command::Watch(number(arg, "gamePk")?)),
            "fav" | "f" => Ok(Command::ToggleFavorite(number(arg, "teamId")?)),
            "base" | "b" => {
                let base = match number::<u8>(arg, "base")? {
                    1 => Base::First,
                    2 => Base::Second,
                    3 => Base::Third,
                    n => return Err(CommandError::InvalidArgument("base", n.to_string())),
                };
                Ok(Command::SelectBase(base))
            }
            "close" => Ok(Command::CloseTooltip),
            "standings" | "s" => Ok(Command::Standings(number(arg, "teamId")?)),
            "teams" | "t" => Ok(Command::Teams),
            "stats" => Ok(Command::Stats),
            "help" | "h" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn number<T: FromStr>(arg: Option<&str>, what: &'static str) -> Result<T, CommandError> {
    let raw = arg.ok_or(CommandError::MissingArgument(what))?;
    raw.parse()
        .map_err(|_| CommandError::InvalidArgument(what, raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("next".parse(), Ok(Command::Next));
        assert_eq!("  P ".parse(), Ok(Command::Prev));
        assert_eq!("watch 745804".parse(), Ok(Command::Watch(745804)));
        assert_eq!("f 147".parse(), Ok(Command::ToggleFavorite(147)));
        assert_eq!("base 2".parse(), Ok(Command::SelectBase(Base::Second)));
        assert_eq!("standings 121".parse(), Ok(Command::Standings(121)));
        assert_eq!("q".parse(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "dance".parse::<Command>(),
            Err(CommandError::Unknown("dance".to_string()))
        );
        assert_eq!(
            "watch".parse::<Command>(),
            Err(CommandError::MissingArgument("gamePk"))
        );
        assert_eq!(
            "fav yankees".parse::<Command>(),
            Err(CommandError::InvalidArgument("teamId", "yankees".to_string()))
        );
        assert_eq!(
            "base 4".parse::<Command>(),
            Err(CommandError::InvalidArgument("base", "4".to_string()))
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CommandError::Unknown("x".to_string()).to_string(),
            "Unknown command: x (try `help`)"
        );
    }
}
