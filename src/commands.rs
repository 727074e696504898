// =============================================================================
// commands.rs - Comenzile Operatorului (stdin)
// =============================================================================
//
// O linie de text -> o comanda tipizata. Parsarea este o functie pura;
// executia are loc in bucla principala din main.rs.
//
//   burst [ip]    rafala de la sursa data (sau aleatoare)
//   normal [n]    n pachete obisnuite (implicit 10)
//   clear         reseteaza statisticile si contorul generatorului
//   pause/resume  ingheata/reporneste generarea si animatia
//   stats         afiseaza linia de statistici acum
//   node <ip>     detaliile unui nod
//   quit          oprire
//
// =============================================================================

use thiserror::Error;

/// Numarul implicit de pachete pentru `normal`.
const DEFAULT_NORMAL_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Burst(Option<String>),
    Normal(usize),
    Clear,
    Pause,
    Resume,
    Stats,
    Node(String),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("comanda necunoscuta: '{0}'")]
    Unknown(String),

    #[error("'{command}' asteapta {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("numar invalid: '{0}'")]
    InvalidCount(String),

    #[error("'{0}' nu accepta argumente suplimentare")]
    TrailingArguments(&'static str),
}

impl Command {
    /// Parseaza o linie. `Ok(None)` pentru o linie goala.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let argument = words.next();
        let extra = words.next().is_some();

        // NOTA RUST: `to_ascii_lowercase` aloca un String nou; comparam
        // cu literali prin `.as_str()`.
        let command = match name.to_ascii_lowercase().as_str() {
            "burst" | "b" => Command::Burst(argument.map(str::to_string)),
            "normal" | "n" => match argument {
                None => Command::Normal(DEFAULT_NORMAL_COUNT),
                Some(raw) => match raw.parse::<usize>() {
                    Ok(count) if count > 0 => Command::Normal(count),
                    _ => return Err(CommandError::InvalidCount(raw.to_string())),
                },
            },
            "node" => match argument {
                Some(address) => Command::Node(address.to_string()),
                None => {
                    return Err(CommandError::MissingArgument {
                        command: "node",
                        expected: "o adresa IP",
                    })
                }
            },
            "clear" => Self::no_argument("clear", argument, Command::Clear)?,
            "pause" | "p" => Self::no_argument("pause", argument, Command::Pause)?,
            "resume" | "r" => Self::no_argument("resume", argument, Command::Resume)?,
            "stats" | "s" => Self::no_argument("stats", argument, Command::Stats)?,
            "quit" | "q" | "exit" => Self::no_argument("quit", argument, Command::Quit)?,
            _ => return Err(CommandError::Unknown(name.to_string())),
        };

        if extra {
            let name = match command {
                Command::Burst(_) => "burst",
                Command::Normal(_) => "normal",
                _ => "node",
            };
            return Err(CommandError::TrailingArguments(name));
        }

        Ok(Some(command))
    }

    fn no_argument(
        name: &'static str,
        argument: Option<&str>,
        command: Command,
    ) -> Result<Command, CommandError> {
        match argument {
            Some(_) => Err(CommandError::TrailingArguments(name)),
            None => Ok(command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_line() {
        assert_eq!(Command::parse(""), Ok(None));
        assert_eq!(Command::parse("   \t"), Ok(None));
    }

    #[test]
    fn test_burst_with_and_without_source() {
        assert_eq!(Command::parse("burst"), Ok(Some(Command::Burst(None))));
        assert_eq!(
            Command::parse("  BURST 10.0.0.7 "),
            Ok(Some(Command::Burst(Some("10.0.0.7".to_string()))))
        );
        assert_eq!(Command::parse("b"), Ok(Some(Command::Burst(None))));
    }

    #[test]
    fn test_normal_count() {
        assert_eq!(Command::parse("normal"), Ok(Some(Command::Normal(10))));
        assert_eq!(Command::parse("n 25"), Ok(Some(Command::Normal(25))));
        assert_eq!(
            Command::parse("normal zero"),
            Err(CommandError::InvalidCount("zero".to_string()))
        );
        assert_eq!(
            Command::parse("normal 0"),
            Err(CommandError::InvalidCount("0".to_string()))
        );
    }

    #[test]
    fn test_node_requires_address() {
        assert_eq!(
            Command::parse("node 10.0.0.1"),
            Ok(Some(Command::Node("10.0.0.1".to_string())))
        );
        assert!(matches!(
            Command::parse("node"),
            Err(CommandError::MissingArgument { command: "node", .. })
        ));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::parse("clear"), Ok(Some(Command::Clear)));
        assert_eq!(Command::parse("p"), Ok(Some(Command::Pause)));
        assert_eq!(Command::parse("resume"), Ok(Some(Command::Resume)));
        assert_eq!(Command::parse("stats"), Ok(Some(Command::Stats)));
        assert_eq!(Command::parse("exit"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn test_rejected_input() {
        assert_eq!(
            Command::parse("reboot"),
            Err(CommandError::Unknown("reboot".to_string()))
        );
        assert_eq!(
            Command::parse("clear now"),
            Err(CommandError::TrailingArguments("clear"))
        );
        assert_eq!(
            Command::parse("burst 10.0.0.1 10.0.0.2"),
            Err(CommandError::TrailingArguments("burst"))
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CommandError::Unknown("x".into()).to_string(),
            "comanda necunoscuta: 'x'"
        );
        assert_eq!(
            CommandError::MissingArgument {
                command: "node",
                expected: "o adresa IP"
            }
            .to_string(),
            "'node' asteapta o adresa IP"
        );
    }
}
