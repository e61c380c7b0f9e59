//! Command Parser
//!
//! Commands arrive as whitespace-tokenized text lines:
//!
//! ```text
//! SET <key> <value> [EX <seconds>] [NX|XX]
//! GET <key>
//! QPUSH <key> <value> [value ...]
//! QPOP <key>
//! BQPOP <key> <timeout>
//! ```
//!
//! Verbs are case-insensitive; keys and values are taken verbatim. Parsing
//! validates shape only — arity, option syntax, numeric ranges — and leaves
//! semantics (conditions, expiry, blocking) to the store.

use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

use crate::storage::SetCondition;

/// Errors produced while parsing a command line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line contained no tokens.
    #[error("empty command")]
    Empty,

    /// The verb is not one of the supported commands.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Too few or too many arguments for the verb.
    #[error("wrong number of arguments for '{0}'")]
    WrongArity(&'static str),

    /// `EX` was not followed by a non-negative integer.
    #[error("expiry must be a non-negative integer")]
    InvalidExpiry,

    /// The `BQPOP` timeout was not a non-negative number.
    #[error("timeout must be a non-negative number of seconds")]
    InvalidTimeout,

    /// Both `NX` and `XX` were given.
    #[error("NX and XX are mutually exclusive")]
    ConflictingConditions,

    /// An option token was not recognized.
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

/// A parsed, validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set {
        key: String,
        value: Bytes,
        expiry: Option<Duration>,
        condition: SetCondition,
    },
    Get {
        key: String,
    },
    QueuePush {
        key: String,
        values: Vec<Bytes>,
    },
    QueuePop {
        key: String,
    },
    BlockingQueuePop {
        key: String,
        timeout: Duration,
    },
}

impl Command {
    /// Parses one command line.
    pub fn parse(line: &str) -> Result<Command, ParseError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let verb = tokens.first().ok_or(ParseError::Empty)?;

        match verb.to_uppercase().as_str() {
            "SET" => parse_set(&tokens),
            "GET" => {
                let &[_, key] = &tokens[..] else {
                    return Err(ParseError::WrongArity("GET"));
                };
                Ok(Command::Get {
                    key: key.to_owned(),
                })
            }
            "QPUSH" => {
                if tokens.len() < 3 {
                    return Err(ParseError::WrongArity("QPUSH"));
                }
                Ok(Command::QueuePush {
                    key: tokens[1].to_owned(),
                    values: tokens[2..].iter().map(|v| Bytes::from(v.to_string())).collect(),
                })
            }
            "QPOP" => {
                let &[_, key] = &tokens[..] else {
                    return Err(ParseError::WrongArity("QPOP"));
                };
                Ok(Command::QueuePop {
                    key: key.to_owned(),
                })
            }
            "BQPOP" => {
                let &[_, key, timeout] = &tokens[..] else {
                    return Err(ParseError::WrongArity("BQPOP"));
                };
                Ok(Command::BlockingQueuePop {
                    key: key.to_owned(),
                    timeout: parse_timeout(timeout)?,
                })
            }
            _ => Err(ParseError::UnknownCommand(verb.to_string())),
        }
    }
}

/// `SET <key> <value> [EX <seconds>] [NX|XX]` — between 3 and 6 tokens.
fn parse_set(tokens: &[&str]) -> Result<Command, ParseError> {
    if tokens.len() < 3 || tokens.len() > 6 {
        return Err(ParseError::WrongArity("SET"));
    }

    let key = tokens[1].to_owned();
    let value = Bytes::from(tokens[2].to_string());

    let mut expiry = None;
    let mut condition = SetCondition::Always;

    let mut i = 3;
    while i < tokens.len() {
        match tokens[i].to_uppercase().as_str() {
            "EX" => {
                let seconds: u64 = tokens
                    .get(i + 1)
                    .ok_or(ParseError::InvalidExpiry)?
                    .parse()
                    .map_err(|_| ParseError::InvalidExpiry)?;
                // EX 0 means no expiry, as in the original command handler.
                expiry = (seconds > 0).then(|| Duration::from_secs(seconds));
                i += 2;
            }
            "NX" | "XX" => {
                if condition != SetCondition::Always {
                    return Err(ParseError::ConflictingConditions);
                }
                condition = if tokens[i].eq_ignore_ascii_case("NX") {
                    SetCondition::IfAbsent
                } else {
                    SetCondition::IfPresent
                };
                i += 1;
            }
            _ => return Err(ParseError::UnexpectedArgument(tokens[i].to_string())),
        }
    }

    Ok(Command::Set {
        key,
        value,
        expiry,
        condition,
    })
}

/// Timeouts are non-negative seconds; fractions are allowed, so `0.5` waits
/// half a second and `0` polls once.
fn parse_timeout(token: &str) -> Result<Duration, ParseError> {
    let seconds: f64 = token.parse().map_err(|_| ParseError::InvalidTimeout)?;
    Duration::try_from_secs_f64(seconds).map_err(|_| ParseError::InvalidTimeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_set() {
        assert_eq!(
            Command::parse("SET name alice"),
            Ok(Command::Set {
                key: "name".into(),
                value: Bytes::from("alice"),
                expiry: None,
                condition: SetCondition::Always,
            })
        );
    }

    #[test]
    fn verbs_are_case_insensitive() {
        assert!(matches!(
            Command::parse("get name"),
            Ok(Command::Get { .. })
        ));
        assert!(matches!(
            Command::parse("set name alice ex 10 nx"),
            Ok(Command::Set {
                expiry: Some(_),
                condition: SetCondition::IfAbsent,
                ..
            })
        ));
    }

    #[test]
    fn set_with_expiry_and_condition() {
        assert_eq!(
            Command::parse("SET session tok123 EX 60 XX"),
            Ok(Command::Set {
                key: "session".into(),
                value: Bytes::from("tok123"),
                expiry: Some(Duration::from_secs(60)),
                condition: SetCondition::IfPresent,
            })
        );
    }

    #[test]
    fn set_with_zero_expiry_has_no_ttl() {
        assert_eq!(
            Command::parse("SET k v EX 0"),
            Ok(Command::Set {
                key: "k".into(),
                value: Bytes::from("v"),
                expiry: None,
                condition: SetCondition::Always,
            })
        );
    }

    #[test]
    fn set_rejects_bad_shapes() {
        assert_eq!(Command::parse("SET k"), Err(ParseError::WrongArity("SET")));
        assert_eq!(
            Command::parse("SET k v EX 1 NX XX"),
            Err(ParseError::WrongArity("SET"))
        );
        assert_eq!(
            Command::parse("SET k v NX XX"),
            Err(ParseError::ConflictingConditions)
        );
        assert_eq!(Command::parse("SET k v EX"), Err(ParseError::InvalidExpiry));
        assert_eq!(
            Command::parse("SET k v EX -5"),
            Err(ParseError::InvalidExpiry)
        );
        assert_eq!(
            Command::parse("SET k v EX ten"),
            Err(ParseError::InvalidExpiry)
        );
        assert_eq!(
            Command::parse("SET k v BOGUS"),
            Err(ParseError::UnexpectedArgument("BOGUS".into()))
        );
    }

    #[test]
    fn get_takes_exactly_one_key() {
        assert_eq!(
            Command::parse("GET name"),
            Ok(Command::Get { key: "name".into() })
        );
        assert_eq!(Command::parse("GET"), Err(ParseError::WrongArity("GET")));
        assert_eq!(
            Command::parse("GET a b"),
            Err(ParseError::WrongArity("GET"))
        );
    }

    #[test]
    fn qpush_takes_multiple_values() {
        assert_eq!(
            Command::parse("QPUSH jobs a b c"),
            Ok(Command::QueuePush {
                key: "jobs".into(),
                values: vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")],
            })
        );
        assert_eq!(
            Command::parse("QPUSH jobs"),
            Err(ParseError::WrongArity("QPUSH"))
        );
    }

    #[test]
    fn bqpop_parses_fractional_timeouts() {
        assert_eq!(
            Command::parse("BQPOP jobs 2.5"),
            Ok(Command::BlockingQueuePop {
                key: "jobs".into(),
                timeout: Duration::from_millis(2500),
            })
        );
        assert_eq!(
            Command::parse("BQPOP jobs 0"),
            Ok(Command::BlockingQueuePop {
                key: "jobs".into(),
                timeout: Duration::ZERO,
            })
        );
    }

    #[test]
    fn bqpop_rejects_bad_timeouts() {
        assert_eq!(
            Command::parse("BQPOP jobs -1"),
            Err(ParseError::InvalidTimeout)
        );
        assert_eq!(
            Command::parse("BQPOP jobs soon"),
            Err(ParseError::InvalidTimeout)
        );
        assert_eq!(
            Command::parse("BQPOP jobs NaN"),
            Err(ParseError::InvalidTimeout)
        );
        assert_eq!(
            Command::parse("BQPOP jobs"),
            Err(ParseError::WrongArity("BQPOP"))
        );
    }

    #[test]
    fn unknown_and_empty_commands() {
        assert_eq!(
            Command::parse("FLUSH everything"),
            Err(ParseError::UnknownCommand("FLUSH".into()))
        );
        assert_eq!(Command::parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn extra_whitespace_is_tolerated() {
        assert_eq!(
            Command::parse("  SET   k   v  "),
            Ok(Command::Set {
                key: "k".into(),
                value: Bytes::from("v"),
                expiry: None,
                condition: SetCondition::Always,
            })
        );
    }
}
