//! Console command parsing.
//!
//! Each input line names the player it speaks for, followed by a verb:
//!
//! ```text
//! alice join Alice
//! alice sit 0 1000
//! alice raise 300
//! bob call @7
//! bob resync 42
//! snapshot
//! ```
//!
//! An action may end with `@HAND` to pin the hand it is meant for; without
//! it the action applies to whatever hand is current.

use holdem_table::entities::{ActionType, Chips, HandId, PlayerId, SeatIndex};
use thiserror::Error;

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("'{command}' requires {argument} (e.g., '{example}')")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
        example: &'static str,
    },

    #[error("Invalid number '{0}'. Must be a non-negative integer")]
    InvalidNumber(String),

    #[error("Unrecognized command '{0}'. Type 'help' to see available commands")]
    Unrecognized(String),
}

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Subscribe to the table's events
    Join { player: PlayerId, name: String },
    /// Stop receiving events
    Leave { player: PlayerId },
    Sit {
        player: PlayerId,
        seat: SeatIndex,
        buy_in: Chips,
    },
    Stand { player: PlayerId },
    Act {
        player: PlayerId,
        action: ActionType,
        amount: Option<Chips>,
        /// The hand the action targets; `None` means the current one
        hand_id: Option<HandId>,
    },
    /// Catch up from the last sequence number the player saw
    Resync { player: PlayerId, last_seq: u64 },
    /// Print the table; `None` for the observer view
    Snapshot { player: Option<PlayerId> },
    Help,
    Quit,
}

/// Parse one input line into a [`Command`].
///
/// # Examples
///
/// ```
/// use ht_server::commands::{Command, parse_command};
/// use holdem_table::entities::ActionType;
///
/// assert!(matches!(parse_command("help"), Ok(Command::Help)));
/// assert!(matches!(
///     parse_command("alice raise 300"),
///     Ok(Command::Act { action: ActionType::Raise, amount: Some(300), .. })
/// ));
/// ```
pub fn parse_command(input: &str) -> Result<Command, CommandError> {
    let parts: Vec<&str> = input.split_ascii_whitespace().collect();
    match parts.as_slice() {
        [] => Err(CommandError::Empty),
        ["help"] => Ok(Command::Help),
        ["quit" | "exit"] => Ok(Command::Quit),
        ["snapshot"] => Ok(Command::Snapshot { player: None }),
        [player, verb, args @ ..] => parse_player_command(PlayerId::new(player), verb, args),
        [other] => Err(CommandError::Unrecognized((*other).to_string())),
    }
}

fn parse_player_command(
    player: PlayerId,
    verb: &str,
    args: &[&str],
) -> Result<Command, CommandError> {
    match verb {
        "join" => {
            let name = if args.is_empty() {
                player.to_string()
            } else {
                args.join(" ")
            };
            Ok(Command::Join { player, name })
        }
        "leave" => Ok(Command::Leave { player }),
        "stand" => Ok(Command::Stand { player }),
        "snapshot" => Ok(Command::Snapshot {
            player: Some(player),
        }),
        "fold" | "check" | "call" | "all-in" | "allin" => {
            let action = match verb {
                "fold" => ActionType::Fold,
                "check" => ActionType::Check,
                "call" => ActionType::Call,
                _ => ActionType::AllIn,
            };
            let (_, hand_id) = split_hand_id(args)?;
            Ok(Command::Act {
                player,
                action,
                amount: None,
                hand_id,
            })
        }
        "bet" | "raise" => {
            let (action, command, example) = if verb == "bet" {
                (ActionType::Bet, "bet", "alice bet 200")
            } else {
                (ActionType::Raise, "raise", "alice raise 300")
            };
            let (args, hand_id) = split_hand_id(args)?;
            let amount = required(args.first(), command, "an amount", example)?;
            Ok(Command::Act {
                player,
                action,
                amount: Some(parse_number(amount)?),
                hand_id,
            })
        }
        "sit" => {
            let seat = required(args.first(), "sit", "a seat and a buy-in", "alice sit 0 1000")?;
            let buy_in = required(args.get(1), "sit", "a seat and a buy-in", "alice sit 0 1000")?;
            Ok(Command::Sit {
                player,
                seat: parse_number(seat)?,
                buy_in: parse_number(buy_in)?,
            })
        }
        "resync" => {
            let last_seq = required(args.first(), "resync", "a sequence number", "alice resync 42")?;
            Ok(Command::Resync {
                player,
                last_seq: parse_number(last_seq)?,
            })
        }
        other => Err(CommandError::Unrecognized(other.to_string())),
    }
}

/// Peel a trailing `@HAND` off an action's arguments.
fn split_hand_id<'a>(
    args: &'a [&'a str],
) -> Result<(&'a [&'a str], Option<HandId>), CommandError> {
    match args.split_last() {
        Some((last, rest)) => match last.strip_prefix('@') {
            Some(hand_id) => Ok((rest, Some(parse_number(hand_id)?))),
            None => Ok((args, None)),
        },
        None => Ok((args, None)),
    }
}

fn required<'a>(
    arg: Option<&&'a str>,
    command: &'static str,
    argument: &'static str,
    example: &'static str,
) -> Result<&'a str, CommandError> {
    arg.copied().ok_or(CommandError::MissingArgument {
        command,
        argument,
        example,
    })
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T, CommandError> {
    value
        .parse()
        .map_err(|_| CommandError::InvalidNumber(value.to_string()))
}
