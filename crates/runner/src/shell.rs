//! Parsing of terminal command lines
//!
//! One command per line. Meal names may contain spaces, so they always come
//! last and take the rest of the line.

use dinex_core::{OrderId, Price, Quantity};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(String),
    Logout,
    Price,
    Market,
    Book(String),
    History(Option<usize>),
    Portfolio,
    Orders,
    Stats,
    Balances,
    Start,
    Ipo {
        quantity: Quantity,
        instrument: String,
    },
    Buy {
        price: Price,
        quantity: Quantity,
        instrument: String,
        snap: bool,
    },
    Sell {
        price: Price,
        quantity: Quantity,
        instrument: String,
        short: bool,
    },
    Cancel(OrderId),
    Help,
    Quit,
}

impl Command {
    /// Whether the command acts on behalf of a logged-in participant
    pub fn needs_login(&self) -> bool {
        matches!(
            self,
            Command::Portfolio
                | Command::Orders
                | Command::Start
                | Command::Ipo { .. }
                | Command::Buy { .. }
                | Command::Sell { .. }
                | Command::Cancel(_)
        )
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShellError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command '{0}', type 'help' for a list")]
    UnknownCommand(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("Not a valid {argument}: '{value}'")]
    InvalidNumber {
        argument: &'static str,
        value: String,
    },
}

pub const HELP: &str = "\
Commands:
  login <name>                      identify yourself
  logout                            forget the current user
  price                             current IPO price
  market                            every meal with supply and top of book
  book <meal>                       full order book of one meal
  history [n]                       most recent trades
  portfolio                         your balance and holdings
  orders                            your resting orders
  stats                             market statistics
  balances                          cash of every participant
  start                             start the IPO (admin only)
  ipo <qty> <meal>                  buy from the IPO
  bid <price> <qty> <meal>          limit buy, remainder rests
  snap <price> <qty> <meal>         limit buy, remainder is dropped
  ask <price> <qty> <meal>          limit sell, needs the shares
  short <price> <qty> <meal>        limit sell without owning the shares
  cancel <order id>                 cancel one of your orders
  help                              this text
  quit                              leave";

/// Parse one input line
pub fn parse(line: &str) -> Result<Command, ShellError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Err(ShellError::Empty),
        "login" => Ok(Command::Login(required(rest, "login", "a name")?.to_string())),
        "logout" => Ok(Command::Logout),
        "price" => Ok(Command::Price),
        "market" => Ok(Command::Market),
        "book" => Ok(Command::Book(required(rest, "book", "a meal")?.to_string())),
        "history" => {
            if rest.is_empty() {
                Ok(Command::History(None))
            } else {
                Ok(Command::History(Some(number(rest, "trade count")?)))
            }
        }
        "portfolio" => Ok(Command::Portfolio),
        "orders" => Ok(Command::Orders),
        "stats" => Ok(Command::Stats),
        "balances" => Ok(Command::Balances),
        "start" => Ok(Command::Start),
        "ipo" => {
            let (quantity, instrument) = split_first(rest, "ipo", "a quantity")?;
            Ok(Command::Ipo {
                quantity: number(quantity, "quantity")?,
                instrument: required(instrument, "ipo", "a meal")?.to_string(),
            })
        }
        "bid" | "snap" => {
            let command = if word.eq_ignore_ascii_case("snap") { "snap" } else { "bid" };
            let (price, quantity, instrument) = limit_arguments(rest, command)?;
            Ok(Command::Buy {
                price,
                quantity,
                instrument,
                snap: command == "snap",
            })
        }
        "ask" | "short" => {
            let command = if word.eq_ignore_ascii_case("short") { "short" } else { "ask" };
            let (price, quantity, instrument) = limit_arguments(rest, command)?;
            Ok(Command::Sell {
                price,
                quantity,
                instrument,
                short: command == "short",
            })
        }
        "cancel" => {
            let id = required(rest, "cancel", "an order id")?;
            Ok(Command::Cancel(OrderId(number(id, "order id")?)))
        }
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(ShellError::UnknownCommand(other.to_string())),
    }
}

fn required<'a>(
    value: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ShellError> {
    if value.is_empty() {
        Err(ShellError::MissingArgument { command, argument })
    } else {
        Ok(value)
    }
}

fn split_first<'a>(
    rest: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<(&'a str, &'a str), ShellError> {
    let rest = required(rest, command, argument)?;
    Ok(match rest.split_once(char::is_whitespace) {
        Some((first, tail)) => (first, tail.trim()),
        None => (rest, ""),
    })
}

fn limit_arguments(rest: &str, command: &'static str) -> Result<(Price, Quantity, String), ShellError> {
    let (price, rest) = split_first(rest, command, "a price")?;
    let (quantity, instrument) = split_first(rest, command, "a quantity")?;
    let instrument = required(instrument, command, "a meal")?;
    Ok((price_value(price)?, number(quantity, "quantity")?, instrument.to_string()))
}

fn number<T: FromStr>(value: &str, argument: &'static str) -> Result<T, ShellError> {
    value.parse().map_err(|_| ShellError::InvalidNumber {
        argument,
        value: value.to_string(),
    })
}

fn price_value(value: &str) -> Result<Price, ShellError> {
    let digits = value.strip_prefix('$').unwrap_or(value);
    Decimal::from_str(digits).map_err(|_| ShellError::InvalidNumber {
        argument: "price",
        value: value.to_string(),
    })
}
