use dinex_core::{InstrumentId, Order, OrderId, Price, Quantity, Side, Timestamp, Trade};
use serde::Serialize;

use crate::error::Result;

/// Uniform answer to a command, ready for a front end
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReply {
    pub success: bool,
    pub message: String,
    pub trades: Vec<Trade>,
}

impl CommandReply {
    pub fn ok(message: impl Into<String>, trades: Vec<Trade>) -> Self {
        Self {
            success: true,
            message: message.into(),
            trades,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            trades: Vec::new(),
        }
    }

    /// Fold a command result into a reply.
    ///
    /// Domain rejections become unsuccessful replies; storage faults are
    /// passed back to the caller.
    pub fn from_result<T: Into<CommandReply>>(result: Result<T>) -> Result<CommandReply> {
        match result {
            Ok(outcome) => Ok(outcome.into()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => Ok(Self::rejected(e.to_string())),
        }
    }
}

/// Shares bought from the house offering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferingPurchase {
    pub instrument_id: InstrumentId,
    pub quantity: Quantity,
    pub price: Price,
    pub cost: Price,
    pub trade: Trade,
}

impl From<OfferingPurchase> for CommandReply {
    fn from(purchase: OfferingPurchase) -> Self {
        let message = format!(
            "Bought {} shares of {} at ${:.2}",
            purchase.quantity, purchase.instrument_id, purchase.price
        );
        CommandReply::ok(message, vec![purchase.trade])
    }
}

/// Outcome of a limit order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Execution {
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub requested: Quantity,
    pub filled: Quantity,
    /// Order left on the book for the unfilled part
    pub resting: Option<OrderId>,
    pub trades: Vec<Trade>,
}

impl Execution {
    /// Quantity neither executed nor resting (a snap buy's remainder)
    pub fn discarded(&self) -> Quantity {
        if self.resting.is_some() {
            0
        } else {
            self.requested - self.filled
        }
    }

    pub fn rested(&self) -> Quantity {
        if self.resting.is_some() {
            self.requested - self.filled
        } else {
            0
        }
    }
}

impl From<Execution> for CommandReply {
    fn from(execution: Execution) -> Self {
        let message = if execution.resting.is_some() {
            format!(
                "Executed {} shares, {} shares added to order book",
                execution.filled,
                execution.rested()
            )
        } else {
            format!("Executed {} shares", execution.filled)
        };
        CommandReply::ok(message, execution.trades)
    }
}

/// A withdrawn order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cancellation {
    pub order: Order,
}

impl From<Cancellation> for CommandReply {
    fn from(_: Cancellation) -> Self {
        CommandReply::ok("Order cancelled", Vec::new())
    }
}

/// Result of asking to start the offering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OfferingStart {
    /// This call started the clock
    Started(Timestamp),
    /// The clock was already running since the given instant
    AlreadyStarted(Timestamp),
}

impl OfferingStart {
    pub fn started_at(&self) -> Timestamp {
        match self {
            OfferingStart::Started(at) | OfferingStart::AlreadyStarted(at) => *at,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, OfferingStart::Started(_))
    }
}

impl From<OfferingStart> for CommandReply {
    fn from(start: OfferingStart) -> Self {
        match start {
            OfferingStart::Started(_) => CommandReply::ok("IPO started", Vec::new()),
            OfferingStart::AlreadyStarted(_) => CommandReply::ok("IPO already running", Vec::new()),
        }
    }
}
