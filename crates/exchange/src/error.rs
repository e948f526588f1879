use dinex_core::{AccountError, OrderId, Price, Quantity, Shares};
use dinex_ports::RepositoryError;
use thiserror::Error;

/// Why a market command was refused
///
/// Every variant except `Storage` is a domain rejection: the command had no
/// effect and the caller may simply report it. `Storage` means the backing
/// store failed and is fatal for the request.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Invalid user: {0}")]
    UnknownParticipant(String),

    #[error("Invalid meal: {0}")]
    InvalidInstrument(String),

    #[error("Quantity must be positive")]
    InvalidQuantity,

    #[error("Price must be positive")]
    InvalidPrice,

    #[error("Order value out of range")]
    ValueOutOfRange,

    #[error("{0}")]
    Account(#[from] AccountError),

    #[error("IPO not started")]
    OfferingNotActive,

    #[error("Insufficient supply: requested {requested}, {available} left")]
    InsufficientSupply {
        requested: Quantity,
        available: Quantity,
    },

    #[error("Insufficient funds: need ${required:.2}, have ${available:.2}")]
    InsufficientFunds { required: Price, available: Price },

    #[error("Insufficient shares: need {required}, hold {held}")]
    InsufficientShares { required: Quantity, held: Shares },

    #[error("Short selling is disabled")]
    ShortSellingDisabled,

    #[error("No matching orders")]
    NoMatch,

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Not your order: {0}")]
    NotOwner(OrderId),

    #[error("Order not active: {0}")]
    OrderNotActive(OrderId),

    #[error("Only an admin can start the IPO")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl MarketError {
    /// Whether the error comes from the infrastructure rather than the
    /// command itself
    pub fn is_fatal(&self) -> bool {
        matches!(self, MarketError::Storage(_))
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
