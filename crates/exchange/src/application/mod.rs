mod engine;
mod ledger;
mod participant;
mod queries;
mod reply;
pub mod views;

pub use engine::MatchingEngine;
pub use ledger::{Ledger, LedgerSession};
pub use participant::Participant;
pub use reply::{Cancellation, CommandReply, Execution, OfferingPurchase, OfferingStart};
