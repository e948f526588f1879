mod instrument;

pub use instrument::{Category, Instrument, InstrumentId};
