pub mod championship;
pub mod flight;

pub use championship::Championship;
pub use flight::{CaptureOutcome, Disqualifications, FlightData, FlightRecord, TechnicalPenalties};
