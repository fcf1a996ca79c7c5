//! The matching/queue engine: helper registry, waiting line, pairing table.

pub mod engine;
pub mod line;
pub mod model;
pub mod registry;

pub use engine::MatchEngine;
pub use line::WaitingLine;
pub use model::{CompleteOutcome, LoginOutcome, Pairing, RequestOutcome, RequesterStatus};
pub use registry::{Helper, HelperRegistry};
