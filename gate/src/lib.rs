//! Error classification, retry scheduling, and the intelligent gate that
//! decides whether a fetch batch should keep going.

pub mod classifier;
pub mod fingerprint;
pub mod intelligent_gate;

pub use classifier::{classify, get_retry, schedule_retry};
pub use intelligent_gate::{Admission, BatchCtx, IntelligentGate, RecordOutcome};
