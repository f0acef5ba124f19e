//! Executor (C7) and canonical message builder glue (C8): turns a
//! ticked [`core_types::Job`] into a fetched, normalised, published
//! [`core_types::CanonicalMessage`].

pub mod bus;
pub mod executor;
pub mod types;

pub use bus::{InMemoryBus, RedisBus};
pub use executor::Executor;
pub use types::{Bus, ExecutorError};
