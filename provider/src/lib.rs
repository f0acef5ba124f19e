//! Provider abstraction, vendor adapters, and the type-indexed registry
//! the executor resolves a job's provider reference through.

pub mod context;
pub mod registry;
pub mod smart_adapter;
pub mod traits;
pub mod vendor_s;
pub mod vendor_t;

pub use context::FetchCtx;
pub use registry::ProviderRegistry;
pub use smart_adapter::{SimpleProvider, SmartAdapter};
pub use traits::{validate_symbols, Provider};
pub use vendor_s::VendorS;
pub use vendor_t::VendorT;
