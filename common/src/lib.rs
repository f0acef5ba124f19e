pub mod logger;

pub use logger::{LogFormat, TraceId, child_span, init_logger, root_span};
