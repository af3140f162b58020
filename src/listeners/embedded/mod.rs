//! # Built-in listeners
//!
//! Small, self-contained implementations useful for demos and debugging.
//!
//! - [`LogFinalizer`]: logs every terminal event through `tracing`.

mod log;

pub use log::LogFinalizer;
