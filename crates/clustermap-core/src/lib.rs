#![forbid(unsafe_code)]

//! Core: geometry, easing and animation progress, and logging shims.

pub mod animation;
pub mod geometry;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, trace};
