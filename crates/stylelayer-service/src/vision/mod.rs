//! Vision generation API integration.
//!
//! The vision service runs image extractions asynchronously: a submit call
//! returns a task id, and results are polled until the task reports done.

pub mod client;
pub mod types;

pub use client::{VisionClient, VisionError};
pub use types::{GenerationResult, PollOutcome};
