//! Display implementations and wrapper types.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! wrapper types format the same data for a particular context, such as a
//! step tree outline or the trace of a walk. All output is markdown, ready
//! for the CLI's terminal renderer.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │    Wrappers     │    │    Markdown     │
//! │ (Step, Result)  │───▶│ (Outline, Trace)│───▶│     Output      │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! - [`collections`]: [`StepOutline`] and [`Trace`]
//! - [`status`]: [`ProgressLine`]
//! - [`results`]: reports of walk and next-step operations
//! - [`datetime`]: timestamp and duration formatting
//! - [`models`]: Display for steps, results and navigation values

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;


pub use collections::{StepOutline, Trace};
pub use datetime::{Elapsed, LocalDateTime};
pub use status::ProgressLine;
