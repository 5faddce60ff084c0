//! State engine for interactive Gantt timelines.
//!
//! [`GanttEngine`] turns a forest of task records into positioned bars, time
//! axis buckets and scroll metrics, and runs drag gestures through an
//! optimistic update that the host confirms or rejects asynchronously.

pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod model;
pub mod persist;
pub mod throttle;

pub use config::ChartConfig;
pub use engine::GanttEngine;
pub use error::{GanttError, Result};
pub use persist::{Resolution, UpdateDispatcher, UpdateHandler, UpdateOutcome, UpdateRequest};
