//! State module for tracking fetch progress
//!
//! # Components
//!
//! - `WorkerState`: Tracks the lifecycle of a single page fetch worker

mod worker_state;

pub use worker_state::WorkerState;
