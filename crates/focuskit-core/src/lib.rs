//! focuskit-core: Battery orchestration, micro-test controllers and scoring.
//!
//! This crate defines the data model, the timer-driven test controllers, the
//! orchestrator that sequences them and the scoring that the rest of the
//! focuskit system builds on.

pub mod clock;
pub mod driver;
pub mod engine;
pub mod error;
pub mod microtests;
pub mod model;
pub mod report;
pub mod requestor;
pub mod scheduler;
pub mod scoring;
pub mod simulate;
pub mod speech;
pub mod traits;
