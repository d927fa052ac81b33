// LogCutter - app/mod.rs
//
// Application layer: request validation, local and remote run
// orchestration, staging lifecycle and background execution.
// Dependencies: core, platform, util.

pub mod job;
pub mod local;
pub mod request;
pub mod runner;
pub mod staging;
