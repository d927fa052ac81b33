// LogCutter - core/mod.rs
//
// Core business logic layer: timestamp recognition, range location, cutting
// and the listing policies for local and remote inputs.
// Dependencies: util, chrono, regex, walkdir, glob.
// Must NOT depend on: platform, app. Remote access goes through the
// `inventory::RemoteFs` trait.

pub mod cutter;
pub mod discovery;
pub mod inventory;
pub mod locator;
pub mod model;
pub mod timestamp;
