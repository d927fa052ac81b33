// LogCutter - platform/mod.rs
//
// Platform abstraction layer: configuration, file reading and the network
// seams (SSH/SFTP session, rsync transfer, credentials).
// Dependencies: util, core (for the RemoteFs trait and model types).
// Must NOT depend on: app.

pub mod config;
pub mod credentials;
pub mod fs;
pub mod rsync;
pub mod ssh;
