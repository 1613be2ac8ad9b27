pub mod config;
pub mod location;
pub mod ranking;
pub mod server;
