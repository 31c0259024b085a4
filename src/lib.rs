pub mod audio;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod handover;
pub mod logging;
pub mod models;
pub mod player;
pub mod registry;


pub use error::*;
pub use models::*;
