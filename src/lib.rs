pub mod aggregate;
pub mod analyze;
pub mod cli;
pub mod config;
pub mod discover;
pub mod error;
pub mod extract;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod parsers;
pub mod position;
pub mod report;
pub mod syntax;
pub mod verify;
