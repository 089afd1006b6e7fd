pub mod api;
pub mod args;
pub mod clock;
pub mod commands;
mod config;
mod error;
pub mod export;
pub mod model;
pub mod report;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use error::{Error, ErrorType, Result};
