mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod extract;
pub mod model;
mod utils;

pub use api::{Mode, Sheet, TEST_MODE_ENV};
pub use config::Config;
pub use error::Error;
pub use error::NotFound;
pub use error::Result;
