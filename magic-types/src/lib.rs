#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![deny(clippy::pedantic)]
#![deny(clippy::get_unwrap)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod file;

pub use error::{Error, Result};
pub use config::SessionConfig;
pub use file::FilePart;
