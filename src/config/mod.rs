//! Command-line parsing and validated runtime settings

pub mod cli;
pub mod settings;

pub use cli::CliArgs;
pub use settings::{MAX_REDIRECT_URL_LEN, Settings};
