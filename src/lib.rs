mod cli;
mod commands;
pub mod corpus;
pub mod directory;
pub mod error;
pub mod fetch;
pub mod prompt;
pub mod registry;
pub mod report;
pub mod settings;
pub mod slack;
pub mod survey;
pub mod tally;

pub use cli::{Cli, Commands};
pub use commands::run_survey;
pub use error::{AppError, Result};
