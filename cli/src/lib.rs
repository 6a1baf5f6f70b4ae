pub mod commands;
pub mod logging;
pub mod prompt;
