//! Built-in plugins

mod checkin;
mod logging;
mod shell_validator;

pub use checkin::{CheckIn, CheckinPlugin};
pub use logging::LoggingPlugin;
pub use shell_validator::ShellValidator;
