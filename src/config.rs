// ABOUTME: Version and REPL presentation constants

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_MESSAGE: &str = "Mage";
pub const GOODBYE_MESSAGE: &str = "Bye for now!";

/// History lives in the user's home directory, readable by group at most.
pub const HISTORY_FILE_NAME: &str = ".mage_history";
pub const HISTORY_FILE_MODE: u32 = 0o640;
