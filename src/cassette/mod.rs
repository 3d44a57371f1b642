//! YAML cassettes: recorded port interactions, replayed in tests.

pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;
