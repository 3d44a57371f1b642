//! Live adapters talking to the real world.

pub mod channel;
pub mod filesystem;
pub mod tracker;
