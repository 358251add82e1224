//! Infrastructure: host port traits, the system dice, settings, and the
//! in-memory host adapter used by the demo binary and the e2e tests.

pub mod app_settings;
pub mod dice;
pub mod memory;
pub mod ports;
