//! spz-cli library
//!
//! Command implementations behind the `spz` binary, usable from other tools
//! and tests.

pub mod config;
pub mod convert;
pub mod inspect;

pub use config::SpzConfig;
pub use convert::{WriteSummary, convert_file, reencode, repair_file};
pub use inspect::{ContainerInfo, dump_json, read_container};
