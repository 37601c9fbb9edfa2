//! I/O helpers for the loop phases.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod init;
pub mod knowledge;
pub mod ledger;
pub mod loop_state;
pub mod mission_file;
pub mod observe;
pub mod paths;
pub mod rest_store;
pub mod store;
