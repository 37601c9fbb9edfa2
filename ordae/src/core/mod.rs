//! Deterministic, pure logic shared by the loop phases.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod catalog;
pub mod decide;
pub mod evaluate;
pub mod gaps;
pub mod mission;
pub mod persona;
pub mod snapshot;
pub mod state;
pub mod types;
