//! ORDAE loop orchestrator: Observe, Remember, Decide, Act, Evaluate.
//!
//! Each `ordae run` executes exactly one iteration against the workspace and
//! appends its outcome to a bounded memory ledger. The architecture enforces
//! a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (gap derivation, decision,
//!   persona synthesis, evaluation). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (filesystem, persona store,
//!   knowledge base, ledger). Isolated behind traits to enable fakes in tests.
//!
//! Orchestration modules ([`cycle`], [`act`], [`progress`]) coordinate core
//! logic with I/O to implement CLI commands.

pub mod act;
pub mod core;
pub mod cycle;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod progress;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
