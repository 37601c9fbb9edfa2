//! Stable exit codes for ordae CLI commands.

/// Command succeeded; for `ordae run`, the iteration passed evaluation.
pub const OK: i32 = 0;
/// Invalid configuration, objectives, catalog, or any other error.
pub const INVALID: i32 = 1;
/// `ordae run` completed the iteration but evaluation failed.
pub const FAILED: i32 = 2;
