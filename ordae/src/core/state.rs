//! The record threaded through the five phases of one iteration.

use serde::{Deserialize, Serialize};

use crate::core::snapshot::Snapshot;
use crate::core::types::{ActionResult, Decision, Evaluation};

/// Loop state.
///
/// Each phase fills its own field. `iteration` is supplied by the caller and
/// never incremented here. An empty JSON object is a valid initial state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopState {
    pub iteration: u32,
    pub snapshot: Option<Snapshot>,
    pub decision: Option<Decision>,
    pub actions: Option<ActionResult>,
    pub evaluation: Option<Evaluation>,
}
