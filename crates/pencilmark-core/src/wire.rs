//! Payloads exchanged with a solving engine.
//!
//! Everything here is serialized in the engine's camelCase convention. The
//! `constraints` payload is produced by
//! [`constraints_to_engine`](crate::field_names::constraints_to_engine).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Cell, Grid};

/// Which solving strategy the engine should use.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "camelCase")]
pub enum SolverType {
    /// Human-style deductions; produces a step trace.
    #[default]
    #[display("logical")]
    Logical,
    /// Exhaustive search; produces a solution grid.
    #[display("brute")]
    Brute,
}

/// Identifier correlating a request with its reply.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
#[display("#{_0}")]
pub struct RequestId(pub u64);

/// The grid wrapper sent with check calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPayload {
    /// Live grid values.
    pub values: Grid,
}

/// The operation requested from the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum EngineCall {
    /// Solve the puzzle from its givens.
    #[serde(rename_all = "camelCase")]
    Solve {
        /// Constraints in engine naming.
        constraints: Value,
        /// Strategy to use.
        solver_type: SolverType,
    },
    /// Check a partially filled grid against the puzzle.
    #[serde(rename_all = "camelCase")]
    Check {
        /// Constraints in engine naming.
        constraints: Value,
        /// Grid to check.
        grid: GridPayload,
    },
}

/// A request sent to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRequest {
    /// Correlation id echoed in the reply.
    pub id: RequestId,
    /// Requested operation.
    pub call: EngineCall,
}

/// A single deduction in a logical solving trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveStep {
    /// Name of the technique that produced the placement.
    pub technique: String,
    /// Cell that was filled.
    pub cell: Cell,
    /// Value placed.
    pub value: u8,
}

/// Result of a logical solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveTrace {
    /// Deductions in the order they were made.
    pub steps: Vec<SolveStep>,
    /// The completed grid, if the deductions reached one.
    pub solution: Option<Grid>,
}

/// Result of a check call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckVerdict {
    /// The grid breaks no rule.
    pub consistent: bool,
    /// The grid can still be completed.
    pub solvable: bool,
}

/// The engine's answer to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "data")]
pub enum EngineOutcome {
    /// A complete solution grid.
    Solution(Grid),
    /// A logical solving trace.
    Trace(SolveTrace),
    /// A check verdict.
    Verdict(CheckVerdict),
    /// The engine could not process the request.
    Failed(String),
}

/// A reply from the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineReply {
    /// Id of the request being answered.
    pub id: RequestId,
    /// Outcome of the request.
    pub outcome: EngineOutcome,
}

/// A solving engine reachable through message passing.
///
/// Implementations run on a background worker, never on the interactive thread.
pub trait SolvingEngine: Send {
    /// Handles one request and produces exactly one reply with the same id.
    fn handle(&self, request: EngineRequest) -> EngineReply;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_check_request_wraps_grid_as_values() {
        let request = EngineRequest {
            id: RequestId(7),
            call: EngineCall::Check {
                constraints: json!({"size": 2}),
                grid: GridPayload {
                    values: Grid::new(2),
                },
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "call": {
                    "type": "check",
                    "constraints": {"size": 2},
                    "grid": {"values": [[0, 0], [0, 0]]}
                }
            })
        );
    }

    #[test]
    fn test_solve_request_uses_engine_naming() {
        let call = EngineCall::Solve {
            constraints: json!({}),
            solver_type: SolverType::Brute,
        };
        let value = serde_json::to_value(&call).unwrap();
        assert_eq!(value["solverType"], json!("brute"));
    }

    #[test]
    fn test_reply_round_trip() {
        let reply = EngineReply {
            id: RequestId(1),
            outcome: EngineOutcome::Verdict(CheckVerdict {
                consistent: true,
                solvable: false,
            }),
        };
        let text = serde_json::to_string(&reply).unwrap();
        let back: EngineReply = serde_json::from_str(&text).unwrap();
        assert_eq!(back, reply);
    }
}
