//! Decoded-operation model.
//!
//! The core does not decode instructions. Fetch/decode is an external
//! collaborator that hands the core already-classified micro-operations; this
//! module defines that contract:
//! 1. **Operation classes:** Latency-bearing categories (`OpClass`).
//! 2. **Execution units:** The unit class an operation is steered to (`ExecUnit`).
//! 3. **Decoded operations:** Architectural operands, immediate, flags and prediction (`DecodedOp`).

/// Operation and execution-unit classes.
pub mod op_class;

/// Decoded micro-operation supplied by the front end.
pub mod uop;

pub use op_class::{ExecUnit, OpClass};
pub use uop::{BranchPrediction, DecodedOp};
