//! Inter-stage records.
//!
//! This module defines what flows between the core's stages and its collaborators:
//! 1. **Rename -> Scheduler:** `RenamedOp`, a fully renamed operation with its priority.
//! 2. **Scheduler -> Execution units:** `IssuedOp`, carrying resolved source values.
//! 3. **Execution units -> Writeback:** `Completion`, the outcome of one operation.
//! 4. **Commit -> Host:** `CommittedOp` and `Redirect`.

use crate::common::error::ExceptionCause;
use crate::common::tag::{ArchReg, ChainDepth, PhysTag, RobTag};
use crate::isa::{ExecUnit, OpClass};

/// A renamed source operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SrcOperand {
    /// Physical tag the value will arrive in.
    pub tag: PhysTag,
    /// Value already available.
    pub ready: bool,
}

/// An operation after rename, ready for bank allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenamedOp {
    /// Owning ROB entry.
    pub rob: RobTag,
    /// Program counter.
    pub pc: u64,
    /// Operation class.
    pub class: OpClass,
    /// Execution unit class.
    pub unit: ExecUnit,
    /// Renamed sources; `None` for unused slots.
    pub srcs: [Option<SrcOperand>; 3],
    /// Allocated destination, if the operation writes a register.
    pub dst: Option<PhysTag>,
    /// Immediate.
    pub imm: i16,
    /// Reads memory.
    pub is_load: bool,
    /// Writes memory.
    pub is_store: bool,
    /// Control transfer.
    pub is_branch: bool,
    /// Chain-depth issue priority.
    pub priority: ChainDepth,
}

/// An operation selected for execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IssuedOp {
    /// Owning ROB entry.
    pub rob: RobTag,
    /// Program counter.
    pub pc: u64,
    /// Operation class.
    pub class: OpClass,
    /// Execution unit class.
    pub unit: ExecUnit,
    /// Source tags.
    pub srcs: [Option<PhysTag>; 3],
    /// Source values read from the register file at issue (0 for unused slots).
    pub src_vals: [u64; 3],
    /// Destination tag.
    pub dst: Option<PhysTag>,
    /// Immediate.
    pub imm: i16,
    /// Reads memory.
    pub is_load: bool,
    /// Writes memory.
    pub is_store: bool,
    /// Control transfer.
    pub is_branch: bool,
    /// Priority the operation was selected with.
    pub priority: ChainDepth,
    /// Bank it issued from.
    pub bank: usize,
}

/// Resolved branch outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BranchOutcome {
    /// Actual direction.
    pub taken: bool,
    /// Actual next program counter.
    pub target: u64,
    /// Prediction disagreed with the outcome.
    pub mispredicted: bool,
}

/// Result of one executed operation, returned by an execution unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Completion {
    /// Owning ROB entry.
    pub rob: RobTag,
    /// Destination to write and broadcast.
    pub dst: Option<PhysTag>,
    /// The producer's own priority, written to the chain-depth table.
    pub depth: ChainDepth,
    /// Result value.
    pub value: u64,
    /// Exception raised, if any.
    pub exception: Option<ExceptionCause>,
    /// Branch resolution, for control transfers.
    pub branch: Option<BranchOutcome>,
}

impl Completion {
    /// A successful completion of `op` producing `value`.
    pub const fn of(op: &IssuedOp, value: u64) -> Self {
        Self {
            rob: op.rob,
            dst: op.dst,
            depth: op.priority,
            value,
            exception: None,
            branch: None,
        }
    }

    /// Attaches an exception.
    #[must_use]
    pub const fn with_exception(mut self, cause: ExceptionCause) -> Self {
        self.exception = Some(cause);
        self
    }

    /// Attaches a branch resolution.
    #[must_use]
    pub const fn with_branch(mut self, taken: bool, target: u64, mispredicted: bool) -> Self {
        self.branch = Some(BranchOutcome {
            taken,
            target,
            mispredicted,
        });
        self
    }
}

/// A retired operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommittedOp {
    /// ROB entry it occupied.
    pub rob: RobTag,
    /// Program counter.
    pub pc: u64,
    /// Architectural destination (`x0` for none).
    pub arch_dst: ArchReg,
    /// Physical destination.
    pub dst: Option<PhysTag>,
    /// Mapping the destination replaced, now reclaimed.
    pub old_dst: Option<PhysTag>,
    /// Result value.
    pub value: u64,
}

/// Control-flow correction the front end must act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Redirect {
    /// Oldest mispredicted branch; fetch resumes at `target`.
    Mispredict {
        /// The branch.
        rob: RobTag,
        /// Branch program counter.
        pc: u64,
        /// Corrected next program counter.
        target: u64,
    },
    /// Exception at the ROB head; fetch resumes at an externally supplied handler.
    Exception {
        /// The faulting operation.
        rob: RobTag,
        /// Faulting program counter.
        pc: u64,
        /// Reported cause.
        cause: ExceptionCause,
    },
}

impl Redirect {
    /// ROB entry that triggered the redirect.
    pub const fn rob(&self) -> RobTag {
        match *self {
            Self::Mispredict { rob, .. } | Self::Exception { rob, .. } => rob,
        }
    }
}

/// Why rename accepted fewer operations than offered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StallReason {
    /// Not enough ROB space for the batch.
    RobFull,
    /// The free list ran out of physical tags.
    FreeListEmpty,
    /// The target bank lacked room for its group.
    BankFull,
    /// More operations were offered than the rename width.
    Width,
}
