//! Decoded micro-operation.

use crate::common::tag::ArchReg;

use super::op_class::{ExecUnit, OpClass};

/// Front-end branch prediction, forwarded opaquely to the ROB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BranchPrediction {
    /// Predicted direction.
    pub taken: bool,
    /// Predicted target.
    pub target: u64,
}

/// One decoded operation as supplied by fetch/decode.
///
/// Sources are architectural ids with a validity flag (`None` means the slot
/// is unused). A destination of `x0` means the operation writes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodedOp {
    /// Program counter (identity of the operation).
    pub pc: u64,
    /// Operation class.
    pub class: OpClass,
    /// Execution unit class.
    pub unit: ExecUnit,
    /// Up to three architectural sources.
    pub srcs: [Option<ArchReg>; 3],
    /// Architectural destination; `x0` for none.
    pub dst: ArchReg,
    /// 16-bit immediate.
    pub imm: i16,
    /// Reads memory.
    pub is_load: bool,
    /// Writes memory.
    pub is_store: bool,
    /// Control transfer with a prediction to verify.
    pub is_branch: bool,
    /// Prediction made by fetch, if any.
    pub prediction: Option<BranchPrediction>,
}

impl DecodedOp {
    /// Creates an operation of `class` at `pc` with no operands.
    ///
    /// The unit and the load/store/branch flags follow from the class.
    pub const fn new(pc: u64, class: OpClass) -> Self {
        Self {
            pc,
            class,
            unit: class.default_unit(),
            srcs: [None; 3],
            dst: ArchReg::ZERO,
            imm: 0,
            is_load: matches!(class, OpClass::Load),
            is_store: matches!(class, OpClass::Store),
            is_branch: matches!(class, OpClass::Branch),
            prediction: None,
        }
    }

    /// Sets the destination register.
    #[must_use]
    pub const fn with_dst(mut self, dst: u8) -> Self {
        self.dst = ArchReg(dst);
        self
    }

    /// Sets source slot `slot` (0..3).
    #[must_use]
    pub const fn with_src(mut self, slot: usize, src: u8) -> Self {
        self.srcs[slot] = Some(ArchReg(src));
        self
    }

    /// Sets the immediate.
    #[must_use]
    pub const fn with_imm(mut self, imm: i16) -> Self {
        self.imm = imm;
        self
    }

    /// Attaches a front-end prediction.
    #[must_use]
    pub const fn with_prediction(mut self, taken: bool, target: u64) -> Self {
        self.prediction = Some(BranchPrediction { taken, target });
        self
    }

    /// Returns true if the operation writes a register.
    #[inline]
    pub const fn writes_reg(&self) -> bool {
        !self.dst.is_zero()
    }
}
