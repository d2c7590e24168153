//! Operation classes.

use serde::Deserialize;

/// Latency-bearing operation category.
///
/// The class selects the static latency used by the chain-depth priority
/// (see [`LatencyConfig::of`](crate::config::LatencyConfig::of)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpClass {
    /// Single-cycle integer arithmetic, logic and compare.
    #[default]
    Int,
    /// Integer multiply.
    Mul,
    /// Integer divide or remainder.
    Div,
    /// Memory load.
    Load,
    /// Memory store.
    Store,
    /// Conditional branch or jump.
    Branch,
    /// Floating add/subtract.
    FpAdd,
    /// Floating multiply.
    FpMul,
    /// Fused multiply-add.
    FpFma,
    /// Floating divide.
    FpDiv,
    /// Floating square root.
    FpSqrt,
}

impl OpClass {
    /// Execution unit class that normally services this operation.
    pub const fn default_unit(self) -> ExecUnit {
        match self {
            Self::Int => ExecUnit::Alu,
            Self::Mul | Self::Div => ExecUnit::MulDiv,
            Self::Load | Self::Store => ExecUnit::Lsu,
            Self::Branch => ExecUnit::Bru,
            Self::FpAdd | Self::FpMul | Self::FpFma | Self::FpDiv | Self::FpSqrt => ExecUnit::Fpu,
        }
    }
}

/// Execution unit class, carried as static scheduling metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecUnit {
    /// Integer ALU.
    #[default]
    Alu,
    /// Integer multiply/divide unit.
    MulDiv,
    /// Load/store unit.
    Lsu,
    /// Branch resolution unit.
    Bru,
    /// Floating-point unit.
    Fpu,
}
