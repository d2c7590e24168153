//! Identifier newtypes.
//!
//! Every index that crosses a component boundary gets its own type so a
//! physical tag can never be confused with an architectural id or a ROB slot.

use std::fmt;

/// Physical register tag. Tag 0 is hardwired to the zero value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PhysTag(pub u16);

impl PhysTag {
    /// The hardwired zero register.
    pub const ZERO: Self = Self(0);

    /// Returns the tag as a table index.
    #[inline]
    pub const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Returns true for the hardwired zero tag.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PhysTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Architectural register identifier. Id 0 reads as zero and is never renamed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ArchReg(pub u8);

impl ArchReg {
    /// The architectural zero register.
    pub const ZERO: Self = Self(0);

    /// Returns the id as a table index.
    #[inline]
    pub const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Returns true for the zero register.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ArchReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Identifies an in-flight operation in the reorder buffer.
///
/// `index` is the circular slot the entry occupies. `seq` is a monotonically
/// increasing allocation number; comparing `seq` gives program order without
/// any wrap-around ambiguity, and a tag whose `seq` no longer matches its slot
/// names an entry that has been flushed or committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct RobTag {
    /// Circular slot index.
    pub index: usize,
    /// Allocation sequence number.
    pub seq: u64,
}

impl RobTag {
    /// Returns true if `self` was allocated after `other`.
    #[inline]
    pub const fn is_younger_than(self, other: Self) -> bool {
        self.seq > other.seq
    }
}

impl fmt::Display for RobTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rob[{}]#{}", self.index, self.seq)
    }
}

/// Critical-path length in latency units.
///
/// Arithmetic on depths saturates at a caller-supplied maximum instead of
/// wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChainDepth(pub u16);

impl ChainDepth {
    /// Depth of a value with no producer in flight.
    pub const ZERO: Self = Self(0);

    /// Adds `latency`, clamping the result to `max`.
    #[inline]
    pub fn saturating_add(self, latency: u16, max: Self) -> Self {
        Self(self.0.saturating_add(latency).min(max.0))
    }
}

impl fmt::Display for ChainDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
