//! Chain-depth tracker.
//!
//! Holds, per physical tag, the length of the longest dependency chain ending
//! in that register, in latency units. The table is read at rename (for an
//! operation's sources) and written at completion (with the producer's own
//! priority). It is never rolled back on a flush: a stale value for a dead tag
//! is overwritten before the tag can be read again.
//!
//! A dependent renamed while its producer is still in flight reads the
//! producer's *previous* table value. That only perturbs ordering among ready
//! operations; readiness itself is governed solely by wakeup.

use crate::common::tag::{ChainDepth, PhysTag};

/// Per-tag saturating chain-depth table.
#[derive(Debug, Clone)]
pub struct ChainDepthTable {
    depth: Vec<ChainDepth>,
    max: ChainDepth,
}

impl ChainDepthTable {
    /// Creates a zeroed table of `phys_regs` entries saturating at `max`.
    pub fn new(phys_regs: usize, max: u16) -> Self {
        Self {
            depth: vec![ChainDepth::ZERO; phys_regs],
            max: ChainDepth(max),
        }
    }

    /// Saturation value.
    #[inline]
    pub const fn max(&self) -> ChainDepth {
        self.max
    }

    /// Current depth recorded for `tag`.
    #[inline]
    pub fn read(&self, tag: PhysTag) -> ChainDepth {
        self.depth[tag.idx()]
    }

    /// Priority of a newly renamed operation: the deepest present source plus
    /// the operation's own latency, saturated. Absent sources contribute 0.
    pub fn compute_priority(&self, srcs: &[Option<PhysTag>], latency: u16) -> ChainDepth {
        srcs.iter()
            .flatten()
            .map(|&t| self.read(t))
            .max()
            .unwrap_or(ChainDepth::ZERO)
            .saturating_add(latency, self.max)
    }

    /// Records the completed producer's depth for its destination. Tag 0 is never written.
    pub fn write(&mut self, tag: PhysTag, depth: ChainDepth) {
        if !tag.is_zero() {
            self.depth[tag.idx()] = depth.min(self.max);
        }
    }

    /// Iterates over `(tag, depth)` for every entry.
    pub fn iter(&self) -> impl Iterator<Item = (PhysTag, ChainDepth)> + '_ {
        self.depth
            .iter()
            .enumerate()
            .map(|(i, &d)| (PhysTag(i as u16), d))
    }
}
