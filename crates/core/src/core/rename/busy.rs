//! Physical register busy table.
//!
//! One bit per physical tag: set when the tag is allocated as a destination,
//! cleared when its producer's completion is broadcast. Rename reads it to
//! decide whether a source starts ready. Tag 0 is never busy.

use crate::common::tag::PhysTag;

/// Per-tag pending-producer bits.
#[derive(Debug, Clone)]
pub struct BusyTable {
    busy: Vec<bool>,
}

impl BusyTable {
    /// Creates a table with every tag ready.
    pub fn new(phys_regs: usize) -> Self {
        Self {
            busy: vec![false; phys_regs],
        }
    }

    /// Returns true if `tag` has no producer in flight.
    #[inline]
    pub fn is_ready(&self, tag: PhysTag) -> bool {
        !self.busy[tag.idx()]
    }

    /// Marks `tag` as awaiting a producer.
    #[inline]
    pub fn set_busy(&mut self, tag: PhysTag) {
        if !tag.is_zero() {
            self.busy[tag.idx()] = true;
        }
    }

    /// Clears the busy bit of every broadcast tag.
    pub fn wakeup(&mut self, tags: &[PhysTag]) {
        for &t in tags {
            self.busy[t.idx()] = false;
        }
    }

    /// Marks every tag ready.
    pub fn clear(&mut self) {
        self.busy.fill(false);
    }
}
