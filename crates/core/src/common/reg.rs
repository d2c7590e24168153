//! Physical Register File.
//!
//! The register file is an external collaborator of the scheduling core. This
//! module provides:
//! 1. **Interface:** The `RegisterFile` trait the core reads source operands through
//!    at issue and writes results through at writeback.
//! 2. **Reference Storage:** `PhysRegFile`, a flat array with tag 0 hardwired to zero.
//!
//! A write and a read of the same tag within one cycle must return the new
//! value to the read (same-cycle bypass).

use super::tag::PhysTag;

/// Register file as seen by the core.
pub trait RegisterFile {
    /// Reads the value held by `tag`. Tag 0 always reads zero.
    fn read(&self, tag: PhysTag) -> u64;

    /// Writes `val` to `tag`. Writes to tag 0 are ignored.
    fn write(&mut self, tag: PhysTag, val: u64);
}

/// Flat physical register storage.
///
/// Writes land immediately, so a read issued after a write in the same cycle
/// observes the written value, which is exactly the bypass the core relies on.
#[derive(Debug, Clone)]
pub struct PhysRegFile {
    regs: Vec<u64>,
}

impl PhysRegFile {
    /// Creates a register file of `size` tags, all zero.
    pub fn new(size: usize) -> Self {
        Self {
            regs: vec![0; size],
        }
    }

    /// Number of physical registers.
    pub fn len(&self) -> usize {
        self.regs.len()
    }

    /// Returns true if the file has no registers.
    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }
}

impl RegisterFile for PhysRegFile {
    #[inline]
    fn read(&self, tag: PhysTag) -> u64 {
        if tag.is_zero() {
            0
        } else {
            self.regs[tag.idx()]
        }
    }

    #[inline]
    fn write(&mut self, tag: PhysTag, val: u64) {
        if !tag.is_zero() {
            self.regs[tag.idx()] = val;
        }
    }
}
