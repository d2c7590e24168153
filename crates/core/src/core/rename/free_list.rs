//! Physical register free list.
//!
//! A bitmap over the physical pool. Tags below the architectural register
//! count are reserved for the identity mapping restored on an exception flush:
//! they are never handed out and never accepted back.

use tracing::trace;

use crate::common::tag::PhysTag;

/// Free physical tags.
#[derive(Debug, Clone)]
pub struct FreeList {
    free: Vec<bool>,
    reserved: usize,
    count: usize,
}

impl FreeList {
    /// Creates a pool of `phys_regs` tags with every tag at or above `arch_regs` free.
    pub fn new(phys_regs: usize, arch_regs: usize) -> Self {
        let mut fl = Self {
            free: vec![false; phys_regs],
            reserved: arch_regs,
            count: 0,
        };
        fl.reset();
        fl
    }

    /// Number of free tags.
    #[inline]
    pub const fn num_free(&self) -> usize {
        self.count
    }

    /// Pool size.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.free.len()
    }

    /// Number of tags reserved for the identity mapping.
    #[inline]
    pub const fn reserved(&self) -> usize {
        self.reserved
    }

    /// Returns true if `tag` is currently free.
    #[inline]
    pub fn is_free(&self, tag: PhysTag) -> bool {
        self.free[tag.idx()]
    }

    /// Iterates over the free tags in ascending order.
    pub fn iter_free(&self) -> impl Iterator<Item = PhysTag> + '_ {
        self.free
            .iter()
            .enumerate()
            .filter(|(_, f)| **f)
            .map(|(i, _)| PhysTag(i as u16))
    }

    /// Serves `n` requests lowest-index-first.
    ///
    /// Every successful request receives a distinct tag. Once the pool runs dry
    /// the remaining requests report `None`; the caller stalls and retries them.
    pub fn allocate(&mut self, n: usize) -> Vec<Option<PhysTag>> {
        let mut out = Vec::with_capacity(n);
        let mut cursor = self.reserved;
        for _ in 0..n {
            while cursor < self.free.len() && !self.free[cursor] {
                cursor += 1;
            }
            if cursor == self.free.len() {
                out.push(None);
                continue;
            }
            self.free[cursor] = false;
            self.count -= 1;
            let tag = PhysTag(cursor as u16);
            trace!(%tag, "free list allocate");
            out.push(Some(tag));
        }
        out
    }

    /// Returns tags to the pool. Reserved tags are ignored.
    pub fn reclaim(&mut self, tags: &[PhysTag]) {
        for &tag in tags {
            if tag.idx() < self.reserved {
                continue;
            }
            debug_assert!(!self.free[tag.idx()], "double reclaim of {tag}");
            if !self.free[tag.idx()] {
                self.free[tag.idx()] = true;
                self.count += 1;
                trace!(%tag, "free list reclaim");
            }
        }
    }

    /// Whole-pool reset: every non-reserved tag becomes free.
    ///
    /// All speculative allocations since the last committed state are
    /// discarded at once rather than rolled back selectively.
    pub fn reset(&mut self) {
        for (i, f) in self.free.iter_mut().enumerate() {
            *f = i >= self.reserved;
        }
        self.count = self.free.len() - self.reserved;
    }

    /// Rebuilds the pool as every non-reserved tag not named by `in_use`.
    pub fn rebuild(&mut self, in_use: impl IntoIterator<Item = PhysTag>) {
        self.reset();
        for tag in in_use {
            if tag.idx() >= self.reserved && self.free[tag.idx()] {
                self.free[tag.idx()] = false;
                self.count -= 1;
            }
        }
    }
}
