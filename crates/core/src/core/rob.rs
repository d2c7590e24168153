//! Reorder Buffer (ROB) for precise, in-order commit.
//!
//! The ROB is a circular buffer that records every in-flight operation in
//! program order from rename until commit. It provides:
//! 1. **Allocation:** Whole-batch admission, assigning each operation the next circular slot.
//! 2. **Completion:** Out-of-order outcome reports, filtered against stale tags.
//! 3. **In-order Commit:** Retires a contiguous prefix starting at the head.
//! 4. **Fault Detection:** Exceptions at the head and the oldest mispredicted branch.
//! 5. **Flush:** Discards every entry younger than a flush point.
//!
//! The ROB is the only owner of committed-versus-speculative state: nothing
//! else may declare an operation retired or release its old mapping.

use tracing::{debug, trace};

use crate::common::error::ExceptionCause;
use crate::common::tag::{ArchReg, PhysTag, RobTag};
use crate::core::latches::BranchOutcome;
use crate::core::rename::rat::CheckpointId;
use crate::isa::{BranchPrediction, OpClass};

/// Lifecycle state of an ROB entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RobState {
    /// Allocated, outcome not yet reported.
    #[default]
    Issued,
    /// Outcome reported without exception.
    Completed,
    /// Outcome reported with an exception; surfaces when the entry reaches the head.
    Faulted,
}

/// Rename-time information recorded for a new entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RobAlloc {
    /// Program counter.
    pub pc: u64,
    /// Operation class.
    pub class: OpClass,
    /// Architectural destination (`x0` for none).
    pub arch_dst: ArchReg,
    /// Physical destination.
    pub dst: Option<PhysTag>,
    /// Mapping replaced by `dst`; reclaimed when this entry commits.
    pub old_dst: Option<PhysTag>,
    /// Front-end prediction, forwarded for comparison.
    pub prediction: Option<BranchPrediction>,
    /// RAT checkpoint taken after this operation renamed.
    pub checkpoint: Option<CheckpointId>,
}

/// A single entry in the Reorder Buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RobEntry {
    /// Tag naming this entry.
    pub tag: RobTag,
    /// Occupied.
    pub valid: bool,
    /// Current lifecycle state.
    pub state: RobState,
    /// Rename-time record.
    pub info: RobAlloc,
    /// Result value.
    pub result: u64,
    /// Exception reported by the execution unit.
    pub exception: Option<ExceptionCause>,
    /// Branch resolution reported by the execution unit.
    pub branch: Option<BranchOutcome>,
    /// A misprediction on this entry has already been recovered.
    pub recovered: bool,
}

impl RobEntry {
    /// Completed, mispredicted, and not yet recovered.
    #[inline]
    pub fn needs_recovery(&self) -> bool {
        self.valid
            && self.state == RobState::Completed
            && !self.recovered
            && self.branch.is_some_and(|b| b.mispredicted)
    }

    /// May retire this cycle, provided every older entry does.
    #[inline]
    fn committable(&self) -> bool {
        self.valid && self.state == RobState::Completed && !self.needs_recovery()
    }
}

/// Reorder Buffer: circular buffer for in-order commit.
#[derive(Debug, Clone)]
pub struct Rob {
    entries: Vec<RobEntry>,
    /// Index of the oldest entry (commit point).
    head: usize,
    /// Index where the next entry will be allocated.
    tail: usize,
    /// Number of valid entries.
    count: usize,
    /// Minimum free slots required before any batch is admitted.
    reserve: usize,
    /// Next allocation sequence number.
    next_seq: u64,
}

impl Rob {
    /// Creates a ROB with `capacity` slots that admits a batch only while at
    /// least `reserve` slots (one full allocation batch) remain free.
    pub fn new(capacity: usize, reserve: usize) -> Self {
        Self {
            entries: vec![RobEntry::default(); capacity],
            head: 0,
            tail: 0,
            count: 0,
            reserve,
            next_seq: 1,
        }
    }

    /// Returns the ROB capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of occupied entries.
    #[inline]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the ROB is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of free slots.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.entries.len() - self.count
    }

    /// Head slot index.
    #[inline]
    pub const fn head(&self) -> usize {
        self.head
    }

    #[inline]
    fn next(&self, idx: usize) -> usize {
        if idx + 1 == self.entries.len() { 0 } else { idx + 1 }
    }

    /// Returns true if a batch of `n` operations would be admitted.
    #[inline]
    pub fn can_allocate(&self, n: usize) -> bool {
        let free = self.free_slots();
        free >= n && free >= self.reserve.min(self.entries.len())
    }

    /// Admits a whole batch or nothing.
    ///
    /// Returns the tags assigned in batch order, or `None` (a stall) if the
    /// batch does not fit.
    pub fn allocate(&mut self, batch: &[RobAlloc]) -> Option<Vec<RobTag>> {
        if !self.can_allocate(batch.len()) {
            debug!(requested = batch.len(), free = self.free_slots(), "ROB stall");
            return None;
        }
        let mut tags = Vec::with_capacity(batch.len());
        for info in batch {
            let tag = RobTag {
                index: self.tail,
                seq: self.next_seq,
            };
            self.next_seq += 1;
            self.entries[self.tail] = RobEntry {
                tag,
                valid: true,
                info: *info,
                ..RobEntry::default()
            };
            trace!(%tag, pc = info.pc, "ROB allocate");
            self.tail = self.next(self.tail);
            self.count += 1;
            tags.push(tag);
        }
        Some(tags)
    }

    /// Returns true if `tag` names a live entry.
    #[inline]
    pub fn is_live(&self, tag: RobTag) -> bool {
        self.entries
            .get(tag.index)
            .is_some_and(|e| e.valid && e.tag == tag)
    }

    /// Looks up a live entry.
    pub fn entry(&self, tag: RobTag) -> Option<&RobEntry> {
        self.entries
            .get(tag.index)
            .filter(|e| e.valid && e.tag == tag)
    }

    /// Fills in the mapping chosen for a freshly allocated entry.
    pub fn record_rename(
        &mut self,
        tag: RobTag,
        dst: Option<PhysTag>,
        old_dst: Option<PhysTag>,
        checkpoint: Option<CheckpointId>,
    ) {
        if self.is_live(tag) {
            let info = &mut self.entries[tag.index].info;
            info.dst = dst;
            info.old_dst = old_dst;
            info.checkpoint = checkpoint;
        }
    }

    /// Records an operation's outcome. Completions may arrive in any order.
    ///
    /// Returns false (and changes nothing) if `tag` is no longer live.
    pub fn complete(
        &mut self,
        tag: RobTag,
        result: u64,
        exception: Option<ExceptionCause>,
        branch: Option<BranchOutcome>,
    ) -> bool {
        if !self.is_live(tag) {
            return false;
        }
        let e = &mut self.entries[tag.index];
        e.result = result;
        e.exception = exception;
        e.branch = branch;
        e.state = if exception.is_some() {
            RobState::Faulted
        } else {
            RobState::Completed
        };
        true
    }

    /// Returns the head entry, if any.
    pub fn peek_head(&self) -> Option<&RobEntry> {
        if self.count == 0 {
            None
        } else {
            Some(&self.entries[self.head])
        }
    }

    /// Retires up to `max` entries from the head.
    ///
    /// Commit is a prefix operation: it stops at the first entry that is
    /// incomplete, faulted, or an unrecovered misprediction, and never skips
    /// ahead of it.
    pub fn commit(&mut self, max: usize) -> Vec<RobEntry> {
        let mut out = Vec::new();
        while out.len() < max && self.count > 0 {
            let head = &mut self.entries[self.head];
            if !head.committable() {
                break;
            }
            head.valid = false;
            trace!(tag = %head.tag, pc = head.info.pc, "ROB commit");
            out.push(*head);
            self.head = self.next(self.head);
            self.count -= 1;
        }
        out
    }

    /// Returns the head entry if it completed with an exception.
    pub fn exception_at_head(&self) -> Option<(&RobEntry, ExceptionCause)> {
        let head = self.peek_head()?;
        if head.state == RobState::Faulted {
            head.exception.map(|cause| (head, cause))
        } else {
            None
        }
    }

    /// Finds the oldest completed, unrecovered mispredicted entry.
    ///
    /// Younger mispredicted entries are consequences of this one and are
    /// discarded by its flush.
    pub fn oldest_misprediction(&self) -> Option<&RobEntry> {
        self.iter().find(|e| e.needs_recovery())
    }

    /// Marks a mispredicted entry as recovered so it may commit.
    pub fn mark_recovered(&mut self, tag: RobTag) {
        if self.is_live(tag) {
            self.entries[tag.index].recovered = true;
        }
    }

    /// Discards every entry allocated after `tag`; `tag` itself is kept.
    ///
    /// If `tag` is no longer live, every remaining entry younger than it is
    /// discarded. Returns the removed entries, oldest first.
    pub fn flush_after(&mut self, tag: RobTag) -> Vec<RobEntry> {
        let mut keep = 0;
        let mut idx = self.head;
        for _ in 0..self.count {
            if self.entries[idx].tag.is_younger_than(tag) {
                break;
            }
            keep += 1;
            idx = self.next(idx);
        }

        let mut removed = Vec::with_capacity(self.count - keep);
        let new_tail = idx;
        for _ in keep..self.count {
            self.entries[idx].valid = false;
            removed.push(self.entries[idx]);
            idx = self.next(idx);
        }
        self.tail = new_tail;
        self.count = keep;
        if !removed.is_empty() {
            debug!(point = %tag, squashed = removed.len(), "ROB flush");
        }
        removed
    }

    /// Removes the head without committing it (the faulting operation of an
    /// exception flush).
    pub fn retire_faulted_head(&mut self) -> Option<RobEntry> {
        if self.count == 0 {
            return None;
        }
        let head = &mut self.entries[self.head];
        head.valid = false;
        let out = *head;
        self.head = self.next(self.head);
        self.count -= 1;
        Some(out)
    }

    /// Iterates over occupied slots from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &RobEntry> + '_ {
        let cap = self.entries.len();
        (0..self.count).map(move |i| &self.entries[(self.head + i) % cap])
    }

    /// Number of valid entries found by walking head to tail.
    pub(crate) fn count_live(&self) -> usize {
        self.iter().filter(|e| e.valid).count()
    }

    /// Number of valid entries anywhere in the array.
    pub(crate) fn count_valid_slots(&self) -> usize {
        self.entries.iter().filter(|e| e.valid).count()
    }
}
