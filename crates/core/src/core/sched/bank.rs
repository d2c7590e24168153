//! Scheduler bank.
//!
//! A fixed-capacity, content-addressed store of renamed operations waiting to
//! issue. Each cycle a bank:
//! 1. **Allocates** a group of renamed operations into free slots (all or nothing).
//! 2. **Wakes up** sources whose tag matches a completion broadcast. Readiness is
//!    sticky: once set, a source stays ready until its entry leaves the bank.
//! 3. **Selects** up to its quota of fully-ready entries, highest chain depth
//!    first, ties to the lower slot index, by repeated find-max-and-mask.
//! 4. **Flushes** entries younger than a flush point.

use tracing::trace;

use crate::common::tag::{PhysTag, RobTag};
use crate::core::latches::RenamedOp;

/// A single scheduler bank.
#[derive(Debug, Clone)]
pub struct SchedulerBank {
    slots: Vec<Option<RenamedOp>>,
    issue_limit: usize,
    occupied: usize,
}

impl SchedulerBank {
    /// Creates an empty bank of `capacity` slots selecting at most `issue_limit` entries per cycle.
    pub fn new(capacity: usize, issue_limit: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            issue_limit,
            occupied: 0,
        }
    }

    /// Slot count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Occupied slots.
    #[inline]
    pub const fn len(&self) -> usize {
        self.occupied
    }

    /// Returns true if no slot is occupied.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Free slots.
    #[inline]
    pub fn num_free(&self) -> usize {
        self.slots.len() - self.occupied
    }

    /// Entry in `slot`, if occupied.
    pub fn get(&self, slot: usize) -> Option<&RenamedOp> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Iterates over `(slot, entry)` for occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &RenamedOp)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|op| (i, op)))
    }

    /// Places every operation of `ops` into the lowest free slots.
    ///
    /// Admits the group only if it fits entirely; returns the chosen slots, or
    /// `None` without changing anything.
    pub fn allocate(&mut self, ops: &[RenamedOp]) -> Option<Vec<usize>> {
        if ops.len() > self.num_free() {
            return None;
        }
        let mut placed = Vec::with_capacity(ops.len());
        let mut free = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i)
            .collect::<Vec<_>>()
            .into_iter();
        for op in ops {
            let slot = free.next()?;
            trace!(rob = %op.rob, slot, priority = %op.priority, "bank allocate");
            self.slots[slot] = Some(*op);
            placed.push(slot);
        }
        self.occupied += ops.len();
        Some(placed)
    }

    /// Marks every waiting source whose tag was broadcast as ready.
    ///
    /// Returns the number of sources woken.
    pub fn wakeup(&mut self, tags: &[PhysTag]) -> usize {
        if tags.is_empty() {
            return 0;
        }
        let mut woken = 0;
        for op in self.slots.iter_mut().flatten() {
            for src in op.srcs.iter_mut().flatten() {
                if !src.ready && tags.contains(&src.tag) {
                    src.ready = true;
                    woken += 1;
                }
            }
        }
        woken
    }

    /// Returns true if every valid source of `op` is ready.
    #[inline]
    pub fn is_ready(op: &RenamedOp) -> bool {
        op.srcs.iter().flatten().all(|s| s.ready)
    }

    /// Number of entries eligible for selection.
    pub fn num_ready(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|op| Self::is_ready(op))
            .count()
    }

    /// Picks up to the issue quota of ready entries and frees their slots.
    ///
    /// Each round takes the highest-priority ready entry not yet picked; equal
    /// priorities go to the lower slot index. Results are in pick order.
    pub fn select(&mut self) -> Vec<(usize, RenamedOp)> {
        let mut masked = vec![false; self.slots.len()];
        let mut picked = Vec::with_capacity(self.issue_limit);
        for _ in 0..self.issue_limit {
            let mut best: Option<(usize, &RenamedOp)> = None;
            for (slot, op) in self.iter() {
                if masked[slot] || !Self::is_ready(op) {
                    continue;
                }
                // Strictly greater keeps the lower slot on ties.
                if best.is_none_or(|(_, b)| op.priority > b.priority) {
                    best = Some((slot, op));
                }
            }
            let Some((slot, _)) = best else {
                break;
            };
            masked[slot] = true;
            picked.push(slot);
        }

        picked
            .into_iter()
            .filter_map(|slot| {
                let op = self.slots[slot].take()?;
                self.occupied -= 1;
                trace!(rob = %op.rob, slot, priority = %op.priority, "bank select");
                Some((slot, op))
            })
            .collect()
    }

    /// Invalidates every entry owned by an operation younger than `point`.
    ///
    /// Returns the number of entries removed.
    pub fn flush_younger(&mut self, point: RobTag) -> usize {
        let mut removed = 0;
        for slot in &mut self.slots {
            if slot.is_some_and(|op| op.rob.is_younger_than(point)) {
                *slot = None;
                removed += 1;
            }
        }
        self.occupied -= removed;
        removed
    }

    /// Empties the bank.
    pub fn flush_all(&mut self) -> usize {
        let removed = self.occupied;
        self.slots.fill(None);
        self.occupied = 0;
        removed
    }
}
