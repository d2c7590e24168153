//! Scheduler cluster: the set of banks behind the rename stage.
//!
//! A wide rename batch is cut into fixed-size groups and the groups are dealt
//! round-robin across the banks. Each bank selects independently within its own
//! quota and the issue lists are concatenated in bank order; the quotas sum to
//! at most the global issue width, so no cross-bank arbitration is needed.

/// Single bank: allocation, wakeup, selection, flush.
pub mod bank;

pub use bank::SchedulerBank;

use crate::common::tag::{PhysTag, RobTag};
use crate::config::SchedulerConfig;
use crate::core::latches::RenamedOp;

/// All scheduler banks plus the round-robin steering pointer.
#[derive(Debug, Clone)]
pub struct SchedulerCluster {
    banks: Vec<SchedulerBank>,
    group_size: usize,
    next_bank: usize,
}

impl SchedulerCluster {
    /// Builds the banks described by `cfg`.
    pub fn new(cfg: &SchedulerConfig) -> Self {
        Self {
            banks: (0..cfg.banks)
                .map(|_| SchedulerBank::new(cfg.bank_capacity, cfg.issue_per_bank))
                .collect(),
            group_size: cfg.group_size,
            next_bank: 0,
        }
    }

    /// The banks, in steering order.
    pub fn banks(&self) -> &[SchedulerBank] {
        &self.banks
    }

    /// Total occupied entries.
    pub fn len(&self) -> usize {
        self.banks.iter().map(SchedulerBank::len).sum()
    }

    /// Returns true if every bank is empty.
    pub fn is_empty(&self) -> bool {
        self.banks.iter().all(SchedulerBank::is_empty)
    }

    /// Bank that group `g` of the next batch would be steered to.
    #[inline]
    fn bank_for_group(&self, g: usize) -> usize {
        (self.next_bank + g) % self.banks.len()
    }

    /// Longest prefix of an `n`-operation batch whose groups all fit.
    ///
    /// Groups are admitted whole: the prefix ends at the first group whose
    /// bank lacks room for it.
    pub fn admissible(&self, n: usize) -> usize {
        let mut need = vec![0usize; self.banks.len()];
        let mut admitted = 0;
        for (g, start) in (0..n).step_by(self.group_size).enumerate() {
            let len = self.group_size.min(n - start);
            let b = self.bank_for_group(g);
            if need[b] + len > self.banks[b].num_free() {
                break;
            }
            need[b] += len;
            admitted += len;
        }
        admitted
    }

    /// Steers `ops` to the banks group by group.
    ///
    /// The caller must have sized `ops` with [`admissible`](Self::admissible);
    /// returns false if a group was nevertheless rejected, in which case that
    /// group and every later one were not placed.
    pub fn allocate(&mut self, ops: &[RenamedOp]) -> bool {
        let mut groups = 0;
        for (g, group) in ops.chunks(self.group_size).enumerate() {
            let b = self.bank_for_group(g);
            if self.banks[b].allocate(group).is_none() {
                self.next_bank = (self.next_bank + groups) % self.banks.len();
                return false;
            }
            groups += 1;
        }
        self.next_bank = (self.next_bank + groups) % self.banks.len();
        true
    }

    /// Broadcasts completion tags to every bank. Returns sources woken.
    pub fn wakeup(&mut self, tags: &[PhysTag]) -> usize {
        self.banks.iter_mut().map(|b| b.wakeup(tags)).sum()
    }

    /// Runs selection in every bank and concatenates the results.
    pub fn select(&mut self) -> Vec<(usize, RenamedOp)> {
        let mut out = Vec::new();
        for (i, bank) in self.banks.iter_mut().enumerate() {
            out.extend(bank.select().into_iter().map(|(_, op)| (i, op)));
        }
        out
    }

    /// Removes entries younger than `point` from every bank.
    pub fn flush_younger(&mut self, point: RobTag) -> usize {
        self.banks.iter_mut().map(|b| b.flush_younger(point)).sum()
    }

    /// Empties every bank.
    pub fn flush_all(&mut self) -> usize {
        self.banks.iter_mut().map(SchedulerBank::flush_all).sum()
    }
}
