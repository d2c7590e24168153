//! Register Alias Table.
//!
//! Maps each architectural register to its current physical tag and keeps a
//! small pool of whole-table checkpoints for branch recovery:
//! 1. **Lookup:** Combinational read; `x0` is hardwired to tag 0.
//! 2. **Update:** Writes applied in batch order, so a later write to the
//!    same register wins and observes the earlier one as its old mapping.
//! 3. **Checkpoints:** Full-table snapshots keyed by an 8-bit slot id; slots
//!    beyond the id space are never handed out.
//! 4. **Reset:** Identity mapping (`xi -> pi`) after an exception flush.

use tracing::debug;

use crate::common::tag::{ArchReg, PhysTag};

/// Identifies a RAT checkpoint slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CheckpointId(pub u8);

/// Register alias table with checkpoint slots.
#[derive(Debug, Clone)]
pub struct Rat {
    map: Vec<PhysTag>,
    slots: Vec<Option<Vec<PhysTag>>>,
    in_use: Vec<bool>,
}

impl Rat {
    /// Creates an identity-mapped table with `checkpoints` snapshot slots.
    pub fn new(arch_regs: usize, checkpoints: usize) -> Self {
        Self {
            map: (0..arch_regs).map(|i| PhysTag(i as u16)).collect(),
            slots: vec![None; checkpoints],
            in_use: vec![false; checkpoints],
        }
    }

    /// Current physical tag of `arch`.
    #[inline]
    pub fn lookup(&self, arch: ArchReg) -> PhysTag {
        if arch.is_zero() {
            PhysTag::ZERO
        } else {
            self.map[arch.idx()]
        }
    }

    /// Points `arch` at `tag` and returns the mapping it replaced.
    ///
    /// Writes to `x0` are dropped and report tag 0.
    pub fn update(&mut self, arch: ArchReg, tag: PhysTag) -> PhysTag {
        if arch.is_zero() {
            return PhysTag::ZERO;
        }
        std::mem::replace(&mut self.map[arch.idx()], tag)
    }

    /// Iterates over every mapped tag, `x0` included.
    pub fn mapped(&self) -> impl Iterator<Item = PhysTag> + '_ {
        self.map.iter().copied()
    }

    /// Overwrites the live table with `map`.
    pub fn restore_map(&mut self, map: &[PhysTag]) {
        self.map.copy_from_slice(map);
    }

    /// Resets to the identity mapping.
    pub fn reset_identity(&mut self) {
        for (i, t) in self.map.iter_mut().enumerate() {
            *t = PhysTag(i as u16);
        }
    }

    /// Number of unclaimed checkpoint slots.
    pub fn free_checkpoints(&self) -> usize {
        self.in_use.iter().filter(|u| !**u).count()
    }

    /// Claims the lowest free checkpoint slot.
    pub fn checkpoint_allocate(&mut self) -> Option<CheckpointId> {
        let idx = self.in_use.iter().position(|u| !*u)?;
        let id = u8::try_from(idx).ok()?;
        self.in_use[idx] = true;
        Some(CheckpointId(id))
    }

    /// Copies the live table into slot `id`.
    pub fn checkpoint_create(&mut self, id: CheckpointId) {
        debug!(slot = id.0, "RAT checkpoint");
        self.slots[id.0 as usize] = Some(self.map.clone());
    }

    /// Overwrites the live table with slot `id`. Returns false if the slot is empty.
    pub fn checkpoint_restore(&mut self, id: CheckpointId) -> bool {
        match &self.slots[id.0 as usize] {
            Some(saved) => {
                debug!(slot = id.0, "RAT restore");
                self.map.copy_from_slice(saved);
                true
            }
            None => false,
        }
    }

    /// Returns slot `id` to the pool.
    pub fn checkpoint_release(&mut self, id: CheckpointId) {
        self.in_use[id.0 as usize] = false;
        self.slots[id.0 as usize] = None;
    }

    /// Returns every slot to the pool.
    pub fn release_all_checkpoints(&mut self) {
        self.in_use.fill(false);
        self.slots.fill(None);
    }
}
