//! Rename: physical allocation, alias mapping and chain-depth priority.
//!
//! This module owns the per-tag and per-register state written at rename and
//! provides the rename stage itself:
//! 1. **Free List:** Physical tag allocation and reclaim.
//! 2. **RAT:** Speculative architectural-to-physical map with checkpoints.
//! 3. **Chain Depth:** Per-tag critical-path lengths feeding issue priority.
//! 4. **Busy Table:** Whether a tag's producer is still in flight.
//! 5. **Committed Map:** The architectural map as of the last commit.
//!
//! Source lookups for a batch all observe the table as it stood before the
//! batch; an operation that reads a register written earlier in the same
//! batch is instead wired directly to that producer's new tag.

/// Physical register busy bits.
pub mod busy;

/// Per-tag chain-depth table.
pub mod chain_depth;

/// Physical tag free list.
pub mod free_list;

/// Register alias table with checkpoints.
pub mod rat;

use tracing::{debug, trace};

use crate::common::tag::{ArchReg, PhysTag};
use crate::config::{Config, LatencyConfig};
use crate::core::latches::{RenamedOp, SrcOperand, StallReason};
use crate::core::rob::{Rob, RobAlloc};
use crate::core::sched::SchedulerCluster;
use crate::isa::DecodedOp;

use busy::BusyTable;
use chain_depth::ChainDepthTable;
use free_list::FreeList;
use rat::Rat;

/// State owned by the rename stage.
#[derive(Debug, Clone)]
pub struct RenameUnit {
    /// Physical tag free list.
    pub free_list: FreeList,
    /// Speculative alias table.
    pub rat: Rat,
    /// Chain-depth table.
    pub depth: ChainDepthTable,
    /// Busy bits.
    pub busy: BusyTable,
    /// Architectural map as of the last committed operation.
    committed: Vec<PhysTag>,
    width: usize,
    use_checkpoints: bool,
}

impl RenameUnit {
    /// Builds the rename state for `config`, identity mapped with every non-reserved tag free.
    pub fn new(config: &Config) -> Self {
        let r = &config.rename;
        Self {
            free_list: FreeList::new(r.phys_regs, r.arch_regs),
            rat: Rat::new(r.arch_regs, r.checkpoints),
            depth: ChainDepthTable::new(r.phys_regs, r.max_chain_depth),
            busy: BusyTable::new(r.phys_regs),
            committed: (0..r.arch_regs).map(|i| PhysTag(i as u16)).collect(),
            width: r.width,
            use_checkpoints: config.recovery.use_checkpoints && r.checkpoints > 0,
        }
    }

    /// Committed mapping of `arch`.
    #[inline]
    pub fn committed(&self, arch: ArchReg) -> PhysTag {
        self.committed[arch.idx()]
    }

    /// The whole committed map, indexed by architectural id.
    pub fn committed_map(&self) -> &[PhysTag] {
        &self.committed
    }

    /// Records a retirement into the committed map.
    pub fn commit_mapping(&mut self, arch: ArchReg, tag: PhysTag) {
        if !arch.is_zero() {
            self.committed[arch.idx()] = tag;
        }
    }

    /// Resets the speculative and committed maps to identity and frees the whole pool.
    pub fn reset_identity(&mut self) {
        self.rat.reset_identity();
        self.rat.release_all_checkpoints();
        for (i, t) in self.committed.iter_mut().enumerate() {
            *t = PhysTag(i as u16);
        }
        self.free_list.reset();
        self.busy.clear();
    }

    /// Rebuilds the RAT from the committed map plus every entry still in the ROB.
    pub fn rebuild_rat(&mut self, rob: &Rob) {
        self.rat.restore_map(&self.committed);
        for e in rob.iter() {
            if let Some(dst) = e.info.dst {
                let _ = self.rat.update(e.info.arch_dst, dst);
            }
        }
    }

    /// Longest prefix of `ops` whose destinations the free list can cover.
    fn free_list_prefix(&self, ops: &[DecodedOp]) -> usize {
        let mut avail = self.free_list.num_free();
        for (i, op) in ops.iter().enumerate() {
            if op.writes_reg() {
                if avail == 0 {
                    return i;
                }
                avail -= 1;
            }
        }
        ops.len()
    }
}

/// How much of an offered batch rename took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameOutcome {
    /// Operations renamed and allocated, from the front of the batch.
    pub accepted: usize,
    /// First resource that cut the batch short.
    pub stall: Option<StallReason>,
}

/// Executes the rename stage on `ops`.
///
/// Preconditions (width, free tags, bank room, ROB room) are checked for the
/// whole batch before anything is written, so the accepted prefix is applied
/// in full and the rest is left untouched for the caller to offer again.
///
/// Every RAT lookup for the batch reads the pre-batch mapping. A source
/// written by an older operation in the same batch is then wired to that
/// producer's new tag so it waits for the right wakeup, but its readiness
/// starts cleared and its depth read sees the tag's pre-batch table value.
///
/// # Panics
///
/// If an accepted operation names an architectural register at or above
/// `rename.arch_regs`.
pub fn rename_stage(
    unit: &mut RenameUnit,
    rob: &mut Rob,
    sched: &mut SchedulerCluster,
    latency: &LatencyConfig,
    ops: &[DecodedOp],
) -> RenameOutcome {
    let mut stall = None;
    let mut limit = |n: usize, cap: usize, why: StallReason| {
        if cap < n {
            let _ = stall.get_or_insert(why);
            cap
        } else {
            n
        }
    };

    let n = limit(ops.len(), unit.width, StallReason::Width);
    let n = limit(n, unit.free_list_prefix(&ops[..n]), StallReason::FreeListEmpty);
    let n = limit(n, sched.admissible(n), StallReason::BankFull);

    let batch = &ops[..n];
    let arch_regs = unit.committed.len();
    for op in batch {
        assert!(
            op.dst.idx() < arch_regs && op.srcs.iter().flatten().all(|r| r.idx() < arch_regs),
            "operation at pc {:#x} names a register outside x0..x{}",
            op.pc,
            arch_regs - 1
        );
    }
    let allocs: Vec<RobAlloc> = batch
        .iter()
        .map(|op| RobAlloc {
            pc: op.pc,
            class: op.class,
            arch_dst: op.dst,
            prediction: op.prediction,
            ..RobAlloc::default()
        })
        .collect();
    let Some(rob_tags) = (if n == 0 { Some(Vec::new()) } else { rob.allocate(&allocs) }) else {
        debug!(offered = ops.len(), "rename stall: ROB full");
        return RenameOutcome {
            accepted: 0,
            stall: Some(StallReason::RobFull),
        };
    };
    if n < ops.len() {
        debug!(offered = ops.len(), accepted = n, reason = ?stall, "rename stall");
    }

    // Destinations, lowest free tags first.
    let want = batch.iter().filter(|op| op.writes_reg()).count();
    let mut fresh = unit.free_list.allocate(want).into_iter().flatten();
    let dsts: Vec<Option<PhysTag>> = batch
        .iter()
        .map(|op| if op.writes_reg() { fresh.next() } else { None })
        .collect();

    // Sources: pre-batch RAT, overridden by the youngest older producer in the batch.
    let mut renamed = Vec::with_capacity(n);
    for (i, op) in batch.iter().enumerate() {
        let mut srcs = [None; 3];
        for (slot, arch) in op.srcs.iter().enumerate() {
            let Some(arch) = *arch else { continue };
            let local = batch[..i]
                .iter()
                .zip(&dsts[..i])
                .rev()
                .find(|(p, _)| p.writes_reg() && p.dst == arch)
                .and_then(|(_, d)| *d);
            srcs[slot] = Some(match local {
                Some(tag) => SrcOperand { tag, ready: false },
                None => {
                    let tag = unit.rat.lookup(arch);
                    SrcOperand {
                        tag,
                        ready: unit.busy.is_ready(tag),
                    }
                }
            });
        }
        let src_tags = srcs.map(|s| s.map(|s: SrcOperand| s.tag));
        let priority = unit.depth.compute_priority(&src_tags, latency.of(op.class));

        renamed.push(RenamedOp {
            rob: rob_tags[i],
            pc: op.pc,
            class: op.class,
            unit: op.unit,
            srcs,
            dst: dsts[i],
            imm: op.imm,
            is_load: op.is_load,
            is_store: op.is_store,
            is_branch: op.is_branch,
            priority,
        });
    }

    // Map updates in batch order; a branch snapshots the table right after itself.
    for (i, op) in batch.iter().enumerate() {
        let mut old_dst = None;
        if let Some(dst) = dsts[i] {
            old_dst = Some(unit.rat.update(op.dst, dst));
            unit.busy.set_busy(dst);
        }
        let checkpoint = if op.is_branch && unit.use_checkpoints {
            let id = unit.rat.checkpoint_allocate();
            if let Some(id) = id {
                unit.rat.checkpoint_create(id);
            } else {
                debug!(pc = op.pc, "no free RAT checkpoint; branch will recover by rebuild");
            }
            id
        } else {
            None
        };
        rob.record_rename(rob_tags[i], dsts[i], old_dst, checkpoint);
        trace!(
            rob = %rob_tags[i],
            pc = op.pc,
            dst = ?dsts[i],
            old = ?old_dst,
            priority = %renamed[i].priority,
            "rename"
        );
    }

    let placed = sched.allocate(&renamed);
    debug_assert!(placed, "bank admission changed between check and allocate");

    RenameOutcome { accepted: n, stall }
}
