//! Out-of-order scheduling core.
//!
//! This module contains the rename, scheduling and retirement machinery and
//! the orchestrator that advances it one step at a time. It provides:
//! 1. **Components:** Free list, RAT, chain-depth and busy tables, scheduler banks, ROB.
//! 2. **Stages:** Commit, issue, writeback and rename as free functions over those components.
//! 3. **Orchestration:** `Core::step`, including misprediction and exception recovery.
//! 4. **Checking:** `Core::check_invariants` for the test suite and the `check-invariants` feature.

/// Commit stage and flush detection.
pub mod commit;

/// Invariant checker.
mod invariants;

/// Issue stage.
pub mod issue;

/// Inter-stage records (renamed, issued, completed and committed operations).
pub mod latches;

/// Free list, RAT, chain-depth and busy tables, and the rename stage.
pub mod rename;

/// Reorder buffer.
pub mod rob;

/// Scheduler banks and the cluster that steers groups across them.
pub mod sched;

/// Writeback stage.
pub mod writeback;

use std::collections::VecDeque;

use tracing::{debug, info_span};

use crate::common::error::{ConfigError, InvariantViolation};
use crate::common::reg::RegisterFile;
use crate::common::tag::{PhysTag, RobTag};
use crate::config::Config;
use crate::isa::DecodedOp;
use crate::stats::CoreStats;

use self::latches::{CommittedOp, Completion, IssuedOp, Redirect, StallReason};
use self::rename::RenameUnit;
use self::rob::Rob;
use self::sched::SchedulerCluster;

/// Everything one step produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    /// Operations accepted from the front of the offered batch.
    pub accepted: usize,
    /// Why the rest of the batch was refused.
    pub stall: Option<StallReason>,
    /// Operations sent to the execution units.
    pub issued: Vec<IssuedOp>,
    /// Operations retired, oldest first.
    pub committed: Vec<CommittedOp>,
    /// Flush detected this step; applied at the start of the next.
    pub redirect: Option<Redirect>,
    /// ROB entries discarded by the flush applied at the start of this step.
    pub squashed: usize,
}

/// The scheduling core: rename, banks and ROB advanced in lockstep.
#[derive(Debug, Clone)]
pub struct Core {
    config: Config,
    rename: RenameUnit,
    sched: SchedulerCluster,
    rob: Rob,
    backlog: VecDeque<Completion>,
    pending: Option<Redirect>,
    /// Accumulated counters.
    pub stats: CoreStats,
}

impl Core {
    /// Builds a core in its reset state: identity mapped, every non-reserved
    /// tag free, banks and ROB empty.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rename: RenameUnit::new(&config),
            sched: SchedulerCluster::new(&config.scheduler),
            rob: Rob::new(config.rob.capacity, config.rename.width),
            backlog: VecDeque::new(),
            pending: None,
            stats: CoreStats::default(),
            config,
        })
    }

    /// Configuration the core was built with.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Rename state (free list, RAT, chain-depth and busy tables).
    pub const fn rename(&self) -> &RenameUnit {
        &self.rename
    }

    /// Scheduler banks.
    pub const fn scheduler(&self) -> &SchedulerCluster {
        &self.sched
    }

    /// Reorder buffer.
    pub const fn rob(&self) -> &Rob {
        &self.rob
    }

    /// Flush that will be applied at the start of the next step.
    pub const fn pending_redirect(&self) -> Option<Redirect> {
        self.pending
    }

    /// Completions still waiting for a wakeup port.
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Nothing in flight and nothing pending.
    pub fn is_idle(&self) -> bool {
        self.rob.is_empty() && self.backlog.is_empty() && self.pending.is_none()
    }

    /// Advances the core by one step.
    ///
    /// `ops` is the decoded batch offered to rename; only the first
    /// `accepted` of them are consumed and the caller offers the rest again.
    /// `completions` are outcomes returned by the execution units since the
    /// last step. Results are written to and operands read from `rf`.
    ///
    /// # Panics
    ///
    /// If an accepted operation names an architectural register at or above
    /// `rename.arch_regs`; the decoder must only produce ids the core was
    /// configured for.
    pub fn step<R: RegisterFile + ?Sized>(
        &mut self,
        ops: &[DecodedOp],
        completions: &[Completion],
        rf: &mut R,
    ) -> StepOutput {
        self.stats.cycles += 1;
        let span = info_span!("step", cycle = self.stats.cycles);
        let _enter = span.enter();

        let mut out = StepOutput::default();

        // 1. Flush detected last step.
        if let Some(redirect) = self.pending.take() {
            out.squashed = self.apply_flush(redirect, rf);
        }

        // 2. Commit and detect.
        out.committed = commit::commit_stage(&mut self.rob, &mut self.rename, self.config.rob.commit_width);
        self.stats.committed += out.committed.len() as u64;
        self.pending = commit::detect_redirect(&self.rob);
        out.redirect = self.pending;

        // 3. Issue from last step's readiness.
        out.issued = issue::issue_stage(&mut self.sched, &*rf);
        self.stats.issued += out.issued.len() as u64;

        // 4. Writeback and wakeup.
        self.backlog.extend(completions.iter().copied());
        let wb = writeback::writeback_stage(
            &mut self.backlog,
            self.config.scheduler.wakeup_ports,
            &mut self.rob,
            &mut self.rename,
            &mut self.sched,
            rf,
        );
        self.stats.wakeups += wb.broadcast.len() as u64;
        self.stats.stale_dropped += wb.stale as u64;
        self.stats.backlogged += self.backlog.len() as u64;

        // 5. Rename and allocate.
        let renamed = rename::rename_stage(
            &mut self.rename,
            &mut self.rob,
            &mut self.sched,
            &self.config.latency,
            ops,
        );
        out.accepted = renamed.accepted;
        out.stall = renamed.stall;
        self.stats.renamed += renamed.accepted as u64;
        if let Some(reason) = renamed.stall {
            self.stats.record_stall(reason);
        }

        #[cfg(all(debug_assertions, feature = "check-invariants"))]
        {
            let checked = self.check_invariants();
            debug_assert!(checked.is_ok(), "invariant violated: {checked:?}");
        }

        out
    }

    /// Applies a flush and returns the number of ROB entries it discarded.
    fn apply_flush<R: RegisterFile + ?Sized>(&mut self, redirect: Redirect, rf: &mut R) -> usize {
        match redirect {
            Redirect::Exception { rob, pc, cause } => {
                let squashed = self.recover_exception(rob, rf);
                debug!(
                    point = %rob,
                    pc,
                    %cause,
                    code = cause.code(),
                    tval = ?cause.tval(),
                    squashed,
                    "exception flush"
                );
                squashed
            }
            Redirect::Mispredict { rob, pc, target } => {
                let squashed = self.recover_mispredict(rob);
                debug!(point = %rob, pc, target, squashed, "mispredict flush");
                squashed
            }
        }
    }

    /// Flush-to-head: discards the faulting head and everything behind it and
    /// returns the machine to its committed architectural state.
    fn recover_exception<R: RegisterFile + ?Sized>(&mut self, head: RobTag, rf: &mut R) -> usize {
        let mut squashed = self.rob.flush_after(head).len();
        if self.rob.retire_faulted_head().is_some() {
            squashed += 1;
        }
        let _ = self.sched.flush_all();
        self.backlog.clear();

        // Identity tags are never allocated, so no copy overwrites a later source.
        for arch in 1..self.config.rename.arch_regs {
            let from = self.rename.committed_map()[arch];
            let to = PhysTag(arch as u16);
            if from != to {
                rf.write(to, rf.read(from));
            }
        }
        self.rename.reset_identity();

        self.stats.exception_flushes += 1;
        self.stats.squashed += squashed as u64;
        squashed
    }

    /// Discards everything younger than `branch` and restores the RAT to the
    /// mapping as of the branch.
    fn recover_mispredict(&mut self, branch: RobTag) -> usize {
        let removed = self.rob.flush_after(branch);
        let _ = self.sched.flush_younger(branch);
        for e in &removed {
            if let Some(id) = e.info.checkpoint {
                self.rename.rat.checkpoint_release(id);
            }
        }

        let checkpoint = self.rob.entry(branch).and_then(|e| e.info.checkpoint);
        let restored = checkpoint.is_some_and(|id| self.rename.rat.checkpoint_restore(id));
        if restored {
            self.stats.checkpoint_restores += 1;
            debug!(%branch, "RAT restored from checkpoint");
        } else {
            self.rename.rebuild_rat(&self.rob);
            self.stats.rat_rebuilds += 1;
            debug!(%branch, "RAT rebuilt from committed map");
        }

        let in_use: Vec<PhysTag> = self
            .rename
            .rat
            .mapped()
            .chain(self.rob.iter().filter_map(|e| e.info.old_dst))
            .collect();
        self.rename.free_list.rebuild(in_use);
        self.rob.mark_recovered(branch);

        self.stats.mispredict_flushes += 1;
        self.stats.squashed += removed.len() as u64;
        removed.len()
    }

    /// Verifies the structural invariants across every component.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        invariants::check(&self.rename, &self.sched, &self.rob)
    }
}
