//! Writeback Stage: record completions and broadcast results.
//!
//! Completions are drained oldest-arrival first, at most one per wakeup port
//! per step; the rest wait in the backlog. For each accepted completion this
//! stage:
//! 1. Drops it if its ROB entry has been flushed.
//! 2. Writes the result to the register file and the producer's depth to the chain-depth table.
//! 3. Marks the ROB entry completed (or faulted).
//! 4. Broadcasts the destination tag to the busy table and every bank.

use std::collections::VecDeque;

use tracing::{trace, warn};

use crate::common::reg::RegisterFile;
use crate::common::tag::PhysTag;
use crate::core::latches::Completion;
use crate::core::rename::RenameUnit;
use crate::core::rob::Rob;
use crate::core::sched::SchedulerCluster;

/// What writeback did this step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WritebackReport {
    /// Tags broadcast on the wakeup network.
    pub broadcast: Vec<PhysTag>,
    /// Completions discarded as stale.
    pub stale: usize,
}

/// Executes the Writeback stage.
pub fn writeback_stage<R: RegisterFile + ?Sized>(
    backlog: &mut VecDeque<Completion>,
    ports: usize,
    rob: &mut Rob,
    rename: &mut RenameUnit,
    sched: &mut SchedulerCluster,
    rf: &mut R,
) -> WritebackReport {
    let mut report = WritebackReport::default();
    let mut used = 0;
    while used < ports {
        let Some(c) = backlog.pop_front() else {
            break;
        };
        // The ROB's record of the destination is authoritative.
        let Some(dst) = rob.entry(c.rob).map(|e| e.info.dst) else {
            warn!(rob = %c.rob, "WB stale completion dropped");
            report.stale += 1;
            continue;
        };
        used += 1;
        let _ = rob.complete(c.rob, c.value, c.exception, c.branch);
        if let Some(dst) = dst {
            rf.write(dst, c.value);
            rename.depth.write(dst, c.depth);
            report.broadcast.push(dst);
        }
        trace!(rob = %c.rob, dst = ?dst, value = c.value, "WB complete");
    }

    if !report.broadcast.is_empty() {
        rename.busy.wakeup(&report.broadcast);
        let _ = sched.wakeup(&report.broadcast);
    }
    report
}
