//! Issue Stage: select ready operations and read their operands.

use tracing::trace;

use crate::common::reg::RegisterFile;
use crate::core::latches::IssuedOp;
use crate::core::sched::SchedulerCluster;

/// Executes the Issue stage.
///
/// Selects from every bank and reads source values from `rf`. Values written
/// earlier in the same step are visible here.
pub fn issue_stage<R: RegisterFile + ?Sized>(
    sched: &mut SchedulerCluster,
    rf: &R,
) -> Vec<IssuedOp> {
    sched
        .select()
        .into_iter()
        .map(|(bank, op)| {
            let srcs = op.srcs.map(|s| s.map(|s| s.tag));
            let src_vals = srcs.map(|t| t.map_or(0, |t| rf.read(t)));
            trace!(rob = %op.rob, pc = op.pc, bank, priority = %op.priority, "IS issue");
            IssuedOp {
                rob: op.rob,
                pc: op.pc,
                class: op.class,
                unit: op.unit,
                srcs,
                src_vals,
                dst: op.dst,
                imm: op.imm,
                is_load: op.is_load,
                is_store: op.is_store,
                is_branch: op.is_branch,
                priority: op.priority,
                bank,
            }
        })
        .collect()
}
