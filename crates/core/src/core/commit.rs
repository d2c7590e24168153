//! Commit Stage: retire operations from the ROB head.
//!
//! This stage retires the oldest operations in program order:
//! 1. Returns each retiring operation's previous mapping to the free list.
//! 2. Advances the committed architectural map.
//! 3. Releases the RAT checkpoint a retiring branch held.
//! 4. Detects an exception at the head or the oldest unrecovered misprediction.

use tracing::{debug, trace};

use crate::core::latches::{CommittedOp, Redirect};
use crate::core::rename::RenameUnit;
use crate::core::rob::Rob;

/// Executes the Commit stage.
///
/// Retires up to `width` operations from the ROB head and returns them in
/// program order.
pub fn commit_stage(rob: &mut Rob, rename: &mut RenameUnit, width: usize) -> Vec<CommittedOp> {
    let retired = rob.commit(width);
    let mut out = Vec::with_capacity(retired.len());
    for entry in retired {
        let info = entry.info;
        if let Some(old) = info.old_dst {
            rename.free_list.reclaim(&[old]);
        }
        if let Some(dst) = info.dst {
            rename.commit_mapping(info.arch_dst, dst);
        }
        if let Some(id) = info.checkpoint {
            rename.rat.checkpoint_release(id);
        }
        trace!(rob = %entry.tag, pc = info.pc, dst = ?info.dst, "CM commit");
        out.push(CommittedOp {
            rob: entry.tag,
            pc: info.pc,
            arch_dst: info.arch_dst,
            dst: info.dst,
            old_dst: info.old_dst,
            value: entry.result,
        });
    }
    out
}

/// Finds the flush the ROB is waiting on, if any.
///
/// An exception at the head takes precedence over any misprediction, since
/// the exception flush discards every younger entry anyway.
pub fn detect_redirect(rob: &Rob) -> Option<Redirect> {
    if let Some((head, cause)) = rob.exception_at_head() {
        debug!(rob = %head.tag, pc = head.info.pc, %cause, "CM exception at head");
        return Some(Redirect::Exception {
            rob: head.tag,
            pc: head.info.pc,
            cause,
        });
    }
    let branch = rob.oldest_misprediction()?;
    let target = branch.branch.map_or(branch.info.pc, |b| b.target);
    debug!(rob = %branch.tag, pc = branch.info.pc, target, "CM mispredict");
    Some(Redirect::Mispredict {
        rob: branch.tag,
        pc: branch.info.pc,
        target,
    })
}
