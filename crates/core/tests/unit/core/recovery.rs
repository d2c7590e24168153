//! Flush and Recovery Tests.
//!
//! Verifies:
//!   1. Misprediction: younger work discarded, RAT restored from a checkpoint or rebuilt
//!   2. Exception: flush-to-head, identity remap with committed values preserved
//!   3. Stale completions from flushed operations are dropped
//!   4. Flush atomicity: nothing younger than the flush point survives

use oosched_core::common::{ArchReg, ExceptionCause, PhysTag};
use oosched_core::core::latches::Redirect;
use oosched_core::isa::OpClass;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::builder::op::{alu, branch, li, op, pc};
use crate::common::harness::{TestContext, interpret, small_config};

// ══════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════

/// Steps with nothing new until a redirect is reported.
fn step_until_redirect(ctx: &mut TestContext, limit: usize) -> Redirect {
    for _ in 0..limit {
        if let Some(r) = ctx.step(&[]).redirect {
            return r;
        }
    }
    panic!("no redirect within {limit} steps");
}

fn mispredicting_program() -> Vec<oosched_core::isa::DecodedOp> {
    vec![
        li(0, 1, 5),
        alu(1, 2, &[1], 1),
        branch(2, &[2]),
        alu(3, 3, &[2], 1),
        alu(4, 1, &[3], 1),
        alu(5, 4, &[1, 2], 0),
    ]
}

// ══════════════════════════════════════════════════════════
// 1. Misprediction
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::checkpoint(true)]
#[case::rebuild(false)]
fn mispredict_restores_mapping_as_of_branch(#[case] use_checkpoints: bool) {
    let mut config = small_config();
    config.recovery.use_checkpoints = use_checkpoints;
    let mut ctx = TestContext::with_config(config);
    let prog = mispredicting_program();
    ctx.exec.mispredict_at(pc(2), 0x9000);

    let _ = ctx.step(&prog[..4]);
    let rat_at_branch = {
        let r = &ctx.core.rename().rat;
        (r.lookup(ArchReg(1)), r.lookup(ArchReg(2)), r.lookup(ArchReg(3)))
    };
    let _ = ctx.step(&prog[4..]);

    let redirect = step_until_redirect(&mut ctx, 10);
    assert!(matches!(redirect, Redirect::Mispredict { pc: p, target: 0x9000, .. } if p == pc(2)));

    let out = ctx.step(&[]);
    assert_eq!(out.squashed, 3);
    let r = &ctx.core.rename().rat;
    // x3 was written after the branch, so it reverts to its pre-batch mapping.
    assert_eq!(r.lookup(ArchReg(1)), rat_at_branch.0);
    assert_eq!(r.lookup(ArchReg(2)), rat_at_branch.1);
    assert_eq!(r.lookup(ArchReg(3)), PhysTag(3));
    assert_ne!(rat_at_branch.2, PhysTag(3));

    let stats = &ctx.core.stats;
    assert_eq!(stats.mispredict_flushes, 1);
    assert_eq!(stats.checkpoint_restores, u64::from(use_checkpoints));
    assert_eq!(stats.rat_rebuilds, u64::from(!use_checkpoints));
}

#[rstest]
#[case::checkpoint(true)]
#[case::rebuild(false)]
fn program_result_survives_misprediction(#[case] use_checkpoints: bool) {
    let mut config = small_config();
    config.recovery.use_checkpoints = use_checkpoints;
    let mut ctx = TestContext::with_config(config);
    let prog = mispredicting_program();
    ctx.exec.mispredict_at(pc(2), 0x9000);
    ctx.run(&prog, 200);

    let expect = interpret(&prog, 32);
    for reg in 1..=4 {
        assert_eq!(ctx.arch_value(reg), expect[reg as usize], "x{reg}");
    }
    let tags_in_use = 64 - 32 - ctx.core.rename().free_list.num_free();
    assert_eq!(tags_in_use, 4, "only the final mappings of x1..x4 stay allocated");
}

#[test]
fn branch_without_checkpoint_recovers_by_rebuild() {
    let mut config = small_config();
    config.rename.checkpoints = 1;
    let mut ctx = TestContext::with_config(config);
    let prog = vec![li(0, 1, 1), branch(1, &[1]), branch(2, &[1]), li(3, 2, 9)];
    ctx.exec.mispredict_at(pc(2), 0x9000);
    ctx.run(&prog, 100);
    assert_eq!(ctx.core.stats.rat_rebuilds, 1);
    assert_eq!(ctx.core.stats.checkpoint_restores, 0);
    assert_eq!(ctx.arch_value(2), 9);
}

#[test]
fn mispredicted_branch_blocks_commit_until_recovered() {
    let mut ctx = TestContext::small();
    ctx.exec.mispredict_at(pc(0), 0x9000);
    let _ = ctx.step(&[branch(0, &[1]), li(1, 2, 1)]);
    let _ = step_until_redirect(&mut ctx, 5);
    assert!(ctx.committed.is_empty());
    assert!(ctx.core.pending_redirect().is_some());

    let out = ctx.step(&[]);
    assert_eq!(out.committed.len(), 1);
    assert_eq!(out.committed[0].pc, pc(0));
    assert!(ctx.core.rob().is_empty());
}

// ══════════════════════════════════════════════════════════
// 2. Exception
// ══════════════════════════════════════════════════════════

#[test]
fn exception_flush_returns_to_committed_state() {
    let mut ctx = TestContext::small();
    let cause = ExceptionCause::LoadAccessFault(0xdead);
    ctx.exec.fault_at(pc(2), cause);
    let _ = ctx.step(&[li(0, 1, 7), li(1, 2, 8), op(2, OpClass::Load, 3, &[1], 0), alu(3, 4, &[3], 1)]);

    let redirect = step_until_redirect(&mut ctx, 10);
    assert_eq!(
        redirect,
        Redirect::Exception {
            rob: redirect.rob(),
            pc: pc(2),
            cause
        }
    );
    assert_eq!(ctx.committed.len(), 2);

    let out = ctx.step(&[]);
    assert_eq!(out.squashed, 2);
    assert!(out.committed.is_empty());
    assert!(ctx.core.rob().is_empty());
    assert!(ctx.core.scheduler().is_empty());
    assert_eq!(ctx.core.backlog_len(), 0);

    let rename = ctx.core.rename();
    for r in 0..32u8 {
        assert_eq!(rename.rat.lookup(ArchReg(r)), PhysTag(u16::from(r)));
        assert_eq!(rename.committed(ArchReg(r)), PhysTag(u16::from(r)));
        assert!(rename.busy.is_ready(PhysTag(u16::from(r))));
    }
    assert_eq!(rename.free_list.num_free(), 32);
    assert_eq!(rename.rat.free_checkpoints(), 2);

    // Committed values were copied into the identity tags.
    assert_eq!(ctx.arch_value(1), 7);
    assert_eq!(ctx.arch_value(2), 8);
    assert_eq!(ctx.arch_value(3), 0);
    assert_eq!(ctx.core.stats.exception_flushes, 1);
}

#[test]
fn exception_only_surfaces_at_head() {
    let mut ctx = TestContext::small();
    ctx.exec.fault_at(pc(1), ExceptionCause::IllegalInstruction(0));
    // The divide keeps the faulting op off the head for twelve steps.
    let _ = ctx.step(&[op(0, OpClass::Div, 1, &[2], 0), li(1, 3, 1)]);
    ctx.idle(8);
    assert!(ctx.redirects.is_empty());
    let _ = step_until_redirect(&mut ctx, 10);
    assert_eq!(ctx.committed.len(), 1);
}

#[test]
fn retried_operation_commits_after_exception() {
    let mut ctx = TestContext::small();
    let prog = vec![li(0, 1, 7), alu(1, 2, &[1], 1), alu(2, 3, &[2], 1), alu(3, 4, &[3, 1], 0)];
    ctx.exec.fault_at(pc(1), ExceptionCause::StorePageFault(0x40));
    ctx.run(&prog, 100);

    let pcs: Vec<u64> = ctx.committed.iter().map(|c| c.pc).collect();
    assert_eq!(pcs, (0..4).map(pc).collect::<Vec<_>>());
    let expect = interpret(&prog, 32);
    for reg in 1..=4 {
        assert_eq!(ctx.arch_value(reg), expect[reg as usize]);
    }
}

// ══════════════════════════════════════════════════════════
// 3. Stale completions and atomicity
// ══════════════════════════════════════════════════════════

#[test]
fn completion_of_flushed_operation_is_dropped() {
    let mut ctx = TestContext::small();
    ctx.exec.mispredict_at(pc(1), 0x9000);
    let _ = ctx.step(&[li(0, 1, 1), branch(1, &[1]), op(2, OpClass::Div, 2, &[1], 0)]);
    let _ = step_until_redirect(&mut ctx, 10);
    let _ = ctx.step(&[]);
    let div_tag = PhysTag(33);
    assert!(ctx.core.rename().free_list.is_free(div_tag));

    ctx.idle(15);
    assert_eq!(ctx.core.stats.stale_dropped, 1);
    assert_eq!(ctx.arch_value(2), 0);
    assert!(ctx.core.rename().free_list.is_free(div_tag));
}

#[test]
fn nothing_younger_than_flush_point_survives() {
    let mut ctx = TestContext::small();
    ctx.exec.mispredict_at(pc(2), 0x9000);
    let prog = [
        op(0, OpClass::Div, 5, &[6], 0),
        li(1, 1, 1),
        branch(2, &[1]),
        alu(3, 2, &[1], 0),
        op(4, OpClass::Div, 3, &[2], 0),
    ];
    let _ = ctx.step(&prog[..4]);
    let _ = ctx.step(&prog[4..]);
    let redirect = step_until_redirect(&mut ctx, 10);
    let survivors: Vec<_> = ctx
        .core
        .rob()
        .iter()
        .filter(|e| !e.tag.is_younger_than(redirect.rob()))
        .copied()
        .collect();

    let _ = ctx.step(&[]);
    assert!(ctx.core.rob().iter().all(|e| !e.tag.is_younger_than(redirect.rob())));
    assert!(ctx
        .core
        .scheduler()
        .banks()
        .iter()
        .all(|b| b.iter().all(|(_, o)| !o.rob.is_younger_than(redirect.rob()))));
    // The head divide blocks commit, so every older entry is still present and unchanged.
    let kept: Vec<_> = ctx.core.rob().iter().map(|e| (e.tag, e.info, e.result)).collect();
    let before: Vec<_> = survivors.iter().map(|e| (e.tag, e.info, e.result)).collect();
    assert_eq!(kept.len(), 3);
    assert_eq!(kept, before);
}
