//! # Named Scenarios
//!
//! The four reference behaviours of the core, each as its own test:
//!   A. Wakeup order decides which operations become selectable first.
//!   B. Chain depth accumulates producer latency.
//!   C. Commit stops at the first incomplete entry.
//!   D. Only the oldest misprediction triggers a flush.

use oosched_core::common::{ChainDepth, PhysTag};
use oosched_core::core::latches::{BranchOutcome, Redirect};
use oosched_core::core::rename::chain_depth::ChainDepthTable;
use oosched_core::core::rob::{Rob, RobAlloc};
use oosched_core::core::sched::SchedulerBank;
use pretty_assertions::assert_eq;

use crate::common::builder::op::{alu, branch, li, load, pc, renamed};
use crate::common::harness::{TestContext, interpret};

// ══════════════════════════════════════════════════════════
// A. Wakeup bursts
// ══════════════════════════════════════════════════════════

#[test]
fn scenario_a_early_sources_select_first() {
    let mut bank = SchedulerBank::new(64, 4);
    // The late pair carries the higher priority; readiness still wins.
    let _ = bank
        .allocate(&[
            renamed(1, 1, &[(40, false)]),
            renamed(2, 1, &[(41, false)]),
            renamed(3, 9, &[(42, false)]),
            renamed(4, 9, &[(43, false)]),
        ])
        .unwrap();

    // Cycle 1: first burst.
    let _ = bank.wakeup(&[PhysTag(40), PhysTag(41)]);
    let first: Vec<u64> = bank.select().iter().map(|(_, o)| o.rob.seq).collect();
    assert_eq!(first, vec![1, 2]);

    // Cycle 2: nothing broadcast, nothing ready.
    let _ = bank.wakeup(&[]);
    assert!(bank.select().is_empty());

    // Cycle 3: second burst.
    let _ = bank.wakeup(&[PhysTag(42), PhysTag(43)]);
    let second: Vec<u64> = bank.select().iter().map(|(_, o)| o.rob.seq).collect();
    assert_eq!(second, vec![3, 4]);
    assert!(bank.is_empty());
}

// ══════════════════════════════════════════════════════════
// B. Chain depth through a load
// ══════════════════════════════════════════════════════════

#[test]
fn scenario_b_depth_table_accumulates_latency() {
    let mut table = ChainDepthTable::new(64, 255);
    let load_tag = PhysTag(40);
    let load_depth = table.compute_priority(&[], 4);
    assert_eq!(load_depth, ChainDepth(4));
    table.write(load_tag, load_depth);
    assert_eq!(table.compute_priority(&[Some(load_tag)], 1), ChainDepth(5));
}

#[test]
fn scenario_b_dependent_of_load_gets_depth_five() {
    let mut ctx = TestContext::new();
    let _ = ctx.step(&[load(0, 5, 1)]);
    ctx.idle(8);
    assert_eq!(ctx.committed.len(), 1);

    let _ = ctx.step(&[alu(1, 6, &[5], 1)]);
    let out = ctx.step(&[]);
    assert_eq!(out.issued.len(), 1);
    assert_eq!(out.issued[0].priority, ChainDepth(5));
}

#[test]
fn scenario_b_same_batch_dependent_reads_stale_depth() {
    let mut ctx = TestContext::new();
    let _ = ctx.step(&[load(0, 5, 1), alu(1, 6, &[5], 1)]);
    let out = ctx.step(&[]);
    assert_eq!(out.issued.len(), 1, "only the load is ready");
    assert_eq!(out.issued[0].priority, ChainDepth(4));

    // The dependent was prioritised before the load's depth was written.
    let bank_entry = ctx
        .core
        .scheduler()
        .banks()
        .iter()
        .flat_map(|b| b.iter().map(|(_, o)| *o))
        .next()
        .unwrap();
    assert_eq!(bank_entry.priority, ChainDepth(1));
}

// ══════════════════════════════════════════════════════════
// C. Prefix commit
// ══════════════════════════════════════════════════════════

#[test]
fn scenario_c_incomplete_entry_blocks_younger() {
    let mut rob = Rob::new(4, 4);
    let batch: Vec<RobAlloc> = (0..4)
        .map(|i| RobAlloc {
            pc: pc(i),
            ..RobAlloc::default()
        })
        .collect();
    let t = rob.allocate(&batch).unwrap();
    assert!(rob.complete(t[0], 10, None, None));
    assert!(rob.complete(t[1], 11, None, None));
    assert!(rob.complete(t[3], 13, None, None));

    let committed: Vec<u64> = rob.commit(4).iter().map(|e| e.info.pc).collect();
    assert_eq!(committed, vec![pc(0), pc(1)]);
    assert_eq!(rob.peek_head().map(|e| e.tag), Some(t[2]));

    assert!(rob.complete(t[2], 12, None, None));
    let rest: Vec<u64> = rob.commit(4).iter().map(|e| e.result).collect();
    assert_eq!(rest, vec![12, 13]);
}

// ══════════════════════════════════════════════════════════
// D. Oldest misprediction
// ══════════════════════════════════════════════════════════

#[test]
fn scenario_d_rob_reports_oldest_misprediction() {
    let mut rob = Rob::new(8, 1);
    let batch: Vec<RobAlloc> = (0..6)
        .map(|i| RobAlloc {
            pc: pc(i),
            ..RobAlloc::default()
        })
        .collect();
    let t = rob.allocate(&batch).unwrap();
    let wrong = Some(BranchOutcome {
        taken: true,
        target: 0x9000,
        mispredicted: true,
    });
    for (i, tag) in t.iter().enumerate() {
        let outcome = if i == 2 || i == 4 { wrong } else { None };
        assert!(rob.complete(*tag, 0, None, outcome));
    }

    let oldest = rob.oldest_misprediction().map(|e| e.tag);
    assert_eq!(oldest, Some(t[2]));
    let squashed = rob.flush_after(t[2]);
    assert_eq!(squashed.len(), 3);
    assert!(!rob.is_live(t[4]), "younger misprediction discarded with the flush");
}

#[test]
fn scenario_d_core_flushes_once_for_oldest() {
    let prog = vec![
        li(0, 1, 3),
        li(1, 2, 4),
        branch(2, &[1]),
        alu(3, 3, &[1, 2], 0),
        branch(4, &[2]),
        alu(5, 4, &[3], 1),
    ];
    let mut ctx = TestContext::new();
    ctx.exec.mispredict_at(pc(2), 0x9000);
    ctx.exec.mispredict_at(pc(4), 0xA000);
    ctx.run(&prog, 100);

    let redirect_pcs: Vec<u64> = ctx
        .redirects
        .iter()
        .map(|r| match *r {
            Redirect::Mispredict { pc, .. } | Redirect::Exception { pc, .. } => pc,
        })
        .collect();
    assert_eq!(redirect_pcs, vec![pc(2)]);
    assert_eq!(ctx.core.stats.mispredict_flushes, 1);

    let expect = interpret(&prog, 32);
    for r in 1..5 {
        assert_eq!(ctx.arch_value(r), expect[r as usize], "x{r}");
    }
    let pcs: Vec<u64> = ctx.committed.iter().map(|c| c.pc).collect();
    assert_eq!(pcs, (0..6).map(pc).collect::<Vec<_>>());
}
