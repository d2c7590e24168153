//! End-to-end Dataflow Tests.
//!
//! Programs are run to completion through `Core::step` and the committed
//! architectural state is compared with a sequential interpretation.

use oosched_core::isa::{DecodedOp, OpClass};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::builder::op::{alu, li, load, op, pc, renumber};
use crate::common::harness::{TestContext, interpret, small_config};

fn assert_matches_interpreter(ctx: &TestContext, prog: &[DecodedOp]) {
    let expect = interpret(prog, 32);
    let got: Vec<u64> = (0..32).map(|r| ctx.arch_value(r)).collect();
    assert_eq!(got, expect);
    let pcs: Vec<u64> = ctx.committed.iter().map(|c| c.pc).collect();
    assert_eq!(pcs, prog.iter().map(|o| o.pc).collect::<Vec<_>>());
}

#[test]
fn dependent_chain_computes_sequential_result() {
    let prog = vec![
        li(0, 1, 3),
        alu(1, 2, &[1], 4),
        alu(2, 3, &[1, 2], -1),
        alu(3, 1, &[3, 3, 2], 0),
        alu(4, 4, &[1, 0], 2),
    ];
    let mut ctx = TestContext::new();
    ctx.run(&prog, 100);
    assert_matches_interpreter(&ctx, &prog);
}

#[test]
fn wide_independent_batch_commits_in_order() {
    let prog: Vec<_> = (0..24).map(|i| li(i, 1 + (i % 31) as u8, i as i16)).collect();
    let mut ctx = TestContext::new();
    ctx.run(&prog, 100);
    assert_matches_interpreter(&ctx, &prog);
    assert!(ctx.core.stats.ipc() > 1.0, "ipc {}", ctx.core.stats.ipc());
}

#[rstest]
#[case::single_port(1)]
#[case::two_ports(2)]
#[case::eight_ports(8)]
fn limited_wakeup_ports_defer_completions(#[case] ports: usize) {
    let mut config = small_config();
    config.scheduler.wakeup_ports = ports;
    let mut ctx = TestContext::with_config(config);
    let prog = renumber(
        (0..4)
            .map(|i| li(0, 1 + i, i16::from(i)))
            .chain((0..4).map(|i| alu(0, 5 + i, &[1 + i, 1], 1)))
            .collect(),
    );
    ctx.run(&prog, 100);
    assert_matches_interpreter(&ctx, &prog);
    if ports < 4 {
        assert!(ctx.core.stats.backlogged > 0);
    }
}

#[test]
fn mixed_latencies_complete_out_of_order_and_commit_in_order() {
    let prog = vec![
        op(0, OpClass::Div, 1, &[0], 100),
        li(1, 2, 1),
        op(2, OpClass::Mul, 3, &[2], 2),
        load(3, 4, 3),
        op(4, OpClass::FpSqrt, 5, &[4, 1], 0),
        alu(5, 6, &[2], 9),
    ];
    let mut ctx = TestContext::new();
    ctx.run(&prog, 200);
    assert_matches_interpreter(&ctx, &prog);
}

#[test]
fn writes_to_x0_are_discarded() {
    let prog = vec![li(0, 0, 55), alu(1, 1, &[0], 1)];
    let mut ctx = TestContext::new();
    ctx.run(&prog, 50);
    assert_eq!(ctx.arch_value(0), 0);
    assert_eq!(ctx.arch_value(1), 1);
}

#[test]
fn tag_pool_recycles_over_long_program() {
    // 200 writes through 32 spare tags.
    let prog: Vec<_> = (0..200).map(|i| alu(i, 1 + (i % 3) as u8, &[1 + ((i + 1) % 3) as u8], 1)).collect();
    let mut ctx = TestContext::small();
    ctx.run(&prog, 2000);
    assert_matches_interpreter(&ctx, &prog);
    assert_eq!(ctx.core.rename().free_list.num_free(), 32 - 3);
}

#[test]
fn committed_tags_are_strictly_ascending() {
    let prog: Vec<_> = (0..40).map(|i| li(i, 1 + (i % 5) as u8, 1)).collect();
    let mut ctx = TestContext::small();
    ctx.run(&prog, 400);
    assert!(ctx.committed.windows(2).all(|w| w[1].rob.is_younger_than(w[0].rob)));
    assert_eq!(ctx.committed.last().map(|c| c.pc), Some(pc(39)));
}

#[test]
fn smallest_accepted_pool_drains_after_every_register_is_renamed() {
    let mut config = small_config();
    assert_eq!(config.rename.phys_regs, 2 * config.rename.arch_regs);
    config.scheduler.banks = 1;
    config.scheduler.wakeup_ports = 1;
    config.rob.capacity = 8;
    let mut ctx = TestContext::with_config(config);

    // Three passes over x1..x31, each reading a register written earlier.
    let prog: Vec<_> = (0..93)
        .map(|i| alu(i, 1 + (i % 31) as u8, &[1 + ((i + 7) % 31) as u8], i as i16))
        .collect();
    ctx.run(&prog, 5000);
    assert_matches_interpreter(&ctx, &prog);
    // 32 reserved tags plus one live copy of x1..x31.
    assert_eq!(ctx.core.rename().free_list.num_free(), 64 - 32 - 31);
}
