//! Scheduler Bank Tests.
//!
//! Verifies allocation, wakeup and priority selection on single banks and on
//! the cluster that steers groups across them.

use oosched_core::common::{PhysTag, RobTag};
use oosched_core::config::SchedulerConfig;
use oosched_core::core::sched::{SchedulerBank, SchedulerCluster};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::builder::op::renamed;

fn cluster(banks: usize, capacity: usize, group: usize, per_bank: usize) -> SchedulerCluster {
    SchedulerCluster::new(&SchedulerConfig {
        banks,
        bank_capacity: capacity,
        group_size: group,
        issue_per_bank: per_bank,
        issue_width: banks * per_bank,
        wakeup_ports: 8,
    })
}

// ══════════════════════════════════════════════════════════
// 1. Selection
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(4)]
fn select_respects_bank_quota(#[case] quota: usize) {
    let mut bank = SchedulerBank::new(16, quota);
    let ops: Vec<_> = (1..=8).map(|s| renamed(s, 1, &[])).collect();
    let _ = bank.allocate(&ops).unwrap();
    assert_eq!(bank.select().len(), quota);
    assert_eq!(bank.len(), 8 - quota);
}

#[test]
fn select_orders_by_priority_then_slot() {
    let mut bank = SchedulerBank::new(8, 4);
    let _ = bank
        .allocate(&[
            renamed(1, 2, &[]),
            renamed(2, 7, &[]),
            renamed(3, 7, &[]),
            renamed(4, 5, &[]),
            renamed(5, 9, &[(60, false)]),
        ])
        .unwrap();
    let picked: Vec<(usize, u64)> = bank.select().iter().map(|(s, o)| (*s, o.rob.seq)).collect();
    assert_eq!(picked, vec![(1, 2), (2, 3), (3, 4), (0, 1)]);
}

#[test]
fn repeated_selection_is_deterministic() {
    let ops: Vec<_> = (1..=12).map(|s| renamed(s, (s * 7 % 5) as u16, &[])).collect();
    let mut a = SchedulerBank::new(16, 4);
    let _ = a.allocate(&ops).unwrap();
    let mut b = a.clone();
    for _ in 0..3 {
        assert_eq!(a.select(), b.select());
    }
}

#[test]
fn freed_slot_is_lowest_on_reuse() {
    let mut bank = SchedulerBank::new(4, 1);
    let _ = bank
        .allocate(&[renamed(1, 1, &[(60, false)]), renamed(2, 5, &[]), renamed(3, 1, &[(60, false)])])
        .unwrap();
    assert_eq!(bank.select()[0].0, 1);
    assert_eq!(bank.allocate(&[renamed(4, 1, &[])]), Some(vec![1]));
}

// ══════════════════════════════════════════════════════════
// 2. Wakeup
// ══════════════════════════════════════════════════════════

#[test]
fn wakeup_needs_every_source() {
    let mut bank = SchedulerBank::new(4, 4);
    let _ = bank.allocate(&[renamed(1, 1, &[(60, false), (61, false), (62, true)])]).unwrap();
    let _ = bank.wakeup(&[PhysTag(60)]);
    assert!(bank.select().is_empty());
    let _ = bank.wakeup(&[PhysTag(61)]);
    assert_eq!(bank.select().len(), 1);
}

#[test]
fn one_broadcast_wakes_every_consumer() {
    let mut c = cluster(2, 8, 1, 4);
    assert!(c.allocate(&[
        renamed(1, 1, &[(60, false)]),
        renamed(2, 1, &[(60, false)]),
        renamed(3, 1, &[(61, false)]),
    ]));
    assert_eq!(c.wakeup(&[PhysTag(60)]), 2);
    let seqs: Vec<u64> = c.select().iter().map(|(_, o)| o.rob.seq).collect();
    assert_eq!(seqs, vec![1, 2]);
}

// ══════════════════════════════════════════════════════════
// 3. Steering and flush
// ══════════════════════════════════════════════════════════

#[test]
fn groups_alternate_banks_across_batches() {
    let mut c = cluster(2, 8, 2, 4);
    assert!(c.allocate(&[renamed(1, 1, &[]), renamed(2, 1, &[]), renamed(3, 1, &[])]));
    assert!(c.allocate(&[renamed(4, 1, &[])]));
    let per_bank: Vec<usize> = c.banks().iter().map(SchedulerBank::len).collect();
    assert_eq!(per_bank, vec![3, 1]);
}

#[test]
fn issue_reports_source_bank() {
    let mut c = cluster(2, 8, 1, 4);
    assert!(c.allocate(&[renamed(1, 1, &[]), renamed(2, 1, &[])]));
    let banks: Vec<usize> = c.select().iter().map(|(b, _)| *b).collect();
    assert_eq!(banks, vec![0, 1]);
}

#[test]
fn flush_younger_spans_all_banks() {
    let mut c = cluster(2, 8, 1, 4);
    let ops: Vec<_> = (1..=6).map(|s| renamed(s, 1, &[(60, false)])).collect();
    assert!(c.allocate(&ops));
    assert_eq!(c.flush_younger(RobTag { index: 3, seq: 3 }), 3);
    assert!(c.banks().iter().all(|b| b.iter().all(|(_, o)| o.rob.seq <= 3)));
    assert_eq!(c.flush_all(), 3);
    assert!(c.is_empty());
}

#[test]
fn admissible_counts_whole_groups() {
    let mut c = cluster(2, 3, 2, 4);
    assert_eq!(c.admissible(6), 4, "third group returns to the first bank, which has one slot");
    assert!(c.allocate(&[renamed(1, 1, &[]), renamed(2, 1, &[])]));
    assert_eq!(c.admissible(2), 2);
}
