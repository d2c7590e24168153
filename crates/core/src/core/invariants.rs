//! Structural invariant checks.
//!
//! Walks every component and reports the first broken invariant:
//! 1. **Tag partition:** Every non-reserved tag is exactly one of free, RAT-mapped,
//!    or held as the old mapping of a live ROB entry. Reserved tags are never free.
//! 2. **Scheduler:** No two entries share a destination, and each entry's owner is live.
//! 3. **ROB:** Occupancy count matches the valid entries, which are in allocation order.
//! 4. **Chain depth:** No value exceeds the configured maximum.

use crate::common::error::InvariantViolation;
use crate::common::tag::PhysTag;
use crate::core::rename::RenameUnit;
use crate::core::rob::Rob;
use crate::core::sched::SchedulerCluster;

pub(super) fn check(
    rename: &RenameUnit,
    sched: &SchedulerCluster,
    rob: &Rob,
) -> Result<(), InvariantViolation> {
    check_partition(rename, rob)?;
    check_scheduler(sched, rob)?;
    check_rob(rob)?;
    check_depth(rename)
}

fn check_partition(rename: &RenameUnit, rob: &Rob) -> Result<(), InvariantViolation> {
    let fl = &rename.free_list;
    let reserved = fl.reserved();
    if let Some(tag) = fl.iter_free().find(|t| t.idx() < reserved) {
        return Err(InvariantViolation::ReservedTagFree { tag });
    }

    let mut held = vec![false; fl.capacity()];
    let mut claim = |tag: PhysTag, holder: &'static str| {
        if tag.idx() < reserved {
            return Ok(());
        }
        if fl.is_free(tag) {
            return Err(InvariantViolation::FreeTagInUse { tag, holder });
        }
        if std::mem::replace(&mut held[tag.idx()], true) {
            return Err(InvariantViolation::DuplicateMapping { tag });
        }
        Ok(())
    };
    for tag in rename.rat.mapped() {
        claim(tag, "RAT")?;
    }
    for old in rob.iter().filter_map(|e| e.info.old_dst) {
        claim(old, "ROB")?;
    }

    match (reserved..held.len()).find(|&i| !held[i] && !fl.is_free(PhysTag(i as u16))) {
        Some(i) => Err(InvariantViolation::LeakedTag {
            tag: PhysTag(i as u16),
        }),
        None => Ok(()),
    }
}

fn check_scheduler(sched: &SchedulerCluster, rob: &Rob) -> Result<(), InvariantViolation> {
    let mut dsts: Vec<PhysTag> = Vec::with_capacity(sched.len());
    for bank in sched.banks() {
        for (_, op) in bank.iter() {
            if !rob.is_live(op.rob) {
                return Err(InvariantViolation::OrphanEntry { rob: op.rob });
            }
            if let Some(dst) = op.dst {
                if dsts.contains(&dst) {
                    return Err(InvariantViolation::DuplicateDestination { tag: dst });
                }
                dsts.push(dst);
            }
        }
    }
    Ok(())
}

fn check_rob(rob: &Rob) -> Result<(), InvariantViolation> {
    let live = rob.count_live();
    if live != rob.len() || rob.count_valid_slots() != rob.len() {
        return Err(InvariantViolation::RobCount {
            count: rob.len(),
            live,
        });
    }
    let mut prev: Option<u64> = None;
    for e in rob.iter() {
        if prev.is_some_and(|p| e.tag.seq <= p) {
            return Err(InvariantViolation::RobOrder { rob: e.tag });
        }
        prev = Some(e.tag.seq);
    }
    Ok(())
}

fn check_depth(rename: &RenameUnit) -> Result<(), InvariantViolation> {
    let max = rename.depth.max();
    match rename.depth.iter().find(|(_, d)| *d > max) {
        Some((tag, depth)) => Err(InvariantViolation::DepthOverflow {
            tag,
            depth,
            max,
        }),
        None => Ok(()),
    }
}
