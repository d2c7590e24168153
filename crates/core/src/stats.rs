//! Core statistics collection and reporting.
//!
//! This module tracks per-step counters for the scheduling core. It provides:
//! 1. **Throughput:** Steps, renamed, issued, and committed operations, and IPC.
//! 2. **Stalls:** Rename stalls broken down by the limiting resource.
//! 3. **Wakeup:** Broadcast tags, backlogged completions, and stale drops.
//! 4. **Recovery:** Misprediction and exception flushes and the work they squashed.

use crate::core::latches::StallReason;

/// Counters accumulated by [`Core`](crate::core::Core) across steps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoreStats {
    /// Steps executed.
    pub cycles: u64,
    /// Operations accepted by rename.
    pub renamed: u64,
    /// Operations selected for execution.
    pub issued: u64,
    /// Operations retired.
    pub committed: u64,

    /// Steps in which rename stopped short because the ROB was full.
    pub stalls_rob: u64,
    /// Steps in which rename stopped short because the free list ran dry.
    pub stalls_free_list: u64,
    /// Steps in which rename stopped short because a bank was full.
    pub stalls_bank: u64,
    /// Steps in which more operations were offered than the rename width.
    pub stalls_width: u64,

    /// Destination tags broadcast on the wakeup network.
    pub wakeups: u64,
    /// Completions left queued because the wakeup ports were exhausted.
    pub backlogged: u64,
    /// Completions discarded because their ROB entry had been flushed.
    pub stale_dropped: u64,

    /// Branch-misprediction recoveries performed.
    pub mispredict_flushes: u64,
    /// Recoveries that restored a RAT checkpoint.
    pub checkpoint_restores: u64,
    /// Recoveries that rebuilt the RAT from the committed map.
    pub rat_rebuilds: u64,
    /// Exception flushes performed.
    pub exception_flushes: u64,
    /// ROB entries discarded by flushes.
    pub squashed: u64,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"stalls"`, `"wakeup"`, `"recovery"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "stalls", "wakeup", "recovery"];

impl CoreStats {
    /// Committed operations per step.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.committed as f64 / self.cycles as f64
        }
    }

    /// Counts one rename stall.
    pub const fn record_stall(&mut self, reason: StallReason) {
        match reason {
            StallReason::RobFull => self.stalls_rob += 1,
            StallReason::FreeListEmpty => self.stalls_free_list += 1,
            StallReason::BankFull => self.stalls_bank += 1,
            StallReason::Width => self.stalls_width += 1,
        }
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]. Pass an
    /// empty slice to print all sections (same as `print()`).
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let cyc = self.cycles.max(1) as f64;
        let pct = |n: u64| (n as f64 / cyc) * 100.0;

        if want("summary") {
            println!("\n==========================================================");
            println!("SCHEDULING CORE STATISTICS");
            println!("==========================================================");
            println!("core_cycles              {}", self.cycles);
            println!("core_renamed             {}", self.renamed);
            println!("core_issued              {}", self.issued);
            println!("core_committed           {}", self.committed);
            println!("core_ipc                 {:.4}", self.ipc());
            println!("----------------------------------------------------------");
        }
        if want("stalls") {
            println!("RENAME STALLS");
            println!("  stalls.rob             {} ({:.2}%)", self.stalls_rob, pct(self.stalls_rob));
            println!(
                "  stalls.free_list       {} ({:.2}%)",
                self.stalls_free_list,
                pct(self.stalls_free_list)
            );
            println!("  stalls.bank            {} ({:.2}%)", self.stalls_bank, pct(self.stalls_bank));
            println!("  stalls.width           {} ({:.2}%)", self.stalls_width, pct(self.stalls_width));
            println!("----------------------------------------------------------");
        }
        if want("wakeup") {
            println!("WAKEUP");
            println!("  wakeup.broadcast       {}", self.wakeups);
            println!("  wakeup.backlogged      {}", self.backlogged);
            println!("  wakeup.stale_dropped   {}", self.stale_dropped);
            println!("----------------------------------------------------------");
        }
        if want("recovery") {
            println!("RECOVERY");
            println!("  flush.mispredict       {}", self.mispredict_flushes);
            println!("  flush.ckpt_restore     {}", self.checkpoint_restores);
            println!("  flush.rat_rebuild      {}", self.rat_rebuilds);
            println!("  flush.exception        {}", self.exception_flushes);
            println!("  flush.squashed         {}", self.squashed);
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
