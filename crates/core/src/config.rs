//! Configuration system for the scheduling core.
//!
//! This module defines every parameter of the core. It provides:
//! 1. **Defaults:** Baseline sizes (768 physical tags, 2×64-entry banks, 240-entry ROB).
//! 2. **Structures:** Per-component sections for rename, scheduler, ROB, latency and recovery.
//! 3. **Validation:** `Config::validate` rejects parameter sets that cannot form a working core.
//!
//! Configuration is supplied as JSON (`Config::from_json`) or built from `Config::default()`.

use serde::Deserialize;

use crate::common::error::ConfigError;
use crate::isa::OpClass;

/// Default configuration constants.
mod defaults {
    /// Architectural registers visible to the instruction set.
    pub const ARCH_REGS: usize = 32;

    /// Physical register pool size; at least twice `arch_regs`.
    pub const PHYS_REGS: usize = 768;

    /// Operations renamed per cycle.
    pub const RENAME_WIDTH: usize = 8;

    /// RAT checkpoint slots for nested speculation.
    pub const CHECKPOINTS: usize = 4;

    /// Saturation point of the chain-depth table.
    pub const MAX_CHAIN_DEPTH: u16 = 255;

    /// Number of scheduler banks.
    pub const BANKS: usize = 2;

    /// Entries per scheduler bank.
    pub const BANK_CAPACITY: usize = 64;

    /// Operations steered to one bank as a unit.
    pub const GROUP_SIZE: usize = 4;

    /// Entries selected per bank per cycle.
    pub const ISSUE_PER_BANK: usize = 4;

    /// Global per-cycle issue limit.
    pub const ISSUE_WIDTH: usize = 8;

    /// Completion tags broadcast per cycle.
    pub const WAKEUP_PORTS: usize = 8;

    /// Reorder buffer entries.
    pub const ROB_CAPACITY: usize = 240;

    /// Entries retired per cycle.
    pub const COMMIT_WIDTH: usize = 8;

    /// Single-cycle integer, logic and compare operations.
    pub const LAT_INT: u16 = 1;
    /// Integer multiply.
    pub const LAT_MUL: u16 = 3;
    /// Integer divide.
    pub const LAT_DIV: u16 = 12;
    /// Load, assuming a cache hit.
    pub const LAT_LOAD: u16 = 4;
    /// Store address/data generation.
    pub const LAT_STORE: u16 = 1;
    /// Branch compare.
    pub const LAT_BRANCH: u16 = 1;
    /// Floating add/subtract.
    pub const LAT_FADD: u16 = 3;
    /// Floating multiply.
    pub const LAT_FMUL: u16 = 4;
    /// Fused multiply-add.
    pub const LAT_FMA: u16 = 4;
    /// Floating divide.
    pub const LAT_FDIV: u16 = 16;
    /// Floating square root.
    pub const LAT_FSQRT: u16 = 20;
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use oosched_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.rename.phys_regs, 768);
/// assert_eq!(config.scheduler.bank_capacity, 64);
/// assert!(config.validate().is_ok());
/// ```
///
/// Partial JSON keeps the defaults for every omitted field:
///
/// ```
/// use oosched_core::config::Config;
///
/// let config = Config::from_json(r#"{ "rob": { "capacity": 64 }, "latency": { "load": 3 } }"#).unwrap();
/// assert_eq!(config.rob.capacity, 64);
/// assert_eq!(config.rob.commit_width, 8);
/// assert_eq!(config.latency.load, 3);
/// assert_eq!(config.latency.div, 12);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Free list, RAT and chain-depth parameters.
    pub rename: RenameConfig,
    /// Scheduler bank parameters.
    pub scheduler: SchedulerConfig,
    /// Reorder buffer parameters.
    pub rob: RobConfig,
    /// Static latency per operation class.
    pub latency: LatencyConfig,
    /// Misprediction recovery policy.
    pub recovery: RecoveryConfig,
}

impl Config {
    /// Parses a (possibly partial) JSON configuration and validates it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the parameters describe a working core.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("rename.arch_regs", self.rename.arch_regs),
            ("rename.width", self.rename.width),
            ("scheduler.banks", self.scheduler.banks),
            ("scheduler.bank_capacity", self.scheduler.bank_capacity),
            ("scheduler.group_size", self.scheduler.group_size),
            ("scheduler.issue_per_bank", self.scheduler.issue_per_bank),
            ("scheduler.issue_width", self.scheduler.issue_width),
            ("scheduler.wakeup_ports", self.scheduler.wakeup_ports),
            ("rob.capacity", self.rob.capacity),
            ("rob.commit_width", self.rob.commit_width),
        ];
        if let Some((field, _)) = nonzero.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Zero { field: *field });
        }

        let r = &self.rename;
        if r.arch_regs > usize::from(u8::MAX) + 1 {
            return Err(ConfigError::TooManyArchRegs(r.arch_regs));
        }
        if r.phys_regs > usize::from(u16::MAX) + 1 {
            return Err(ConfigError::PoolTooLarge(r.phys_regs));
        }
        // Every register can pin one non-reserved tag once renamed; one more must stay free.
        if r.phys_regs < 2 * r.arch_regs {
            return Err(ConfigError::PoolTooSmall {
                phys: r.phys_regs,
                arch: r.arch_regs,
            });
        }
        if r.checkpoints > usize::from(u8::MAX) + 1 {
            return Err(ConfigError::TooManyCheckpoints(r.checkpoints));
        }

        let s = &self.scheduler;
        if s.issue_per_bank > 4 {
            return Err(ConfigError::BankQuota(s.issue_per_bank));
        }
        let quota = s.banks * s.issue_per_bank;
        if quota > s.issue_width {
            return Err(ConfigError::IssueOversubscribed {
                quota,
                width: s.issue_width,
            });
        }
        if s.group_size > s.bank_capacity {
            return Err(ConfigError::GroupTooLarge {
                group: s.group_size,
                capacity: s.bank_capacity,
            });
        }

        if self.rob.capacity < 2 * r.width {
            return Err(ConfigError::RobTooSmall {
                capacity: self.rob.capacity,
                width: r.width,
            });
        }
        Ok(())
    }
}

/// Rename-stage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    /// Architectural registers; tags below this count are reserved for the identity map.
    pub arch_regs: usize,
    /// Physical register pool size; at least twice `arch_regs`.
    pub phys_regs: usize,
    /// Maximum operations renamed per cycle (W).
    pub width: usize,
    /// RAT checkpoint slots (at most 256).
    pub checkpoints: usize,
    /// Chain-depth saturation value.
    pub max_chain_depth: u16,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            arch_regs: defaults::ARCH_REGS,
            phys_regs: defaults::PHYS_REGS,
            width: defaults::RENAME_WIDTH,
            checkpoints: defaults::CHECKPOINTS,
            max_chain_depth: defaults::MAX_CHAIN_DEPTH,
        }
    }
}

/// Scheduler bank configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of banks.
    pub banks: usize,
    /// Entries per bank.
    pub bank_capacity: usize,
    /// Consecutive operations steered to the same bank.
    pub group_size: usize,
    /// Entries each bank may select per cycle (at most 4).
    pub issue_per_bank: usize,
    /// Global issue limit; must cover every bank's quota.
    pub issue_width: usize,
    /// Completion tags broadcast per cycle.
    pub wakeup_ports: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            banks: defaults::BANKS,
            bank_capacity: defaults::BANK_CAPACITY,
            group_size: defaults::GROUP_SIZE,
            issue_per_bank: defaults::ISSUE_PER_BANK,
            issue_width: defaults::ISSUE_WIDTH,
            wakeup_ports: defaults::WAKEUP_PORTS,
        }
    }
}

/// Reorder buffer configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RobConfig {
    /// Circular buffer capacity.
    pub capacity: usize,
    /// Entries committed per cycle.
    pub commit_width: usize,
}

impl Default for RobConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::ROB_CAPACITY,
            commit_width: defaults::COMMIT_WIDTH,
        }
    }
}

/// Static latency per operation class, in cycles.
///
/// These feed the chain-depth priority only; execution units keep their own timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    /// Integer arithmetic, logic and compare.
    pub int: u16,
    /// Integer multiply.
    pub mul: u16,
    /// Integer divide.
    pub div: u16,
    /// Load (cache-hit assumption).
    pub load: u16,
    /// Store.
    pub store: u16,
    /// Branch compare.
    pub branch: u16,
    /// Floating add/subtract.
    pub fadd: u16,
    /// Floating multiply.
    pub fmul: u16,
    /// Fused multiply-add.
    pub fma: u16,
    /// Floating divide.
    pub fdiv: u16,
    /// Floating square root.
    pub fsqrt: u16,
}

impl LatencyConfig {
    /// Looks up the static latency of an operation class.
    pub const fn of(&self, class: OpClass) -> u16 {
        match class {
            OpClass::Int => self.int,
            OpClass::Mul => self.mul,
            OpClass::Div => self.div,
            OpClass::Load => self.load,
            OpClass::Store => self.store,
            OpClass::Branch => self.branch,
            OpClass::FpAdd => self.fadd,
            OpClass::FpMul => self.fmul,
            OpClass::FpFma => self.fma,
            OpClass::FpDiv => self.fdiv,
            OpClass::FpSqrt => self.fsqrt,
        }
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            int: defaults::LAT_INT,
            mul: defaults::LAT_MUL,
            div: defaults::LAT_DIV,
            load: defaults::LAT_LOAD,
            store: defaults::LAT_STORE,
            branch: defaults::LAT_BRANCH,
            fadd: defaults::LAT_FADD,
            fmul: defaults::LAT_FMUL,
            fma: defaults::LAT_FMA,
            fdiv: defaults::LAT_FDIV,
            fsqrt: defaults::LAT_FSQRT,
        }
    }
}

/// Misprediction recovery policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Restore the RAT from a per-branch checkpoint. When false, or when a
    /// branch renamed with every slot busy, the RAT is rebuilt from the
    /// committed map plus the surviving ROB entries instead.
    pub use_checkpoints: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            use_checkpoints: true,
        }
    }
}
