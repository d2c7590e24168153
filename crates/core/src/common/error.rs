//! Error and exception definitions.
//!
//! This module defines the three kinds of abnormal condition the core knows about:
//! 1. **Configuration errors:** Rejected parameter sets, reported when a core is built.
//! 2. **Exception causes:** Architectural exceptions reported by execution units and
//!    surfaced precisely at the ROB head.
//! 3. **Invariant violations:** Programming-contract breaches found by the invariant
//!    checker. A correct core never produces one.
//!
//! Resource exhaustion is deliberately absent: a full free list, bank or ROB is a
//! stall reported through the rename output, not an error.

use std::fmt;

use thiserror::Error;

use super::tag::{ChainDepth, PhysTag, RobTag};

/// A configuration that cannot describe a working core.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A size or width parameter that must be non-zero was zero.
    #[error("{field} must be non-zero")]
    Zero {
        /// Offending field.
        field: &'static str,
    },

    /// The physical pool cannot hold the reserved identity tags plus a renamed
    /// copy of every architectural register.
    #[error("phys_regs ({phys}) must be at least twice arch_regs ({arch})")]
    PoolTooSmall {
        /// Configured physical register count.
        phys: usize,
        /// Configured architectural register count.
        arch: usize,
    },

    /// Physical tags are 16 bits wide.
    #[error("phys_regs ({0}) exceeds the 16-bit tag space")]
    PoolTooLarge(usize),

    /// Checkpoint slot ids are 8 bits wide.
    #[error("checkpoints ({0}) exceeds the 8-bit slot id space")]
    TooManyCheckpoints(usize),

    /// Architectural ids are 8 bits wide.
    #[error("arch_regs ({0}) exceeds the 8-bit register id space")]
    TooManyArchRegs(usize),

    /// A single bank may select at most four entries per cycle.
    #[error("issue_per_bank ({0}) exceeds the per-bank selection limit of 4")]
    BankQuota(usize),

    /// The summed bank quotas could exceed the global issue limit.
    #[error("banks * issue_per_bank ({quota}) exceeds issue_width ({width})")]
    IssueOversubscribed {
        /// Sum of all bank quotas.
        quota: usize,
        /// Global per-cycle issue limit.
        width: usize,
    },

    /// The ROB must hold one batch plus the wrap headroom.
    #[error("rob capacity ({capacity}) must be at least twice the rename width ({width})")]
    RobTooSmall {
        /// Configured ROB capacity.
        capacity: usize,
        /// Configured rename width.
        width: usize,
    },

    /// A bank group must fit in a bank.
    #[error("group_size ({group}) exceeds bank_capacity ({capacity})")]
    GroupTooLarge {
        /// Configured group size.
        group: usize,
        /// Configured bank capacity.
        capacity: usize,
    },

    /// JSON could not be parsed into a configuration.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Architectural exception reported by an execution unit.
///
/// The core never interprets the cause; it only carries it to the ROB head
/// and reports it upward when the faulting operation becomes the oldest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExceptionCause {
    /// Instruction fetch violated protection. Carries the faulting address.
    InstructionAccessFault(u64),
    /// The operation encoding was rejected. Carries the raw encoding.
    IllegalInstruction(u32),
    /// Breakpoint reached. Carries the program counter.
    Breakpoint(u64),
    /// Misaligned load. Carries the address.
    LoadAddressMisaligned(u64),
    /// Load violated protection. Carries the address.
    LoadAccessFault(u64),
    /// Misaligned store. Carries the address.
    StoreAddressMisaligned(u64),
    /// Store violated protection. Carries the address.
    StoreAccessFault(u64),
    /// Load page fault. Carries the virtual address.
    LoadPageFault(u64),
    /// Store page fault. Carries the virtual address.
    StorePageFault(u64),
    /// Environment call.
    EnvironmentCall,
    /// Any other collaborator-defined code.
    Other(u32),
}

impl ExceptionCause {
    /// Numeric cause code, following the usual machine cause numbering.
    pub const fn code(self) -> u32 {
        match self {
            Self::InstructionAccessFault(_) => 1,
            Self::IllegalInstruction(_) => 2,
            Self::Breakpoint(_) => 3,
            Self::LoadAddressMisaligned(_) => 4,
            Self::LoadAccessFault(_) => 5,
            Self::StoreAddressMisaligned(_) => 6,
            Self::StoreAccessFault(_) => 7,
            Self::EnvironmentCall => 8,
            Self::LoadPageFault(_) => 13,
            Self::StorePageFault(_) => 15,
            Self::Other(code) => code,
        }
    }

    /// Faulting address or encoding, if the cause carries one.
    pub const fn tval(self) -> Option<u64> {
        match self {
            Self::InstructionAccessFault(v)
            | Self::Breakpoint(v)
            | Self::LoadAddressMisaligned(v)
            | Self::LoadAccessFault(v)
            | Self::StoreAddressMisaligned(v)
            | Self::StoreAccessFault(v)
            | Self::LoadPageFault(v)
            | Self::StorePageFault(v) => Some(v),
            Self::IllegalInstruction(inst) => Some(inst as u64),
            Self::EnvironmentCall | Self::Other(_) => None,
        }
    }
}

impl fmt::Display for ExceptionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstructionAccessFault(addr) => write!(f, "InstructionAccessFault({addr:#x})"),
            Self::IllegalInstruction(inst) => write!(f, "IllegalInstruction({inst:#x})"),
            Self::Breakpoint(pc) => write!(f, "Breakpoint({pc:#x})"),
            Self::LoadAddressMisaligned(addr) => write!(f, "LoadAddressMisaligned({addr:#x})"),
            Self::LoadAccessFault(addr) => write!(f, "LoadAccessFault({addr:#x})"),
            Self::StoreAddressMisaligned(addr) => write!(f, "StoreAddressMisaligned({addr:#x})"),
            Self::StoreAccessFault(addr) => write!(f, "StoreAccessFault({addr:#x})"),
            Self::LoadPageFault(addr) => write!(f, "LoadPageFault({addr:#x})"),
            Self::StorePageFault(addr) => write!(f, "StorePageFault({addr:#x})"),
            Self::EnvironmentCall => write!(f, "EnvironmentCall"),
            Self::Other(code) => write!(f, "Other({code})"),
        }
    }
}

impl std::error::Error for ExceptionCause {}

/// A broken core invariant.
///
/// Returned by [`Core::check_invariants`](crate::core::Core::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A tag is both free and referenced by the RAT or a live ROB entry.
    #[error("{tag} is free but also held by {holder}")]
    FreeTagInUse {
        /// The doubly-owned tag.
        tag: PhysTag,
        /// Which structure still references it.
        holder: &'static str,
    },

    /// A tag is referenced twice across the RAT and live ROB old mappings.
    #[error("{tag} is referenced more than once by the RAT and ROB")]
    DuplicateMapping {
        /// The duplicated tag.
        tag: PhysTag,
    },

    /// A non-reserved tag is neither free, mapped, nor held as an old mapping.
    #[error("{tag} has leaked from the free list")]
    LeakedTag {
        /// The orphaned tag.
        tag: PhysTag,
    },

    /// A reserved identity tag was found on the free list.
    #[error("reserved {tag} is on the free list")]
    ReservedTagFree {
        /// The reserved tag.
        tag: PhysTag,
    },

    /// Two valid scheduler entries name the same destination.
    #[error("{tag} is the destination of two scheduler entries")]
    DuplicateDestination {
        /// The duplicated destination.
        tag: PhysTag,
    },

    /// A scheduler entry belongs to an operation the ROB no longer tracks.
    #[error("scheduler entry owned by {rob} has no live ROB entry")]
    OrphanEntry {
        /// Owner recorded in the scheduler entry.
        rob: RobTag,
    },

    /// ROB bookkeeping disagrees with its occupancy count.
    #[error("ROB count {count} disagrees with {live} live entries")]
    RobCount {
        /// Stored count.
        count: usize,
        /// Entries actually valid between head and tail.
        live: usize,
    },

    /// ROB sequence numbers are not strictly increasing from head to tail.
    #[error("ROB entry {rob} is out of allocation order")]
    RobOrder {
        /// First out-of-order entry.
        rob: RobTag,
    },

    /// A chain-depth value exceeds the configured maximum.
    #[error("chain depth {depth} of {tag} exceeds maximum {max}")]
    DepthOverflow {
        /// Offending tag.
        tag: PhysTag,
        /// Stored depth.
        depth: ChainDepth,
        /// Configured maximum.
        max: ChainDepth,
    },
}
