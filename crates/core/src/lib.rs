//! Out-of-order scheduling core library.
//!
//! This crate models the rename, scheduling and retirement back end of a
//! superscalar processor, one step at a time:
//! 1. **Rename:** Physical tag free list, register alias table with checkpoints,
//!    and a chain-depth tracker that assigns each operation its issue priority.
//! 2. **Scheduling:** Banked issue queues with broadcast wakeup and
//!    highest-chain-depth-first selection.
//! 3. **Retirement:** A reorder buffer with in-order prefix commit, precise
//!    exceptions at the head, and oldest-first misprediction recovery.
//! 4. **Orchestration:** `Core::step`, which drives all of the above against
//!    external execution units and a register file.
//!
//! # Examples
//!
//! ```
//! use oosched_core::{Config, Core, DecodedOp, OpClass, PhysRegFile};
//! use oosched_core::core::latches::Completion;
//!
//! let config = Config::default();
//! let mut rf = PhysRegFile::new(config.rename.phys_regs);
//! let mut core = Core::new(config).unwrap();
//!
//! let add = DecodedOp::new(0x1000, OpClass::Int).with_dst(5).with_src(0, 1);
//! let out = core.step(&[add], &[], &mut rf);
//! assert_eq!(out.accepted, 1);
//!
//! let out = core.step(&[], &[], &mut rf);
//! assert_eq!(out.issued.len(), 1);
//! let done = Completion::of(&out.issued[0], 7);
//!
//! let _ = core.step(&[], &[done], &mut rf);
//! let out = core.step(&[], &[], &mut rf);
//! assert_eq!(out.committed.len(), 1);
//! assert_eq!(out.committed[0].value, 7);
//! ```

/// Common types (tags, errors, register-file collaborator).
pub mod common;
/// Core configuration (defaults, per-component sections, validation).
pub mod config;
/// Scheduling core (rename, banks, ROB, stages, orchestration).
pub mod core;
/// Decoded-operation model and operation classes.
pub mod isa;
/// Core statistics collection and reporting.
pub mod stats;

/// Register file collaborator trait and the in-crate reference implementation.
pub use crate::common::{PhysRegFile, RegisterFile};
/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// The scheduling core; construct with `Core::new` and advance with `Core::step`.
pub use crate::core::{Core, StepOutput};
/// Decoded operations offered to rename.
pub use crate::isa::{DecodedOp, OpClass};
