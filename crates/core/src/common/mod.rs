//! Common types shared by every component of the scheduling core.
//!
//! This module provides the fundamental building blocks used across the core:
//! 1. **Tags:** Strong types for physical tags, architectural ids, ROB tags and chain depths.
//! 2. **Error Handling:** Configuration errors, invariant violations and exception causes.
//! 3. **Register File:** The collaborator interface for reading and writing physical registers.

/// Error types and architectural exception causes.
pub mod error;

/// Register file collaborator trait and a reference implementation.
pub mod reg;

/// Tag and identifier newtypes.
pub mod tag;

pub use error::{ConfigError, ExceptionCause, InvariantViolation};
pub use reg::{PhysRegFile, RegisterFile};
pub use tag::{ArchReg, ChainDepth, PhysTag, RobTag};
