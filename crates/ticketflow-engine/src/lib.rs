//! Ticketflow Engine
//!
//! Execution engine for ticket workflows: tickets advance through a
//! workflow's element graph one operation dispatch at a time, leaving an
//! append-only trail of steps and tasks behind them.
//!
//! # Key Concepts
//!
//! - **Operation Handler**: per-status logic bound to an element,
//!   dispatched through a dense match on the task's status
//! - **Registry**: startup-time name-to-handler table; an element names
//!   its operation, the registry resolves it
//! - **Processor**: applies one dispatch and the cross-cutting
//!   post-conditions (Finished/Terminated synthesis, error conversion)
//! - **Runner**: drives a ticket until it stalls, finishes, or hits the
//!   iteration cap
//! - **Storage**: the persistence seam; the engine owns no storage and
//!   writes through whatever implementation the caller supplies
//!
//! # Design Principles
//!
//! - Tasks are immutable: progress derives new tasks, never edits old ones
//! - Configuration faults become Error tasks, not panics or lost tickets
//! - A stalled ticket is a valid outcome; the caller decides what's next

#![deny(unsafe_code)]

mod handler;
pub mod ops;
mod processor;
mod registry;
mod runner;
mod storage;

pub use handler::{enter_error_state, move_to_next, OperationHandler};
pub use processor::ElementProcessor;
pub use registry::OperationRegistry;
pub use runner::{TicketRunner, MAX_RUN_STEPS};
pub use storage::{MemoryStorage, Storage};
