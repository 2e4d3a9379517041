//! Ticketflow Domain Types
//!
//! A ticketflow workflow is a directed graph of processing **elements**
//! connected by outcome-named **links**. A **ticket** is one execution of
//! that graph; its progress is recorded as an append-only history of
//! **tasks**, grouped into **steps** that mark which element the ticket
//! occupies.
//!
//! # Key Concepts
//!
//! - **Workflow / Element / Link**: the static graph definition, created
//!   before any ticket exists and read-only during execution.
//! - **Ticket**: one run of a workflow for a creator.
//! - **Step**: the ticket's occupancy at a specific element; a new step is
//!   created each time the ticket crosses a link to a different element.
//! - **Task**: an immutable unit of work-state with a [`TaskStatus`];
//!   progress derives new tasks, never mutates old ones.
//! - **OperatorTask**: auxiliary record for work assigned to a human while
//!   a task is Waiting.
//!
//! # Design Principles
//!
//! 1. Task history is append-only; the current task is the newest one.
//! 2. Graph invariants (one initial element, workflow-scoped slugs, links
//!    within one workflow) are enforced at insert time.
//! 3. The engine never owns storage; entities are values passed to it.

#![deny(unsafe_code)]

mod context;
mod errors;
mod task;
mod ticket;
mod workflow;

pub use context::*;
pub use errors::*;
pub use task::*;
pub use ticket::*;
pub use workflow::*;
