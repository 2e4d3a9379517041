//! Built-in operations
//!
//! Three operation kinds ship with the engine: Init seeds task state at
//! the start of a ticket, Script runs a registered processing function,
//! and the external-task protocol pauses a ticket until an operator
//! resolves it. Everything else is expected to be supplied by the
//! embedding application through the registry.

mod external;
mod init;
mod script;

pub use external::{mark_updated, External, ExternalOperation, OperatorExternalTask};
pub use init::InitOperation;
pub use script::{ScriptFn, ScriptOperation};

use crate::{OperationHandler, OperationRegistry};
use std::sync::Arc;
use ticketflow_types::{FlowResult, OperationDescriptor};

/// Slug of the ticket-initialisation operation
pub const INIT_SLUG: &str = "__init";
/// Slug of the script operation
pub const SCRIPT_SLUG: &str = "script";
/// Slug of the operator external-task operation
pub const EXTERNAL_TASK_SLUG: &str = "external-task";

/// Descriptors for the built-in operations
pub fn builtin_operations() -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor::new(
            "__init",
            INIT_SLUG,
            "Task initialisation at the beginning of a ticket process",
        ),
        OperationDescriptor::new("Script", SCRIPT_SLUG, "Run a processing step"),
        OperationDescriptor::new(
            "External Task",
            EXTERNAL_TASK_SLUG,
            "External processing step resolved by an operator",
        ),
    ]
}

/// Build a registry with the built-in operations registered.
///
/// The script operation is passed in so callers can register their
/// script functions before handing it over.
pub fn builtin_registry(scripts: ScriptOperation) -> FlowResult<OperationRegistry> {
    let mut registry = OperationRegistry::new();
    let handlers = [
        Arc::new(InitOperation) as Arc<dyn OperationHandler>,
        Arc::new(scripts),
        Arc::new(External(OperatorExternalTask)),
    ];
    for (descriptor, handler) in builtin_operations().into_iter().zip(handlers) {
        registry.register(descriptor, handler)?;
    }
    Ok(registry)
}
