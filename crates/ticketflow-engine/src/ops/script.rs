//! Script operation: runs a named processing function over task state
//!
//! Script functions are registered by name at startup, mirroring the
//! operation registry: an element selects one through the `script_name`
//! entry of its parameters. An unresolvable name is a configuration
//! fault and produces an Error task rather than a panic.

use crate::{enter_error_state, OperationHandler, Storage};
use std::collections::HashMap;
use std::sync::Arc;
use ticketflow_types::{
    Element, FlowError, FlowResult, JsonMap, RunContext, Task, TaskStatus, Workflow,
};

/// A registered script: `(element params, incoming state) → new state`.
///
/// Failures are reported as a message, carried into the Error task's
/// state for diagnosis.
pub type ScriptFn = Arc<dyn Fn(&JsonMap, &JsonMap) -> Result<JsonMap, String> + Send + Sync>;

/// Operation running registered script functions
#[derive(Clone, Default)]
pub struct ScriptOperation {
    scripts: HashMap<String, ScriptFn>,
}

impl ScriptOperation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a script function under a name elements can reference.
    ///
    /// Fails if the name is already taken.
    pub fn register_script(
        &mut self,
        name: impl Into<String>,
        script: impl Fn(&JsonMap, &JsonMap) -> Result<JsonMap, String> + Send + Sync + 'static,
    ) -> FlowResult<()> {
        let name = name.into();
        if self.scripts.contains_key(&name) {
            return Err(FlowError::Script(format!(
                "script '{}' already registered",
                name
            )));
        }
        tracing::info!(script = %name, "Script registered");
        self.scripts.insert(name, Arc::new(script));
        Ok(())
    }

    /// Number of registered scripts
    pub fn count(&self) -> usize {
        self.scripts.len()
    }
}

impl std::fmt::Debug for ScriptOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptOperation")
            .field("scripts", &self.scripts.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl OperationHandler for ScriptOperation {
    /// Every non-completion status runs the script: resolve the name
    /// from the element params, transform the state, complete.
    fn fallback(
        &self,
        task: &Task,
        element: &Element,
        _workflow: &Workflow,
        ctx: &RunContext,
        _store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        let name = match element
            .op_params
            .get("script_name")
            .and_then(|v| v.as_str())
        {
            Some(name) => name,
            None => {
                return Ok(Some(enter_error_state(
                    task,
                    ctx,
                    format!("element '{}' has no script_name param", element.slug_name),
                )));
            }
        };

        let script = match self.scripts.get(name) {
            Some(script) => script,
            None => {
                return Ok(Some(enter_error_state(
                    task,
                    ctx,
                    format!("script '{}' is not registered", name),
                )));
            }
        };

        match script(&element.op_params, &task.state) {
            Ok(state) => Ok(Some(
                task.derive(ctx)
                    .with_state(state)
                    .with_status(TaskStatus::Completed),
            )),
            Err(message) => Ok(Some(enter_error_state(task, ctx, message))),
        }
    }
}
