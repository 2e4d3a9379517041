//! Init operation: seeds task state at the start of a ticket

use crate::{OperationHandler, Storage};
use ticketflow_types::{Element, FlowResult, RunContext, Task, TaskStatus, Workflow};

/// Seeds the task state from the element's parameters and completes.
///
/// Any status other than New completes without touching the state, so a
/// ticket re-entering an init element just passes through.
#[derive(Clone, Copy, Debug, Default)]
pub struct InitOperation;

impl OperationHandler for InitOperation {
    fn on_new(
        &self,
        task: &Task,
        element: &Element,
        _workflow: &Workflow,
        ctx: &RunContext,
        _store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        let mut state = task.state.clone();
        for (key, value) in &element.op_params {
            state.insert(key.clone(), value.clone());
        }
        Ok(Some(
            task.derive(ctx)
                .with_state(state)
                .with_status(TaskStatus::Completed),
        ))
    }

    fn fallback(
        &self,
        task: &Task,
        _element: &Element,
        _workflow: &Workflow,
        ctx: &RunContext,
        _store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        Ok(Some(task.derive(ctx).with_status(TaskStatus::Completed)))
    }
}
