// Undo bookkeeping - entries pushed together with every recorded batch
use super::action::{Action, FilterContextAction, LayoutAction, SliceKind};
use super::state::DashboardState;
use crate::application::command::{Command, CorrelationId};

/// Originating command plus the actions that revert its batch.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    pub correlation_id: CorrelationId,
    pub command: Command,
    /// Version produced by the recorded batch.
    pub version: u64,
    pub inverse: Vec<Action>,
}

/// Pre-images of the user-editable slices a batch touches.
///
/// Insights and catalog are caches of backend metadata and are never rolled back.
pub(super) fn inverse_actions(before: &DashboardState, actions: &[Action]) -> Vec<Action> {
    let touches = |kind: SliceKind| actions.iter().any(|action| action.slice() == kind);
    let mut inverse = Vec::new();

    if touches(SliceKind::FilterContext) {
        inverse.push(Action::FilterContext(FilterContextAction::Restore(
            before.filter_context.clone(),
        )));
    }
    if touches(SliceKind::Layout) {
        inverse.push(Action::Layout(LayoutAction::Restore(before.layout.clone())));
    }

    inverse
}
