// Undo - revert the most recent recorded batch
use super::{CommandHandler, Committed, Resolution, UndoPolicy};
use crate::application::context::DashboardContext;
use crate::application::error::CommandError;
use crate::application::event::EventBody;
use crate::application::store::state::DashboardState;
use async_trait::async_trait;

pub struct UndoLastChange;

#[async_trait]
impl CommandHandler for UndoLastChange {
    async fn resolve(&self, _ctx: &DashboardContext) -> Result<Resolution, CommandError> {
        // the entry to revert is only known once the commit loop runs us
        Ok(Resolution::mutation(|state: &DashboardState| {
            let entry = state
                .undo
                .last()
                .ok_or_else(|| CommandError::precondition("there is no change to undo"))?;

            tracing::debug!(
                "Undoing {} ({}) recorded at version {}",
                entry.command.kind(),
                entry.correlation_id,
                entry.version
            );
            Ok(Committed {
                actions: entry.inverse.clone(),
                undo: UndoPolicy::Pop,
                body: EventBody::LayoutChangesUndone {
                    undone_command: entry.command.kind(),
                    undone_correlation_id: entry.correlation_id.clone(),
                },
            })
        }))
    }
}
