// Command handlers - async resolution followed by a synchronous commit
pub mod dashboard;
pub mod drill;
pub mod filters;
pub mod items;
pub mod layout;
pub mod undo;

use crate::application::command::{Command, CorrelationId};
use crate::application::context::DashboardContext;
use crate::application::error::CommandError;
use crate::application::event::EventBody;
use crate::application::store::action::{Action, UndoEffect};
use crate::application::store::state::DashboardState;
use async_trait::async_trait;

/// What a committed batch does to the undo stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoPolicy {
    Skip,
    Record,
    Pop,
    Clear,
}

impl UndoPolicy {
    pub fn effect(self, correlation_id: CorrelationId, command: Command) -> UndoEffect {
        match self {
            UndoPolicy::Skip => UndoEffect::Skip,
            UndoPolicy::Record => UndoEffect::Record {
                correlation_id,
                command,
            },
            UndoPolicy::Pop => UndoEffect::Pop,
            UndoPolicy::Clear => UndoEffect::Clear,
        }
    }
}

/// Output of a successful commit: one batch plus the event payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed {
    pub actions: Vec<Action>,
    pub undo: UndoPolicy,
    pub body: EventBody,
}

impl Committed {
    pub fn recorded(actions: Vec<Action>, body: EventBody) -> Self {
        Self {
            actions,
            undo: UndoPolicy::Record,
            body,
        }
    }
}

/// Second phase of a mutating command, run by the commit loop against the latest state.
pub trait Commit: Send {
    fn commit(self: Box<Self>, state: &DashboardState) -> Result<Committed, CommandError>;
}

impl<F> Commit for F
where
    F: FnOnce(&DashboardState) -> Result<Committed, CommandError> + Send,
{
    fn commit(self: Box<Self>, state: &DashboardState) -> Result<Committed, CommandError> {
        (*self)(state)
    }
}

pub enum Resolution {
    /// Read-only result; published without touching the store.
    Query(EventBody),
    Mutation(Box<dyn Commit>),
}

impl Resolution {
    pub fn mutation<F>(commit: F) -> Self
    where
        F: FnOnce(&DashboardState) -> Result<Committed, CommandError> + Send + 'static,
    {
        Resolution::Mutation(Box::new(commit))
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Query(body) => f.debug_tuple("Query").field(&body.kind()).finish(),
            Resolution::Mutation(_) => f.write_str("Mutation"),
        }
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Phase 1: validate and gather everything the commit needs. Never writes the store.
    async fn resolve(&self, ctx: &DashboardContext) -> Result<Resolution, CommandError>;
}

/// Commit-time form of a phase-1 check: the state moved underneath the command.
pub(crate) fn recheck(result: Result<(), CommandError>) -> Result<(), CommandError> {
    result.map_err(|error| match error {
        CommandError::InvalidArgument { message } => CommandError::precondition(message),
        other => other,
    })
}

pub fn handler_for(command: Command) -> Box<dyn CommandHandler> {
    match command {
        Command::InitializeDashboard { dashboard } => Box::new(dashboard::InitializeDashboard { dashboard }),
        Command::AddLayoutSection {
            index,
            header,
            items,
            auto_resolve_date_filter_dataset,
        } => Box::new(layout::AddLayoutSection {
            index,
            header,
            items,
            auto_resolve_date_filter_dataset,
        }),
        Command::RemoveLayoutSection {
            index,
            stash_identifier,
        } => Box::new(layout::RemoveLayoutSection {
            index,
            stash_identifier,
        }),
        Command::MoveLayoutSection { from, to } => Box::new(layout::MoveLayoutSection { from, to }),
        Command::AddSectionItems {
            section_index,
            item_index,
            items,
            auto_resolve_date_filter_dataset,
        } => Box::new(items::AddSectionItems {
            section_index,
            item_index,
            items,
            auto_resolve_date_filter_dataset,
        }),
        Command::RemoveSectionItem {
            section_index,
            item_index,
            stash_identifier,
            eager,
        } => Box::new(items::RemoveSectionItem {
            section_index,
            item_index,
            stash_identifier,
            eager,
        }),
        Command::UndoLastChange => Box::new(undo::UndoLastChange),
        Command::ChangeAttributeFilterSelection {
            filter_local_id,
            elements,
            negative_selection,
        } => Box::new(filters::ChangeAttributeFilterSelection {
            filter_local_id,
            elements,
            negative_selection,
        }),
        Command::ChangeDateFilterSelection { selection } => {
            Box::new(filters::ChangeDateFilterSelection { selection })
        }
        Command::QueryWidgetFilters {
            widget,
            insight_filter_overrides,
        } => Box::new(filters::QueryWidgetFilters {
            widget,
            insight_filter_overrides,
        }),
        Command::ResolveDrillToUrlFilters { widget } => Box::new(drill::ResolveDrillToUrlFilters { widget }),
    }
}
