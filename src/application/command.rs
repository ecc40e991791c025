// Commands - intent-bearing requests accepted by the dispatcher
use crate::domain::dashboard::DashboardDocument;
use crate::domain::filter::{AttributeElements, DashboardFilter, DateGranularity};
use crate::domain::layout::{ItemDefinition, SectionHeader, StashId};
use crate::domain::refs::ObjRef;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DateFilterSelection {
    /// Removes the date filter from the filter context.
    AllTime,
    Relative {
        granularity: DateGranularity,
        from: i64,
        to: i64,
    },
    Absolute {
        from: String,
        to: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    InitializeDashboard {
        dashboard: DashboardDocument,
    },
    AddLayoutSection {
        index: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        header: Option<SectionHeader>,
        #[serde(default)]
        items: Vec<ItemDefinition>,
        #[serde(default)]
        auto_resolve_date_filter_dataset: bool,
    },
    RemoveLayoutSection {
        index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stash_identifier: Option<StashId>,
    },
    MoveLayoutSection {
        from: usize,
        to: i64,
    },
    AddSectionItems {
        section_index: usize,
        item_index: i64,
        items: Vec<ItemDefinition>,
        #[serde(default)]
        auto_resolve_date_filter_dataset: bool,
    },
    RemoveSectionItem {
        section_index: usize,
        item_index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stash_identifier: Option<StashId>,
        /// Also remove the section when it is left without items.
        #[serde(default)]
        eager: bool,
    },
    UndoLastChange,
    ChangeAttributeFilterSelection {
        filter_local_id: String,
        elements: AttributeElements,
        #[serde(default)]
        negative_selection: bool,
    },
    ChangeDateFilterSelection {
        selection: DateFilterSelection,
    },
    QueryWidgetFilters {
        widget: ObjRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        insight_filter_overrides: Option<Vec<DashboardFilter>>,
    },
    ResolveDrillToUrlFilters {
        widget: ObjRef,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandKind {
    InitializeDashboard,
    AddLayoutSection,
    RemoveLayoutSection,
    MoveLayoutSection,
    AddSectionItems,
    RemoveSectionItem,
    UndoLastChange,
    ChangeAttributeFilterSelection,
    ChangeDateFilterSelection,
    QueryWidgetFilters,
    ResolveDrillToUrlFilters,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::InitializeDashboard { .. } => CommandKind::InitializeDashboard,
            Command::AddLayoutSection { .. } => CommandKind::AddLayoutSection,
            Command::RemoveLayoutSection { .. } => CommandKind::RemoveLayoutSection,
            Command::MoveLayoutSection { .. } => CommandKind::MoveLayoutSection,
            Command::AddSectionItems { .. } => CommandKind::AddSectionItems,
            Command::RemoveSectionItem { .. } => CommandKind::RemoveSectionItem,
            Command::UndoLastChange => CommandKind::UndoLastChange,
            Command::ChangeAttributeFilterSelection { .. } => {
                CommandKind::ChangeAttributeFilterSelection
            }
            Command::ChangeDateFilterSelection { .. } => CommandKind::ChangeDateFilterSelection,
            Command::QueryWidgetFilters { .. } => CommandKind::QueryWidgetFilters,
            Command::ResolveDrillToUrlFilters { .. } => CommandKind::ResolveDrillToUrlFilters,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A command together with the correlation id that links it to its event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub correlation_id: CorrelationId,
    #[serde(flatten)]
    pub command: Command,
}

impl CommandEnvelope {
    pub fn new(command: Command, correlation_id: Option<CorrelationId>) -> Self {
        Self {
            correlation_id: correlation_id.unwrap_or_else(CorrelationId::generate),
            command,
        }
    }
}
