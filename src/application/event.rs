// Events - terminal outcomes of commands, linked by correlation id
use crate::application::command::{CommandKind, CorrelationId};
use crate::application::error::CommandError;
use crate::domain::filter::{DashboardDateFilter, DashboardAttributeFilter, DashboardFilter};
use crate::domain::layout::{Item, Section, StashId};
use crate::domain::refs::ObjRef;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDateRange {
    pub data_set: ObjRef,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Human-readable values of the filters passed along with a drill.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedFilterValues {
    /// Display form → element uri (or value) → element title.
    pub attribute_filters: BTreeMap<String, BTreeMap<String, String>>,
    pub date_filters: Vec<ResolvedDateRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventBody {
    DashboardInitialized {
        title: String,
        section_count: usize,
    },
    LayoutSectionAdded {
        section: Section,
        index: usize,
    },
    LayoutSectionRemoved {
        section: Section,
        index: usize,
        stash_identifier: Option<StashId>,
    },
    LayoutSectionMoved {
        section: Section,
        from: usize,
        to: usize,
    },
    SectionItemsAdded {
        section_index: usize,
        start_index: usize,
        items: Vec<Item>,
    },
    SectionItemRemoved {
        item: Item,
        section_index: usize,
        item_index: usize,
        section_removed: bool,
        stash_identifier: Option<StashId>,
    },
    LayoutChangesUndone {
        undone_command: CommandKind,
        undone_correlation_id: CorrelationId,
    },
    AttributeFilterSelectionChanged {
        filter: DashboardAttributeFilter,
    },
    DateFilterSelectionChanged {
        filter: Option<DashboardDateFilter>,
    },
    WidgetFiltersQueried {
        widget: ObjRef,
        filters: Vec<DashboardFilter>,
    },
    DrillToUrlFiltersResolved {
        widget: ObjRef,
        filters: Vec<DashboardFilter>,
        resolved_values: Option<ResolvedFilterValues>,
    },
    CommandFailed {
        error: CommandError,
        message: String,
    },
    CommandCancelled {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    DashboardInitialized,
    LayoutSectionAdded,
    LayoutSectionRemoved,
    LayoutSectionMoved,
    SectionItemsAdded,
    SectionItemRemoved,
    LayoutChangesUndone,
    AttributeFilterSelectionChanged,
    DateFilterSelectionChanged,
    WidgetFiltersQueried,
    DrillToUrlFiltersResolved,
    CommandFailed,
    CommandCancelled,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl EventBody {
    pub fn kind(&self) -> EventKind {
        match self {
            EventBody::DashboardInitialized { .. } => EventKind::DashboardInitialized,
            EventBody::LayoutSectionAdded { .. } => EventKind::LayoutSectionAdded,
            EventBody::LayoutSectionRemoved { .. } => EventKind::LayoutSectionRemoved,
            EventBody::LayoutSectionMoved { .. } => EventKind::LayoutSectionMoved,
            EventBody::SectionItemsAdded { .. } => EventKind::SectionItemsAdded,
            EventBody::SectionItemRemoved { .. } => EventKind::SectionItemRemoved,
            EventBody::LayoutChangesUndone { .. } => EventKind::LayoutChangesUndone,
            EventBody::AttributeFilterSelectionChanged { .. } => {
                EventKind::AttributeFilterSelectionChanged
            }
            EventBody::DateFilterSelectionChanged { .. } => EventKind::DateFilterSelectionChanged,
            EventBody::WidgetFiltersQueried { .. } => EventKind::WidgetFiltersQueried,
            EventBody::DrillToUrlFiltersResolved { .. } => EventKind::DrillToUrlFiltersResolved,
            EventBody::CommandFailed { .. } => EventKind::CommandFailed,
            EventBody::CommandCancelled { .. } => EventKind::CommandCancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardEvent {
    pub correlation_id: CorrelationId,
    pub command: CommandKind,
    /// Store version after the commit; `None` when nothing was committed.
    pub version: Option<u64>,
    #[serde(flatten)]
    pub body: EventBody,
}

impl DashboardEvent {
    pub fn succeeded(
        correlation_id: CorrelationId,
        command: CommandKind,
        version: Option<u64>,
        body: EventBody,
    ) -> Self {
        Self {
            correlation_id,
            command,
            version,
            body,
        }
    }

    pub fn failed(correlation_id: CorrelationId, command: CommandKind, error: CommandError) -> Self {
        let body = match error {
            CommandError::Cancelled { message } => EventBody::CommandCancelled { message },
            error => EventBody::CommandFailed {
                message: error.to_string(),
                error,
            },
        };

        Self {
            correlation_id,
            command,
            version: None,
            body,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.body.kind()
    }

    pub fn is_success(&self) -> bool {
        !matches!(
            self.body,
            EventBody::CommandFailed { .. } | EventBody::CommandCancelled { .. }
        )
    }

    pub fn error(&self) -> Option<&CommandError> {
        match &self.body {
            EventBody::CommandFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}
