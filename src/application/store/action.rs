// Slice actions and batches - the only way state changes
use super::state::{ConfigSlice, DashboardState, LayoutSlice};
use crate::application::command::{Command, CorrelationId};
use crate::domain::catalog::{Catalog, Insight};
use crate::domain::dashboard::DashboardPermissions;
use crate::domain::filter::{AttributeElements, DashboardDateFilter, FilterContext, FilterContextItem};
use crate::domain::layout::{Item, Layout, Section, StashId};

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutAction {
    Replace(Layout),
    AddSection {
        section: Section,
        index: usize,
        used_stashes: Vec<StashId>,
    },
    RemoveSection {
        index: usize,
        stash_identifier: Option<StashId>,
    },
    MoveSection {
        from: usize,
        to: usize,
    },
    AddSectionItems {
        section_index: usize,
        item_index: usize,
        items: Vec<Item>,
        used_stashes: Vec<StashId>,
    },
    RemoveSectionItem {
        section_index: usize,
        item_index: usize,
        stash_identifier: Option<StashId>,
        eager: bool,
    },
    Restore(LayoutSlice),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterContextAction {
    Replace(FilterContext),
    SetAttributeFilterSelection {
        local_id: String,
        elements: AttributeElements,
        negative_selection: bool,
    },
    SetDateFilter(Option<DashboardDateFilter>),
    Restore(FilterContext),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsightsAction {
    Add(Vec<Insight>),
    Replace(Vec<Insight>),
}

/// Slices in the order a batch applies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SliceKind {
    Insights,
    Catalog,
    Config,
    Permissions,
    FilterContext,
    Layout,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Insights(InsightsAction),
    Catalog(Catalog),
    Config(ConfigSlice),
    Permissions(DashboardPermissions),
    FilterContext(FilterContextAction),
    Layout(LayoutAction),
}

impl Action {
    pub fn slice(&self) -> SliceKind {
        match self {
            Action::Insights(_) => SliceKind::Insights,
            Action::Catalog(_) => SliceKind::Catalog,
            Action::Config(_) => SliceKind::Config,
            Action::Permissions(_) => SliceKind::Permissions,
            Action::FilterContext(_) => SliceKind::FilterContext,
            Action::Layout(_) => SliceKind::Layout,
        }
    }

    /// Applies the action in place.
    ///
    /// Handlers validate against the same state in their commit phase, so an
    /// out-of-range index here is a bug in the handler and panics.
    pub(super) fn apply(self, state: &mut DashboardState) {
        match self {
            Action::Insights(InsightsAction::Add(insights)) => {
                for insight in insights {
                    state.insights.upsert(insight);
                }
            }
            Action::Insights(InsightsAction::Replace(insights)) => state.insights.replace(insights),
            Action::Catalog(catalog) => state.catalog = catalog,
            Action::Config(config) => state.config = config,
            Action::Permissions(permissions) => state.permissions = permissions,
            Action::FilterContext(action) => apply_filter_context(&mut state.filter_context, action),
            Action::Layout(action) => apply_layout(&mut state.layout, action),
        }
    }
}

fn apply_filter_context(filter_context: &mut FilterContext, action: FilterContextAction) {
    match action {
        FilterContextAction::Replace(replacement) | FilterContextAction::Restore(replacement) => {
            *filter_context = replacement;
        }
        FilterContextAction::SetAttributeFilterSelection {
            local_id,
            elements,
            negative_selection,
        } => {
            let filter = filter_context
                .filters
                .iter_mut()
                .find_map(|item| match item {
                    FilterContextItem::Attribute(attr) if attr.local_id == local_id => Some(attr),
                    _ => None,
                })
                .unwrap_or_else(|| panic!("attribute filter {} is not in the filter context", local_id));

            tracing::debug!(
                "Attribute filter {} now selects {} elements",
                local_id,
                elements.len()
            );
            filter.elements = elements;
            filter.negative_selection = negative_selection;
        }
        FilterContextAction::SetDateFilter(date_filter) => {
            let position = filter_context
                .filters
                .iter()
                .position(|item| matches!(item, FilterContextItem::Date(_)));

            match (position, date_filter) {
                (Some(idx), Some(filter)) => filter_context.filters[idx] = FilterContextItem::Date(filter),
                (Some(idx), None) => {
                    filter_context.filters.remove(idx);
                }
                // the date filter always leads the context
                (None, Some(filter)) => filter_context.filters.insert(0, FilterContextItem::Date(filter)),
                (None, None) => {}
            }
        }
    }
}

fn apply_layout(slice: &mut LayoutSlice, action: LayoutAction) {
    let sections = &mut slice.layout.sections;

    match action {
        LayoutAction::Replace(layout) => {
            slice.layout = layout;
            slice.stash.clear();
        }
        LayoutAction::AddSection {
            section,
            index,
            used_stashes,
        } => {
            assert!(index <= sections.len(), "section index {} out of bounds", index);
            sections.insert(index, section);
            consume_stashes(slice, &used_stashes);
        }
        LayoutAction::RemoveSection {
            index,
            stash_identifier,
        } => {
            assert!(index < sections.len(), "section index {} out of bounds", index);
            let section = sections.remove(index);
            if let Some(stash_id) = stash_identifier {
                slice.stash.insert(stash_id, section.items);
            }
        }
        LayoutAction::MoveSection { from, to } => {
            assert!(
                from < sections.len() && to < sections.len(),
                "section move {} -> {} out of bounds",
                from,
                to
            );
            let section = sections.remove(from);
            sections.insert(to, section);
        }
        LayoutAction::AddSectionItems {
            section_index,
            item_index,
            items,
            used_stashes,
        } => {
            let section = sections
                .get_mut(section_index)
                .unwrap_or_else(|| panic!("section index {} out of bounds", section_index));
            assert!(item_index <= section.items.len(), "item index {} out of bounds", item_index);
            section.items.splice(item_index..item_index, items);
            consume_stashes(slice, &used_stashes);
        }
        LayoutAction::RemoveSectionItem {
            section_index,
            item_index,
            stash_identifier,
            eager,
        } => {
            let section = sections
                .get_mut(section_index)
                .unwrap_or_else(|| panic!("section index {} out of bounds", section_index));
            assert!(item_index < section.items.len(), "item index {} out of bounds", item_index);
            let item = section.items.remove(item_index);
            if eager && section.items.is_empty() {
                sections.remove(section_index);
            }
            if let Some(stash_id) = stash_identifier {
                slice.stash.insert(stash_id, vec![item]);
            }
        }
        LayoutAction::Restore(previous) => *slice = previous,
    }
}

fn consume_stashes(slice: &mut LayoutSlice, used: &[StashId]) {
    for stash_id in used {
        slice.stash.remove(stash_id);
    }
}

/// What a batch does to the undo stack.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoEffect {
    Skip,
    Record {
        correlation_id: CorrelationId,
        command: Command,
    },
    Pop,
    Clear,
}

/// Actions applied as one indivisible state transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub actions: Vec<Action>,
    pub undo: UndoEffect,
}

impl Batch {
    pub fn new(actions: Vec<Action>, undo: UndoEffect) -> Self {
        Self { actions, undo }
    }
}
