// Dashboard state - the versioned document made of independent slices
use super::undo::UndoEntry;
use crate::domain::catalog::{Catalog, Insight};
use crate::domain::dashboard::{DashboardPermissions, DashboardSettings};
use crate::domain::filter::FilterContext;
use crate::domain::layout::{Layout, Stash};
use crate::domain::refs::ObjRef;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutSlice {
    pub layout: Layout,
    pub stash: Stash,
}

/// Insights known to the dashboard, keyed by their metadata identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightsSlice {
    insights: Vec<Insight>,
}

impl InsightsSlice {
    pub fn get(&self, obj_ref: &ObjRef) -> Option<&Insight> {
        self.insights.iter().find(|insight| insight.matches(obj_ref))
    }

    pub fn contains(&self, obj_ref: &ObjRef) -> bool {
        self.get(obj_ref).is_some()
    }

    pub fn len(&self) -> usize {
        self.insights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insights.is_empty()
    }

    pub fn all(&self) -> &[Insight] {
        &self.insights
    }

    pub(super) fn upsert(&mut self, insight: Insight) {
        match self
            .insights
            .iter_mut()
            .find(|known| known.meta.identifier == insight.meta.identifier)
        {
            Some(known) => *known = insight,
            None => self.insights.push(insight),
        }
    }

    pub(super) fn replace(&mut self, insights: Vec<Insight>) {
        self.insights.clear();
        for insight in insights {
            self.upsert(insight);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSlice {
    pub title: String,
    pub settings: DashboardSettings,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndoSlice {
    pub(super) entries: Vec<UndoEntry>,
}

impl UndoSlice {
    pub fn entries(&self) -> &[UndoEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&UndoEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Immutable snapshot published after every committed batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub version: u64,
    pub layout: LayoutSlice,
    pub filter_context: FilterContext,
    pub insights: InsightsSlice,
    pub catalog: Catalog,
    pub config: ConfigSlice,
    pub permissions: DashboardPermissions,
    pub undo: UndoSlice,
}
