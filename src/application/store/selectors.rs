// Selectors - read accessors over a state snapshot
use super::state::DashboardState;
use crate::domain::catalog::Catalog;
use crate::domain::dashboard::DashboardSettings;
use crate::domain::filter::FilterContext;
use crate::domain::layout::{Layout, Stash};
use crate::domain::refs::ObjRef;
use crate::domain::widget::Widget;

pub fn select_layout(state: &DashboardState) -> &Layout {
    &state.layout.layout
}

pub fn select_stash(state: &DashboardState) -> &Stash {
    &state.layout.stash
}

pub fn select_section_count(state: &DashboardState) -> usize {
    state.layout.layout.sections.len()
}

pub fn select_filter_context(state: &DashboardState) -> &FilterContext {
    &state.filter_context
}

pub fn select_catalog(state: &DashboardState) -> &Catalog {
    &state.catalog
}

pub fn select_settings(state: &DashboardState) -> &DashboardSettings {
    &state.config.settings
}

pub fn select_can_edit_dashboard(state: &DashboardState) -> bool {
    state.permissions.can_edit_dashboard
}

pub fn select_widget<'a>(state: &'a DashboardState, widget: &ObjRef) -> Option<&'a Widget> {
    state.layout.layout.find_widget(widget)
}
