// Dashboard document - the unit loaded wholesale into the engine
use super::filter::FilterContext;
use super::layout::Layout;
use serde::{Deserialize, Serialize};

/// Runtime settings that change how handlers behave.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    #[serde(default)]
    pub enable_filter_values_resolution_in_drill_events: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardPermissions {
    #[serde(default = "default_true")]
    pub can_edit_dashboard: bool,
}

impl Default for DashboardPermissions {
    fn default() -> Self {
        Self {
            can_edit_dashboard: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub filter_context: FilterContext,
    /// Overrides the engine's default settings when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<DashboardSettings>,
    #[serde(default)]
    pub permissions: DashboardPermissions,
}
