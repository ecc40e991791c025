// Widget domain model - KPI and insight widgets, definitions and persisted
use super::refs::ObjRef;
use serde::{Deserialize, Serialize};

/// Reference assigned to a widget once it has an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WidgetRef {
    pub identifier: String,
    pub uri: String,
}

impl WidgetRef {
    pub fn matches(&self, obj_ref: &ObjRef) -> bool {
        match obj_ref {
            ObjRef::Identifier(id) => &self.identifier == id,
            ObjRef::Uri(uri) => &self.uri == uri,
        }
    }
}

/// Per-widget overrides of the dashboard filter context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetFilterSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_dataset: Option<ObjRef>,
    /// Display forms of attribute filters the widget ignores.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_dashboard_filters: Vec<ObjRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiWidget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<WidgetRef>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub measure: ObjRef,
    #[serde(flatten)]
    pub filter_settings: WidgetFilterSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightWidget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<WidgetRef>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub insight: ObjRef,
    #[serde(flatten)]
    pub filter_settings: WidgetFilterSettings,
}

/// A widget is a definition exactly when it carries no reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Widget {
    Kpi(KpiWidget),
    Insight(InsightWidget),
}

impl Widget {
    pub fn reference(&self) -> Option<&WidgetRef> {
        match self {
            Widget::Kpi(kpi) => kpi.reference.as_ref(),
            Widget::Insight(insight) => insight.reference.as_ref(),
        }
    }

    pub fn set_reference(&mut self, reference: WidgetRef) {
        match self {
            Widget::Kpi(kpi) => kpi.reference = Some(reference),
            Widget::Insight(insight) => insight.reference = Some(reference),
        }
    }

    pub fn is_definition(&self) -> bool {
        self.reference().is_none()
    }

    pub fn matches(&self, obj_ref: &ObjRef) -> bool {
        self.reference().is_some_and(|r| r.matches(obj_ref))
    }

    pub fn title(&self) -> &str {
        match self {
            Widget::Kpi(kpi) => &kpi.title,
            Widget::Insight(insight) => &insight.title,
        }
    }

    pub fn filter_settings(&self) -> &WidgetFilterSettings {
        match self {
            Widget::Kpi(kpi) => &kpi.filter_settings,
            Widget::Insight(insight) => &insight.filter_settings,
        }
    }

    pub fn filter_settings_mut(&mut self) -> &mut WidgetFilterSettings {
        match self {
            Widget::Kpi(kpi) => &mut kpi.filter_settings,
            Widget::Insight(insight) => &mut insight.filter_settings,
        }
    }

    /// The metadata object the widget visualizes: the insight or the KPI measure.
    pub fn target(&self) -> &ObjRef {
        match self {
            Widget::Kpi(kpi) => &kpi.measure,
            Widget::Insight(insight) => &insight.insight,
        }
    }
}
