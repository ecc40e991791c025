// Filter domain model - dashboard filter context and effective widget filters
use super::refs::ObjRef;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeElements {
    Uris(Vec<String>),
    Values(Vec<String>),
}

impl AttributeElements {
    pub fn items(&self) -> &[String] {
        match self {
            AttributeElements::Uris(items) | AttributeElements::Values(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardAttributeFilter {
    pub local_id: String,
    pub display_form: ObjRef,
    #[serde(default)]
    pub negative_selection: bool,
    pub elements: AttributeElements,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateGranularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl fmt::Display for DateGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DateGranularity::Day => "GDC.time.date",
            DateGranularity::Week => "GDC.time.week_us",
            DateGranularity::Month => "GDC.time.month",
            DateGranularity::Quarter => "GDC.time.quarter",
            DateGranularity::Year => "GDC.time.year",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilterType {
    Relative,
    Absolute,
}

/// Bound of a stored date filter; backends hand these out as numbers or strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Number(i64),
    Text(String),
}

impl DateValue {
    pub fn as_offset(&self) -> Option<i64> {
        match self {
            DateValue::Number(n) => Some(*n),
            DateValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            DateValue::Number(n) => n.to_string(),
            DateValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardDateFilter {
    pub filter_type: DateFilterType,
    pub granularity: DateGranularity,
    pub from: DateValue,
    pub to: DateValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set: Option<ObjRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterContextItem {
    Attribute(DashboardAttributeFilter),
    Date(DashboardDateFilter),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterContext {
    #[serde(default)]
    pub filters: Vec<FilterContextItem>,
}

impl FilterContext {
    pub fn attribute_filter(&self, local_id: &str) -> Option<&DashboardAttributeFilter> {
        self.filters.iter().find_map(|filter| match filter {
            FilterContextItem::Attribute(attribute) if attribute.local_id == local_id => {
                Some(attribute)
            }
            _ => None,
        })
    }

    pub fn date_filter(&self) -> Option<&DashboardDateFilter> {
        self.filters.iter().find_map(|filter| match filter {
            FilterContextItem::Date(date) => Some(date),
            _ => None,
        })
    }

    pub fn has_attribute_filter_for(&self, display_form: &ObjRef) -> bool {
        self.filters.iter().any(|filter| {
            matches!(filter, FilterContextItem::Attribute(attribute) if &attribute.display_form == display_form)
        })
    }
}

/// Filter as it applies to a single widget's execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DashboardFilter {
    PositiveAttribute {
        display_form: ObjRef,
        elements: AttributeElements,
    },
    NegativeAttribute {
        display_form: ObjRef,
        elements: AttributeElements,
    },
    RelativeDate {
        data_set: ObjRef,
        granularity: DateGranularity,
        from: i64,
        to: i64,
    },
    AbsoluteDate {
        data_set: ObjRef,
        from: String,
        to: String,
    },
}

impl DashboardFilter {
    pub fn is_attribute_filter(&self) -> bool {
        matches!(
            self,
            DashboardFilter::PositiveAttribute { .. } | DashboardFilter::NegativeAttribute { .. }
        )
    }
}
