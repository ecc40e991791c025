// Layout domain model - sections, items and the stash
use super::refs::ObjRef;
use super::widget::Widget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const GRID_COLUMNS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Xs,
    Sm,
    Md,
    Lg,
    Xl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub grid_width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_height: Option<u32>,
}

/// Placement of an item, keyed by breakpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemSize(pub BTreeMap<Breakpoint, GridSize>);

impl ItemSize {
    pub fn xl(grid_width: u32, grid_height: Option<u32>) -> Self {
        let mut sizes = BTreeMap::new();
        sizes.insert(
            Breakpoint::Xl,
            GridSize {
                grid_width,
                grid_height,
            },
        );
        Self(sizes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub size: ItemSize,
    pub widget: Widget,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<SectionHeader>,
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Layout {
    pub fn widgets(&self) -> impl Iterator<Item = &Widget> {
        self.sections
            .iter()
            .flat_map(|section| section.items.iter().map(|item| &item.widget))
    }

    pub fn find_widget(&self, obj_ref: &ObjRef) -> Option<&Widget> {
        self.widgets().find(|widget| widget.matches(obj_ref))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StashId(pub String);

impl StashId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for StashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type Stash = BTreeMap<StashId, Vec<Item>>;

/// Item as it appears in a command payload: either a full item or a stash to splice in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemDefinition {
    Stashed { stash: StashId },
    Item(Item),
}

impl From<Item> for ItemDefinition {
    fn from(item: Item) -> Self {
        ItemDefinition::Item(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::widget::{KpiWidget, WidgetFilterSettings, WidgetRef};

    fn kpi(identifier: &str) -> Item {
        Item {
            size: ItemSize::xl(2, None),
            widget: Widget::Kpi(KpiWidget {
                reference: Some(WidgetRef {
                    identifier: identifier.to_string(),
                    uri: format!("/widgets/{}", identifier),
                }),
                title: identifier.to_string(),
                description: None,
                measure: ObjRef::identifier("m1"),
                filter_settings: WidgetFilterSettings::default(),
            }),
        }
    }

    #[test]
    fn test_find_widget_across_sections() {
        let layout = Layout {
            sections: vec![
                Section {
                    header: None,
                    items: vec![kpi("a")],
                },
                Section {
                    header: None,
                    items: vec![kpi("b"), kpi("c")],
                },
            ],
        };

        assert_eq!(layout.widgets().count(), 3);
        assert_eq!(
            layout.find_widget(&ObjRef::uri("/widgets/c")).map(|w| w.title()),
            Some("c")
        );
        assert!(layout.find_widget(&ObjRef::identifier("z")).is_none());
    }

    #[test]
    fn test_item_definition_parses_stash_reference() {
        let definition: ItemDefinition = serde_json::from_str(r#"{"stash": "s1"}"#).unwrap();
        assert_eq!(
            definition,
            ItemDefinition::Stashed {
                stash: StashId::new("s1")
            }
        );
    }
}
