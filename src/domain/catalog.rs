// Catalog domain model - attributes, measures, date datasets and insights
use super::filter::DashboardFilter;
use super::refs::{MetadataObject, ObjRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogAttribute {
    pub attribute: MetadataObject,
    #[serde(default)]
    pub display_forms: Vec<MetadataObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMeasure {
    pub measure: MetadataObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDateDataset {
    pub data_set: MetadataObject,
    #[serde(default)]
    pub relevance: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CatalogItem {
    Attribute(CatalogAttribute),
    Measure(CatalogMeasure),
    DateDataset(CatalogDateDataset),
}

impl CatalogItem {
    pub fn matches(&self, obj_ref: &ObjRef) -> bool {
        match self {
            CatalogItem::Attribute(attr) => {
                attr.attribute.matches(obj_ref)
                    || attr.display_forms.iter().any(|df| df.matches(obj_ref))
            }
            CatalogItem::Measure(measure) => measure.measure.matches(obj_ref),
            CatalogItem::DateDataset(ds) => ds.data_set.matches(obj_ref),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub attributes: Vec<CatalogAttribute>,
    #[serde(default)]
    pub measures: Vec<CatalogMeasure>,
    #[serde(default)]
    pub date_datasets: Vec<CatalogDateDataset>,
}

impl Catalog {
    pub fn measure(&self, obj_ref: &ObjRef) -> Option<&CatalogMeasure> {
        self.measures.iter().find(|m| m.measure.matches(obj_ref))
    }

    pub fn date_dataset(&self, obj_ref: &ObjRef) -> Option<&CatalogDateDataset> {
        self.date_datasets.iter().find(|ds| ds.data_set.matches(obj_ref))
    }

    pub fn display_form(&self, obj_ref: &ObjRef) -> Option<&MetadataObject> {
        self.attributes
            .iter()
            .flat_map(|attr| attr.display_forms.iter())
            .find(|df| df.matches(obj_ref))
    }

    /// Whether two refs name the same display form, one possibly by uri and the other by identifier.
    pub fn same_display_form(&self, a: &ObjRef, b: &ObjRef) -> bool {
        if a == b {
            return true;
        }
        match (self.display_form(a), self.display_form(b)) {
            (Some(left), Some(right)) => left.identifier == right.identifier,
            _ => false,
        }
    }

    pub fn find(&self, obj_ref: &ObjRef) -> Option<CatalogItem> {
        if let Some(measure) = self.measure(obj_ref) {
            return Some(CatalogItem::Measure(measure.clone()));
        }
        if let Some(ds) = self.date_dataset(obj_ref) {
            return Some(CatalogItem::DateDataset(ds.clone()));
        }
        self.attributes
            .iter()
            .find(|attr| {
                attr.attribute.matches(obj_ref) || attr.display_forms.iter().any(|df| df.matches(obj_ref))
            })
            .map(|attr| CatalogItem::Attribute(attr.clone()))
    }
}

/// Result of a catalog lookup: what was found and what the backend does not know.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogLookup {
    pub found: Vec<CatalogItem>,
    pub missing: Vec<ObjRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(flatten)]
    pub meta: MetadataObject,
    #[serde(default)]
    pub filters: Vec<DashboardFilter>,
}

impl Insight {
    pub fn matches(&self, obj_ref: &ObjRef) -> bool {
        self.meta.matches(obj_ref)
    }
}

/// Attribute element as returned by an elements query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeElement {
    pub uri: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_resolves_display_forms_to_their_attribute() {
        let catalog = Catalog {
            attributes: vec![CatalogAttribute {
                attribute: MetadataObject::new("region", "/obj/1", "Region"),
                display_forms: vec![MetadataObject::new("region.name", "/obj/2", "Region name")],
            }],
            measures: vec![CatalogMeasure {
                measure: MetadataObject::new("revenue", "/obj/3", "Revenue"),
            }],
            date_datasets: vec![],
        };

        match catalog.find(&ObjRef::uri("/obj/2")) {
            Some(CatalogItem::Attribute(attr)) => assert_eq!(attr.attribute.identifier, "region"),
            other => panic!("unexpected lookup result: {:?}", other),
        }
        assert!(catalog.measure(&ObjRef::identifier("revenue")).is_some());
        assert!(catalog.find(&ObjRef::identifier("missing")).is_none());
    }
}
