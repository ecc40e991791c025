// In-memory backend implementation of the catalog, insight and element collaborators
use crate::application::backend::{CatalogService, ElementsPage, ElementsQuery, ElementsRequest, InsightLoader};
use crate::domain::catalog::{AttributeElement, Catalog, CatalogDateDataset, CatalogLookup, Insight};
use crate::domain::filter::{AttributeElements, DashboardFilter};
use crate::domain::refs::ObjRef;
use crate::infrastructure::config::{BackendFixture, DisplayFormElements, FactRow};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    fixture: BackendFixture,
    latency: Duration,
    object_latency: HashMap<String, Duration>,
    failing: HashSet<&'static str>,
}

impl InMemoryBackend {
    pub fn new(fixture: BackendFixture) -> Self {
        Self {
            fixture,
            ..Self::default()
        }
    }

    /// Delay applied to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Extra delay for calls touching the object with this identifier.
    pub fn with_object_latency(mut self, identifier: impl Into<String>, latency: Duration) -> Self {
        self.object_latency.insert(identifier.into(), latency);
        self
    }

    /// Make an operation fail, e.g. `"load_insights"`.
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    fn check_available(&self, operation: &'static str) -> Result<()> {
        if self.failing.contains(operation) {
            bail!("backend rejected {}: service unavailable", operation);
        }
        Ok(())
    }

    /// Canonical identifier of a ref, resolving uris through known metadata.
    fn identifier_of(&self, obj_ref: &ObjRef) -> Option<String> {
        match obj_ref {
            ObjRef::Identifier(id) => Some(id.clone()),
            ObjRef::Uri(_) => {
                let catalog = &self.fixture.catalog;
                self.fixture
                    .insights
                    .iter()
                    .map(|i| &i.meta)
                    .chain(catalog.measures.iter().map(|m| &m.measure))
                    .chain(catalog.date_datasets.iter().map(|d| &d.data_set))
                    .chain(catalog.attributes.iter().flat_map(|a| a.display_forms.iter()))
                    .find(|meta| meta.matches(obj_ref))
                    .map(|meta| meta.identifier.clone())
            }
        }
    }

    fn same_object(&self, a: &ObjRef, b: &ObjRef) -> bool {
        let id = self.identifier_of(a);
        id.is_some() && id == self.identifier_of(b)
    }

    fn elements_of(&self, display_form: &ObjRef) -> Option<&DisplayFormElements> {
        self.fixture
            .elements
            .iter()
            .find(|e| self.same_object(&e.display_form, display_form))
    }

    fn rows_with<'a>(&'a self, uri: &'a str) -> impl Iterator<Item = &'a FactRow> + 'a {
        self.fixture
            .rows
            .iter()
            .filter(move |row| row.elements.iter().any(|e| e == uri))
    }

    /// Element uris a filter selection names; values are matched against element titles.
    fn selected_uris(&self, display_form: &ObjRef, elements: &AttributeElements) -> Vec<String> {
        match elements {
            AttributeElements::Uris(uris) => uris.clone(),
            AttributeElements::Values(titles) => self
                .elements_of(display_form)
                .map(|source| {
                    source
                        .items
                        .iter()
                        .filter(|element| titles.contains(&element.title))
                        .map(|element| element.uri.clone())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    fn passes_limiting_filter(
        &self,
        request: &ElementsRequest,
        element: &AttributeElement,
        filter: &DashboardFilter,
    ) -> bool {
        let (display_form, elements, positive) = match filter {
            DashboardFilter::PositiveAttribute { display_form, elements } => (display_form, elements, true),
            DashboardFilter::NegativeAttribute { display_form, elements } => {
                if elements.is_empty() {
                    return true;
                }
                (display_form, elements, false)
            }
            DashboardFilter::RelativeDate { .. } | DashboardFilter::AbsoluteDate { .. } => {
                tracing::debug!("Ignoring limiting date filter, the fixture has no dates");
                return true;
            }
        };
        let selected = self.selected_uris(display_form, elements);

        if self.same_object(display_form, &request.display_form) {
            return selected.contains(&element.uri) == positive;
        }
        // at most one element of each display form per row
        self.rows_with(&element.uri).any(|row| {
            let hit = row.elements.iter().any(|uri| selected.contains(uri));
            hit == positive
        })
    }

    fn passes_limiting_measures(&self, request: &ElementsRequest, element: &AttributeElement) -> bool {
        request.limiting_measures.iter().all(|measure| {
            self.rows_with(&element.uri)
                .any(|row| row.measures.iter().any(|m| self.same_object(m, measure)))
        })
    }

    async fn simulate_latency(&self, refs: &[ObjRef]) {
        let extra = refs
            .iter()
            .filter_map(|r| self.identifier_of(r))
            .filter_map(|id| self.object_latency.get(&id).copied())
            .max()
            .unwrap_or_default();

        let delay = self.latency + extra;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CatalogService for InMemoryBackend {
    async fn load_catalog(&self) -> Result<Catalog> {
        self.simulate_latency(&[]).await;
        self.check_available("load_catalog")?;
        Ok(self.fixture.catalog.clone())
    }

    async fn resolve_catalog_items(&self, refs: &[ObjRef]) -> Result<CatalogLookup> {
        self.simulate_latency(refs).await;
        self.check_available("resolve_catalog_items")?;

        let mut lookup = CatalogLookup::default();
        for obj_ref in refs {
            match self.fixture.catalog.find(obj_ref) {
                Some(item) => lookup.found.push(item),
                None => lookup.missing.push(obj_ref.clone()),
            }
        }

        tracing::debug!(
            "Resolved {} catalog items, {} missing",
            lookup.found.len(),
            lookup.missing.len()
        );
        Ok(lookup)
    }

    async fn related_date_datasets(&self, target: &ObjRef) -> Result<Vec<CatalogDateDataset>> {
        self.simulate_latency(std::slice::from_ref(target)).await;
        self.check_available("related_date_datasets")?;

        Ok(self
            .fixture
            .related_date_datasets
            .iter()
            .find(|related| self.same_object(&related.target, target))
            .map(|related| related.data_sets.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl InsightLoader for InMemoryBackend {
    async fn load_insights(&self, refs: &[ObjRef]) -> Result<Vec<Insight>> {
        self.simulate_latency(refs).await;
        self.check_available("load_insights")?;

        Ok(self
            .fixture
            .insights
            .iter()
            .filter(|insight| refs.iter().any(|r| insight.matches(r)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ElementsQuery for InMemoryBackend {
    async fn query_elements(&self, request: ElementsRequest) -> Result<ElementsPage> {
        self.simulate_latency(std::slice::from_ref(&request.display_form)).await;
        self.check_available("query_elements")?;

        let Some(source) = self.elements_of(&request.display_form) else {
            bail!("unknown display form {}", request.display_form);
        };

        let search = request.search.as_ref().map(|s| s.to_lowercase());
        let matching: Vec<_> = source
            .items
            .iter()
            .filter(|element| {
                search
                    .as_ref()
                    .is_none_or(|needle| element.title.to_lowercase().contains(needle))
            })
            .filter(|element| {
                request
                    .uris
                    .as_ref()
                    .is_none_or(|uris| uris.contains(&element.uri))
            })
            .filter(|element| {
                request
                    .limiting_filters
                    .iter()
                    .all(|filter| self.passes_limiting_filter(&request, element, filter))
            })
            .filter(|element| self.passes_limiting_measures(&request, element))
            .collect();

        let items = matching
            .iter()
            .skip(request.offset)
            .take(request.limit)
            .map(|element| (*element).clone())
            .collect();

        Ok(ElementsPage {
            items,
            offset: request.offset,
            limit: request.limit,
            total_count: matching.len(),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::catalog::{AttributeElement, CatalogAttribute, CatalogMeasure};
    use crate::domain::filter::{AttributeElements, DashboardFilter};
    use crate::domain::refs::MetadataObject;
    use crate::infrastructure::config::RelatedDateDatasets;

    fn row(elements: &[&str], measures: &[&str]) -> FactRow {
        FactRow {
            elements: elements.iter().map(|e| e.to_string()).collect(),
            measures: measures.iter().map(|m| ObjRef::identifier(*m)).collect(),
        }
    }

    /// Small sales workspace used across the engine tests.
    pub fn sales_fixture() -> BackendFixture {
        BackendFixture {
            catalog: Catalog {
                attributes: vec![CatalogAttribute {
                    attribute: MetadataObject::new("region", "/obj/1", "Region"),
                    display_forms: vec![MetadataObject::new("region.name", "/obj/2", "Region name")],
                }],
                measures: vec![
                    CatalogMeasure {
                        measure: MetadataObject::new("revenue", "/obj/3", "Revenue"),
                    },
                    CatalogMeasure {
                        measure: MetadataObject::new("won", "/obj/4", "Won deals"),
                    },
                ],
                date_datasets: vec![
                    CatalogDateDataset {
                        data_set: MetadataObject::new("created", "/obj/10", "Date (Created)"),
                        relevance: 1,
                    },
                    CatalogDateDataset {
                        data_set: MetadataObject::new("closed", "/obj/11", "Date (Closed)"),
                        relevance: 0,
                    },
                ],
            },
            insights: vec![
                Insight {
                    meta: MetadataObject::new("pipeline", "/obj/20", "Pipeline"),
                    filters: vec![DashboardFilter::PositiveAttribute {
                        display_form: ObjRef::identifier("region.name"),
                        elements: AttributeElements::Values(vec!["EMEA".to_string()]),
                    }],
                },
                Insight {
                    meta: MetadataObject::new("forecast", "/obj/21", "Forecast"),
                    filters: vec![],
                },
            ],
            related_date_datasets: vec![RelatedDateDatasets {
                target: ObjRef::identifier("pipeline"),
                data_sets: vec![
                    CatalogDateDataset {
                        data_set: MetadataObject::new("closed", "/obj/11", "Date (Closed)"),
                        relevance: 1,
                    },
                    CatalogDateDataset {
                        data_set: MetadataObject::new("created", "/obj/10", "Date (Created)"),
                        relevance: 3,
                    },
                ],
            }],
            elements: vec![DisplayFormElements {
                display_form: ObjRef::identifier("region.name"),
                items: vec![
                    AttributeElement {
                        uri: "/obj/2/elements?id=1".to_string(),
                        title: "EMEA".to_string(),
                    },
                    AttributeElement {
                        uri: "/obj/2/elements?id=2".to_string(),
                        title: "Americas".to_string(),
                    },
                    AttributeElement {
                        uri: "/obj/2/elements?id=3".to_string(),
                        title: "APAC".to_string(),
                    },
                ],
            }],
            // products live only in the rows
            rows: vec![
                row(&["/obj/2/elements?id=1", "/obj/6/elements?id=1"], &["revenue", "won"]),
                row(&["/obj/2/elements?id=2", "/obj/6/elements?id=2"], &["revenue"]),
                row(&["/obj/2/elements?id=3", "/obj/6/elements?id=1"], &[]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::sales_fixture;
    use super::*;

    #[tokio::test]
    async fn test_resolve_catalog_items_reports_missing() {
        let backend = InMemoryBackend::new(sales_fixture());
        let lookup = backend
            .resolve_catalog_items(&[ObjRef::uri("/obj/3"), ObjRef::identifier("nope")])
            .await
            .unwrap();

        assert_eq!(lookup.found.len(), 1);
        assert_eq!(lookup.missing, vec![ObjRef::identifier("nope")]);
    }

    #[tokio::test]
    async fn test_related_date_datasets_resolve_uri_targets() {
        let backend = InMemoryBackend::new(sales_fixture());
        let related = backend.related_date_datasets(&ObjRef::uri("/obj/20")).await.unwrap();
        assert_eq!(related.len(), 2);

        let none = backend.related_date_datasets(&ObjRef::identifier("forecast")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_query_elements_pages_and_searches() {
        let backend = InMemoryBackend::new(sales_fixture());

        let page = backend
            .query_elements(ElementsRequest::page(ObjRef::identifier("region.name"), 1, 1))
            .await
            .unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.items[0].title, "Americas");

        let mut request = ElementsRequest::page(ObjRef::uri("/obj/2"), 0, 10);
        request.search = Some("ap".to_string());
        let page = backend.query_elements(request).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].title, "APAC");
    }

    fn titles(page: &ElementsPage) -> Vec<&str> {
        page.items.iter().map(|e| e.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_limiting_filters_keep_co_occurring_elements() {
        let backend = InMemoryBackend::new(sales_fixture());
        let product = ObjRef::identifier("product.name");

        let mut request = ElementsRequest::page(ObjRef::identifier("region.name"), 0, 10);
        request.limiting_filters = vec![DashboardFilter::PositiveAttribute {
            display_form: product.clone(),
            elements: AttributeElements::Uris(vec!["/obj/6/elements?id=1".to_string()]),
        }];
        let page = backend.query_elements(request.clone()).await.unwrap();
        assert_eq!(titles(&page), vec!["EMEA", "APAC"]);

        request.limiting_filters = vec![DashboardFilter::NegativeAttribute {
            display_form: product,
            elements: AttributeElements::Uris(vec!["/obj/6/elements?id=1".to_string()]),
        }];
        let page = backend.query_elements(request.clone()).await.unwrap();
        assert_eq!(titles(&page), vec!["Americas"]);

        request.limiting_filters = vec![DashboardFilter::NegativeAttribute {
            display_form: ObjRef::uri("/obj/2"),
            elements: AttributeElements::Values(vec!["EMEA".to_string()]),
        }];
        let page = backend.query_elements(request).await.unwrap();
        assert_eq!(page.total_count, 2);
    }

    #[tokio::test]
    async fn test_limiting_measures_need_data() {
        let backend = InMemoryBackend::new(sales_fixture());
        let mut request = ElementsRequest::page(ObjRef::identifier("region.name"), 0, 10);

        request.limiting_measures = vec![ObjRef::uri("/obj/4")];
        let page = backend.query_elements(request.clone()).await.unwrap();
        assert_eq!(titles(&page), vec!["EMEA"]);

        request.limiting_measures = vec![ObjRef::identifier("revenue")];
        let page = backend.query_elements(request).await.unwrap();
        assert_eq!(page.total_count, 2);
    }

    #[tokio::test]
    async fn test_failing_operation_returns_error() {
        let backend = InMemoryBackend::new(sales_fixture()).failing("load_insights");
        let error = backend
            .load_insights(&[ObjRef::identifier("pipeline")])
            .await
            .unwrap_err();
        assert!(error.to_string().contains("load_insights"));
    }
}
