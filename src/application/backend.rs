// Collaborator traits - catalog, insight and element lookups injected into the engine
use crate::domain::catalog::{AttributeElement, Catalog, CatalogDateDataset, CatalogLookup, Insight};
use crate::domain::filter::DashboardFilter;
use crate::domain::refs::ObjRef;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct ElementsRequest {
    pub display_form: ObjRef,
    pub offset: usize,
    pub limit: usize,
    pub search: Option<String>,
    /// Restrict the page to these element uris.
    pub uris: Option<Vec<String>>,
    /// Keep only elements that occur together with the selection of these attribute filters.
    pub limiting_filters: Vec<DashboardFilter>,
    /// Keep only elements for which these measures have data.
    pub limiting_measures: Vec<ObjRef>,
}

impl ElementsRequest {
    pub fn page(display_form: ObjRef, offset: usize, limit: usize) -> Self {
        Self {
            display_form,
            offset,
            limit,
            search: None,
            uris: None,
            limiting_filters: Vec::new(),
            limiting_measures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementsPage {
    pub items: Vec<AttributeElement>,
    pub offset: usize,
    pub limit: usize,
    pub total_count: usize,
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Load the whole catalog of the workspace
    async fn load_catalog(&self) -> anyhow::Result<Catalog>;

    /// Look up individual catalog items; unknown refs are reported in `missing`
    async fn resolve_catalog_items(&self, refs: &[ObjRef]) -> anyhow::Result<CatalogLookup>;

    /// Date datasets related to an insight or measure, with relevance scores
    async fn related_date_datasets(&self, target: &ObjRef) -> anyhow::Result<Vec<CatalogDateDataset>>;
}

#[async_trait]
pub trait InsightLoader: Send + Sync {
    /// Load insight definitions; refs the backend does not know are left out
    async fn load_insights(&self, refs: &[ObjRef]) -> anyhow::Result<Vec<Insight>>;
}

#[async_trait]
pub trait ElementsQuery: Send + Sync {
    async fn query_elements(&self, request: ElementsRequest) -> anyhow::Result<ElementsPage>;
}

/// Every collaborator a handler may call through.
#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<dyn CatalogService>,
    pub insights: Arc<dyn InsightLoader>,
    pub elements: Arc<dyn ElementsQuery>,
}

impl Services {
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: CatalogService + InsightLoader + ElementsQuery + 'static,
    {
        Self {
            catalog: backend.clone(),
            insights: backend.clone(),
            elements: backend,
        }
    }
}
