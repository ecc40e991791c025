// Attribute filter element loader - paged element loading with its own cancellation
use crate::application::backend::{ElementsPage, ElementsQuery, ElementsRequest};
use crate::application::command::CorrelationId;
use crate::application::error::CommandError;
use crate::domain::catalog::AttributeElement;
use crate::domain::filter::DashboardFilter;
use crate::domain::refs::ObjRef;
use futures::Stream;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, watch};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadingStatus {
    Pending,
    Loading,
    Success,
    Error,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LoaderEvent {
    RangeLoadStart {
        correlation: Option<CorrelationId>,
        offset: usize,
        limit: usize,
    },
    RangeLoadSuccess {
        correlation: Option<CorrelationId>,
        offset: usize,
        limit: usize,
        items: Vec<AttributeElement>,
        total_count: usize,
    },
    RangeLoadError {
        correlation: Option<CorrelationId>,
        error: String,
    },
    RangeLoadCancel {
        correlation: Option<CorrelationId>,
    },
}

struct LoaderState {
    search: Option<String>,
    limiting_filters: Vec<DashboardFilter>,
    limiting_measures: Vec<ObjRef>,
    /// Loaded elements by their position in the (searched) element list.
    loaded: BTreeMap<usize, AttributeElement>,
    by_uri: BTreeMap<String, AttributeElement>,
    total_count: Option<usize>,
    status: LoadingStatus,
    generation: u64,
    in_flight: Option<watch::Sender<bool>>,
}

impl LoaderState {
    /// Forgets loaded elements and cancels the load in flight; its result is discarded.
    fn invalidate(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.send_replace(true);
        }
        self.generation += 1;
        self.loaded.clear();
        self.total_count = None;
        self.status = LoadingStatus::Pending;
    }
}

/// Loads the elements of one display form page by page.
///
/// Starting a range load cancels the one in flight. Cancelling a load never
/// affects dispatched commands.
#[derive(Clone)]
pub struct AttributeFilterLoader {
    display_form: ObjRef,
    query: Arc<dyn ElementsQuery>,
    state: Arc<Mutex<LoaderState>>,
    events: broadcast::Sender<LoaderEvent>,
}

impl AttributeFilterLoader {
    pub fn new(display_form: ObjRef, query: Arc<dyn ElementsQuery>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            display_form,
            query,
            state: Arc::new(Mutex::new(LoaderState {
                search: None,
                limiting_filters: Vec::new(),
                limiting_measures: Vec::new(),
                loaded: BTreeMap::new(),
                by_uri: BTreeMap::new(),
                total_count: None,
                status: LoadingStatus::Pending,
                generation: 0,
                in_flight: None,
            })),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: LoaderEvent) {
        // nobody listening is fine
        let _ = self.events.send(event);
    }

    pub fn display_form(&self) -> &ObjRef {
        &self.display_form
    }

    pub fn subscribe(&self) -> impl Stream<Item = LoaderEvent> + Send + 'static {
        BroadcastStream::new(self.events.subscribe()).filter_map(|event| event.ok())
    }

    /// Request for a page under the current search and limits.
    fn request(&self, state: &LoaderState, offset: usize, limit: usize) -> ElementsRequest {
        let mut request = ElementsRequest::page(self.display_form.clone(), offset, limit);
        request.search = state.search.clone();
        request.limiting_filters = state.limiting_filters.clone();
        request.limiting_measures = state.limiting_measures.clone();
        request
    }

    pub async fn load_elements_range(
        &self,
        offset: usize,
        limit: usize,
        correlation: Option<CorrelationId>,
    ) -> Result<ElementsPage, CommandError> {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let (generation, request) = {
            let mut state = self.lock();
            if let Some(previous) = state.in_flight.replace(cancel_tx) {
                previous.send_replace(true);
            }
            state.generation += 1;
            state.status = LoadingStatus::Loading;
            (state.generation, self.request(&state, offset, limit))
        };

        tracing::debug!(
            "Loading elements {}..{} of {}",
            offset,
            offset + limit,
            self.display_form
        );
        self.emit(LoaderEvent::RangeLoadStart {
            correlation: correlation.clone(),
            offset,
            limit,
        });

        let result = tokio::select! {
            biased;
            _ = cancel_rx.wait_for(|cancelled| *cancelled) => None,
            result = self.query.query_elements(request) => Some(result),
        };

        let mut state = self.lock();
        let current = state.generation == generation;
        if current {
            state.in_flight = None;
        }

        // a newer load or a settings change superseded this one
        let result = result.filter(|_| current);

        match result {
            None => {
                if current {
                    state.status = LoadingStatus::Cancelled;
                }
                drop(state);
                self.emit(LoaderEvent::RangeLoadCancel { correlation });
                Err(CommandError::cancelled("element load cancelled"))
            }
            Some(Err(error)) => {
                state.status = LoadingStatus::Error;
                drop(state);
                let error = CommandError::external("elements", error);
                tracing::warn!("Element load of {} failed: {}", self.display_form, error);
                self.emit(LoaderEvent::RangeLoadError {
                    correlation,
                    error: error.to_string(),
                });
                Err(error)
            }
            Some(Ok(page)) => {
                for (position, element) in page.items.iter().enumerate() {
                    state.loaded.insert(page.offset + position, element.clone());
                    state.by_uri.insert(element.uri.clone(), element.clone());
                }
                state.total_count = Some(page.total_count);
                state.status = LoadingStatus::Success;
                drop(state);
                self.emit(LoaderEvent::RangeLoadSuccess {
                    correlation,
                    offset: page.offset,
                    limit: page.limit,
                    items: page.items.clone(),
                    total_count: page.total_count,
                });
                Ok(page)
            }
        }
    }

    /// Cancels the load in flight; returns whether there was one.
    pub fn cancel_element_load(&self) -> bool {
        match self.lock().in_flight.take() {
            Some(cancel) => {
                cancel.send_replace(true);
                true
            }
            None => false,
        }
    }

    /// Changes the search used by later loads and forgets elements loaded so far.
    pub fn set_search(&self, search: impl Into<String>) {
        let search = search.into();
        let mut state = self.lock();
        state.search = (!search.trim().is_empty()).then_some(search);
        state.invalidate();
    }

    /// Limits later loads to elements occurring with the selection of these attribute filters.
    pub fn set_limiting_attribute_filters(&self, filters: Vec<DashboardFilter>) {
        let mut state = self.lock();
        state.limiting_filters = filters;
        state.invalidate();
    }

    /// Limits later loads to elements for which these measures have data.
    pub fn set_limiting_measures(&self, measures: Vec<ObjRef>) {
        let mut state = self.lock();
        state.limiting_measures = measures;
        state.invalidate();
    }

    /// Number of elements matching the current search and limits, whether loaded or not.
    pub async fn count_with_current_settings(&self) -> Result<usize, CommandError> {
        let request = {
            let state = self.lock();
            self.request(&state, 0, 0)
        };
        let page = self
            .query
            .query_elements(request)
            .await
            .map_err(|e| CommandError::external("elements", e))?;
        Ok(page.total_count)
    }

    pub fn search(&self) -> Option<String> {
        self.lock().search.clone()
    }

    /// Elements of the current search in list order.
    pub fn all_items(&self) -> Vec<AttributeElement> {
        self.lock().loaded.values().cloned().collect()
    }

    /// Elements for `uris`, querying the ones not loaded yet. Unknown uris are left out.
    pub async fn items_by_key(&self, uris: &[String]) -> Result<Vec<AttributeElement>, CommandError> {
        let missing: Vec<String> = {
            let state = self.lock();
            uris.iter()
                .filter(|uri| !state.by_uri.contains_key(*uri))
                .cloned()
                .collect()
        };

        if !missing.is_empty() {
            let mut request = ElementsRequest::page(self.display_form.clone(), 0, missing.len());
            request.uris = Some(missing);
            let page = self
                .query
                .query_elements(request)
                .await
                .map_err(|e| CommandError::external("elements", e))?;

            let mut state = self.lock();
            for element in page.items {
                state.by_uri.insert(element.uri.clone(), element);
            }
        }

        let state = self.lock();
        Ok(uris.iter().filter_map(|uri| state.by_uri.get(uri).cloned()).collect())
    }

    pub fn total_count(&self) -> Option<usize> {
        self.lock().total_count
    }

    pub fn loading_status(&self) -> LoadingStatus {
        self.lock().status
    }
}
