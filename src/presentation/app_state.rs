// Application state shared by the session step runners
use crate::application::attribute_filter_loader::AttributeFilterLoader;
use crate::application::backend::Services;
use crate::application::dispatcher::Dispatcher;
use crate::domain::refs::ObjRef;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct AppState {
    pub dispatcher: Dispatcher,
    pub services: Services,
    loaders: Mutex<HashMap<ObjRef, AttributeFilterLoader>>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, services: Services) -> Self {
        Self {
            dispatcher,
            services,
            loaders: Mutex::new(HashMap::new()),
        }
    }

    /// One loader per display form, kept for the whole session.
    pub fn loader_for(&self, display_form: &ObjRef) -> AttributeFilterLoader {
        let mut loaders = self.loaders.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        loaders
            .entry(display_form.clone())
            .or_insert_with(|| AttributeFilterLoader::new(display_form.clone(), self.services.elements.clone()))
            .clone()
    }
}
