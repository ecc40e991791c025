// Handler context - the store handle and collaborators threaded through every handler
use crate::application::backend::Services;
use crate::application::command::CorrelationId;
use crate::application::store::StoreReader;
use crate::application::store::state::DashboardState;
use crate::domain::dashboard::DashboardSettings;
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardContext {
    pub store: StoreReader,
    pub services: Services,
    /// Settings for dashboards that carry none of their own.
    pub default_settings: DashboardSettings,
    pub correlation_id: CorrelationId,
}

impl DashboardContext {
    pub fn new(
        store: StoreReader,
        services: Services,
        default_settings: DashboardSettings,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            store,
            services,
            default_settings,
            correlation_id,
        }
    }

    /// Latest committed state; phase 1 works against this snapshot.
    pub fn snapshot(&self) -> Arc<DashboardState> {
        self.store.snapshot()
    }
}
