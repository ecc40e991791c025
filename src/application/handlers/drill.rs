// Drill to URL - filters to hand over with a drill, optionally with resolved values
use super::{CommandHandler, Resolution};
use crate::application::context::DashboardContext;
use crate::application::error::CommandError;
use crate::application::event::EventBody;
use crate::application::resolvers::filter_values::resolve_filter_values;
use crate::application::resolvers::widget_filters::query_widget_filters;
use crate::application::store::selectors::select_settings;
use crate::domain::refs::ObjRef;
use async_trait::async_trait;

pub struct ResolveDrillToUrlFilters {
    pub widget: ObjRef,
}

#[async_trait]
impl CommandHandler for ResolveDrillToUrlFilters {
    async fn resolve(&self, ctx: &DashboardContext) -> Result<Resolution, CommandError> {
        let state = ctx.snapshot();
        // the drill target applies its own insight filters
        let filters = query_widget_filters(&state, &self.widget, Some(&[]))?;

        let resolved_values = if select_settings(&state).enable_filter_values_resolution_in_drill_events {
            let today = chrono::Local::now().date_naive();
            Some(resolve_filter_values(&filters, ctx.services.elements.as_ref(), today).await?)
        } else {
            None
        };

        Ok(Resolution::Query(EventBody::DrillToUrlFiltersResolved {
            widget: self.widget.clone(),
            filters,
            resolved_values,
        }))
    }
}
