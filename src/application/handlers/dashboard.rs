// Dashboard initialization
use super::{CommandHandler, Committed, Resolution, UndoPolicy};
use crate::application::context::DashboardContext;
use crate::application::error::{CommandError, MissingReference};
use crate::application::event::EventBody;
use crate::application::resolvers::identity::add_temporary_identity_to_layout;
use crate::application::store::action::{Action, FilterContextAction, InsightsAction, LayoutAction};
use crate::application::store::state::ConfigSlice;
use crate::domain::dashboard::DashboardDocument;
use crate::domain::refs::ObjRef;
use crate::domain::widget::Widget;
use async_trait::async_trait;

pub struct InitializeDashboard {
    pub dashboard: DashboardDocument,
}

#[async_trait]
impl CommandHandler for InitializeDashboard {
    async fn resolve(&self, ctx: &DashboardContext) -> Result<Resolution, CommandError> {
        let dashboard = self.dashboard.clone();

        let catalog = ctx
            .services
            .catalog
            .load_catalog()
            .await
            .map_err(|e| CommandError::external("catalog", e))?;

        let mut insight_refs: Vec<ObjRef> = Vec::new();
        for widget in dashboard.layout.widgets() {
            if let Widget::Insight(insight) = widget {
                if !insight_refs.contains(&insight.insight) {
                    insight_refs.push(insight.insight.clone());
                }
            }
        }

        let insights = if insight_refs.is_empty() {
            Vec::new()
        } else {
            ctx.services
                .insights
                .load_insights(&insight_refs)
                .await
                .map_err(|e| CommandError::external("insights", e))?
        };

        let missing: Vec<ObjRef> = insight_refs
            .into_iter()
            .filter(|obj_ref| !insights.iter().any(|insight| insight.matches(obj_ref)))
            .collect();
        if !missing.is_empty() {
            return Err(CommandError::unresolved(MissingReference::Insights { refs: missing }));
        }

        let layout = add_temporary_identity_to_layout(dashboard.layout);
        let settings = dashboard
            .settings
            .unwrap_or_else(|| ctx.default_settings.clone());

        tracing::info!(
            "Loaded dashboard '{}' with {} sections, {} insights",
            dashboard.title,
            layout.sections.len(),
            insights.len()
        );

        Ok(Resolution::mutation(move |_state| {
            let body = EventBody::DashboardInitialized {
                title: dashboard.title.clone(),
                section_count: layout.sections.len(),
            };
            Ok(Committed {
                actions: vec![
                    Action::Insights(InsightsAction::Replace(insights)),
                    Action::Catalog(catalog),
                    Action::Config(ConfigSlice {
                        title: dashboard.title,
                        settings,
                    }),
                    Action::Permissions(dashboard.permissions),
                    Action::FilterContext(FilterContextAction::Replace(dashboard.filter_context)),
                    Action::Layout(LayoutAction::Replace(layout)),
                ],
                undo: UndoPolicy::Clear,
                body,
            })
        }))
    }
}
