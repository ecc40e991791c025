// Filter context commands and widget filter queries
use super::{CommandHandler, Committed, Resolution};
use crate::application::command::DateFilterSelection;
use crate::application::context::DashboardContext;
use crate::application::error::{CommandError, MissingReference};
use crate::application::event::EventBody;
use crate::application::resolvers::widget_filters::query_widget_filters;
use crate::application::store::action::{Action, FilterContextAction};
use crate::application::store::selectors::select_filter_context;
use crate::application::store::state::DashboardState;
use crate::application::validation::validate_date_selection;
use crate::domain::filter::{AttributeElements, DashboardFilter};
use crate::domain::refs::ObjRef;
use async_trait::async_trait;

pub struct ChangeAttributeFilterSelection {
    pub filter_local_id: String,
    pub elements: AttributeElements,
    pub negative_selection: bool,
}

#[async_trait]
impl CommandHandler for ChangeAttributeFilterSelection {
    async fn resolve(&self, ctx: &DashboardContext) -> Result<Resolution, CommandError> {
        let state = ctx.snapshot();
        if select_filter_context(&state)
            .attribute_filter(&self.filter_local_id)
            .is_none()
        {
            return Err(CommandError::unresolved(MissingReference::Filter {
                local_id: self.filter_local_id.clone(),
            }));
        }

        let local_id = self.filter_local_id.clone();
        let elements = self.elements.clone();
        let negative_selection = self.negative_selection;

        Ok(Resolution::mutation(move |state: &DashboardState| {
            let mut filter = select_filter_context(state)
                .attribute_filter(&local_id)
                .cloned()
                .ok_or_else(|| {
                    CommandError::precondition(format!("attribute filter {} was removed meanwhile", local_id))
                })?;
            filter.elements = elements.clone();
            filter.negative_selection = negative_selection;

            Ok(Committed::recorded(
                vec![Action::FilterContext(FilterContextAction::SetAttributeFilterSelection {
                    local_id,
                    elements,
                    negative_selection,
                })],
                EventBody::AttributeFilterSelectionChanged { filter },
            ))
        }))
    }
}

pub struct ChangeDateFilterSelection {
    pub selection: DateFilterSelection,
}

#[async_trait]
impl CommandHandler for ChangeDateFilterSelection {
    async fn resolve(&self, ctx: &DashboardContext) -> Result<Resolution, CommandError> {
        let state = ctx.snapshot();
        validate_date_selection(&self.selection, select_filter_context(&state).date_filter())?;

        let selection = self.selection.clone();
        Ok(Resolution::mutation(move |state: &DashboardState| {
            let filter = validate_date_selection(&selection, select_filter_context(state).date_filter())?;
            Ok(Committed::recorded(
                vec![Action::FilterContext(FilterContextAction::SetDateFilter(filter.clone()))],
                EventBody::DateFilterSelectionChanged { filter },
            ))
        }))
    }
}

pub struct QueryWidgetFilters {
    pub widget: ObjRef,
    pub insight_filter_overrides: Option<Vec<DashboardFilter>>,
}

#[async_trait]
impl CommandHandler for QueryWidgetFilters {
    async fn resolve(&self, ctx: &DashboardContext) -> Result<Resolution, CommandError> {
        let state = ctx.snapshot();
        let filters = query_widget_filters(&state, &self.widget, self.insight_filter_overrides.as_deref())?;

        Ok(Resolution::Query(EventBody::WidgetFiltersQueried {
            widget: self.widget.clone(),
            filters,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::application::command::{Command, DateFilterSelection};
    use crate::application::error::{CommandError, MissingReference};
    use crate::application::event::EventBody;
    use crate::application::handlers::testing::run;
    use crate::application::test_support::{context_for, sales_state_with_layout};
    use crate::domain::filter::{AttributeElements, DateFilterType, DateGranularity, DateValue, FilterContextItem};
    use crate::domain::refs::ObjRef;
    use crate::infrastructure::memory_backend::InMemoryBackend;
    use crate::infrastructure::memory_backend::fixtures::sales_fixture;

    #[tokio::test]
    async fn test_attribute_selection_changes_filter_in_place() {
        let (ctx, mut store) = context_for(InMemoryBackend::new(sales_fixture()), sales_state_with_layout());

        let body = run(
            Command::ChangeAttributeFilterSelection {
                filter_local_id: "f-region".to_string(),
                elements: AttributeElements::Values(vec!["APAC".to_string()]),
                negative_selection: true,
            },
            &ctx,
            &mut store,
        )
        .await
        .unwrap();

        match body {
            EventBody::AttributeFilterSelectionChanged { filter } => {
                assert!(filter.negative_selection);
                assert_eq!(filter.elements.items(), &["APAC".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
        let state = store.snapshot();
        let filter = state.filter_context.attribute_filter("f-region").unwrap();
        assert!(filter.negative_selection);
        assert_eq!(state.undo.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_attribute_filter_is_unresolved() {
        let (ctx, mut store) = context_for(InMemoryBackend::new(sales_fixture()), sales_state_with_layout());
        let error = run(
            Command::ChangeAttributeFilterSelection {
                filter_local_id: "f-product".to_string(),
                elements: AttributeElements::Values(vec![]),
                negative_selection: false,
            },
            &ctx,
            &mut store,
        )
        .await
        .unwrap_err();

        assert_eq!(
            error,
            CommandError::unresolved(MissingReference::Filter {
                local_id: "f-product".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_date_selection_replaces_and_clears_date_filter() {
        let (ctx, mut store) = context_for(InMemoryBackend::new(sales_fixture()), sales_state_with_layout());

        run(
            Command::ChangeDateFilterSelection {
                selection: DateFilterSelection::Relative {
                    granularity: DateGranularity::Year,
                    from: -1,
                    to: -1,
                },
            },
            &ctx,
            &mut store,
        )
        .await
        .unwrap();
        let state = store.snapshot();
        let date = state.filter_context.date_filter().unwrap();
        assert_eq!(date.filter_type, DateFilterType::Relative);
        assert_eq!(date.granularity, DateGranularity::Year);
        assert_eq!(date.from, DateValue::Number(-1));

        run(
            Command::ChangeDateFilterSelection {
                selection: DateFilterSelection::AllTime,
            },
            &ctx,
            &mut store,
        )
        .await
        .unwrap();
        let state = store.snapshot();
        assert!(state.filter_context.date_filter().is_none());
        assert!(matches!(state.filter_context.filters[0], FilterContextItem::Attribute(_)));
    }

    #[tokio::test]
    async fn test_query_widget_filters_does_not_commit() {
        let (ctx, mut store) = context_for(InMemoryBackend::new(sales_fixture()), sales_state_with_layout());
        let version = store.snapshot().version;

        let body = run(
            Command::QueryWidgetFilters {
                widget: ObjRef::identifier("w-kpi"),
                insight_filter_overrides: None,
            },
            &ctx,
            &mut store,
        )
        .await
        .unwrap();

        assert!(matches!(body, EventBody::WidgetFiltersQueried { ref filters, .. } if filters.len() == 2));
        assert_eq!(store.snapshot().version, version);
    }
}
