// Shared fixtures for engine tests
use crate::application::backend::Services;
use crate::application::command::CorrelationId;
use crate::application::context::DashboardContext;
use crate::application::store::Store;
use crate::application::store::action::{Action, Batch, InsightsAction, UndoEffect};
use crate::application::store::state::DashboardState;
use crate::domain::dashboard::DashboardSettings;
use crate::domain::filter::{
    AttributeElements, DashboardAttributeFilter, DashboardDateFilter, DateFilterType, DateGranularity, DateValue,
    FilterContext, FilterContextItem,
};
use crate::domain::layout::{Item, ItemSize, Layout, Section};
use crate::domain::refs::ObjRef;
use crate::domain::widget::{InsightWidget, KpiWidget, Widget, WidgetFilterSettings, WidgetRef};
use crate::infrastructure::memory_backend::InMemoryBackend;
use crate::infrastructure::memory_backend::fixtures::sales_fixture;
use std::sync::Arc;

pub fn insight_item(insight: ObjRef) -> Item {
    Item {
        size: ItemSize::xl(6, Some(10)),
        widget: Widget::Insight(InsightWidget {
            reference: None,
            title: "Pipeline".to_string(),
            description: None,
            insight,
            filter_settings: WidgetFilterSettings::default(),
        }),
    }
}

pub fn kpi_item(measure: ObjRef) -> Item {
    Item {
        size: ItemSize::xl(2, None),
        widget: Widget::Kpi(KpiWidget {
            reference: None,
            title: "Revenue".to_string(),
            description: None,
            measure,
            filter_settings: WidgetFilterSettings::default(),
        }),
    }
}

pub fn persisted(mut item: Item, identifier: &str) -> Item {
    item.widget.set_reference(WidgetRef {
        identifier: identifier.to_string(),
        uri: format!("/widgets/{}", identifier),
    });
    item
}

pub fn sales_filter_context() -> FilterContext {
    FilterContext {
        filters: vec![
            FilterContextItem::Date(DashboardDateFilter {
                filter_type: DateFilterType::Relative,
                granularity: DateGranularity::Month,
                from: DateValue::Number(-2),
                to: DateValue::Number(0),
                data_set: None,
            }),
            FilterContextItem::Attribute(DashboardAttributeFilter {
                local_id: "f-region".to_string(),
                display_form: ObjRef::identifier("region.name"),
                negative_selection: false,
                elements: AttributeElements::Uris(vec!["/obj/2/elements?id=1".to_string()]),
                title: None,
            }),
        ],
    }
}

/// Catalog and filter context of the sales workspace, no layout and no insights.
pub fn sales_state() -> DashboardState {
    DashboardState {
        catalog: sales_fixture().catalog,
        filter_context: sales_filter_context(),
        ..DashboardState::default()
    }
}

/// Sales state with one section holding a KPI (`w-kpi`) and the pipeline insight (`w-pipeline`).
pub fn sales_state_with_layout() -> DashboardState {
    let mut kpi = persisted(kpi_item(ObjRef::identifier("revenue")), "w-kpi");
    kpi.widget.filter_settings_mut().date_dataset = Some(ObjRef::identifier("created"));

    let mut state = sales_state();
    state.layout.layout = Layout {
        sections: vec![Section {
            header: None,
            items: vec![kpi, persisted(insight_item(ObjRef::identifier("pipeline")), "w-pipeline")],
        }],
    };

    let mut store = Store::new(state);
    store.apply(Batch::new(
        vec![Action::Insights(InsightsAction::Add(sales_fixture().insights))],
        UndoEffect::Skip,
    ));
    DashboardState::clone(&store.snapshot())
}

/// Handler context over `state`; keep the store alive for as long as the context is used.
pub fn context_for(backend: InMemoryBackend, state: DashboardState) -> (DashboardContext, Store) {
    let store = Store::new(state);
    let ctx = DashboardContext::new(
        store.reader(),
        Services::from_backend(Arc::new(backend)),
        DashboardSettings::default(),
        CorrelationId::new("test"),
    );
    (ctx, store)
}
