// Widget filters - what a widget's execution is filtered by
use crate::application::error::{CommandError, MissingReference};
use crate::application::store::selectors::{select_catalog, select_filter_context, select_widget};
use crate::application::store::state::DashboardState;
use crate::domain::catalog::Catalog;
use crate::domain::filter::{
    DashboardAttributeFilter, DashboardDateFilter, DashboardFilter, DateFilterType, FilterContext,
    FilterContextItem,
};
use crate::domain::refs::ObjRef;
use crate::domain::widget::Widget;

fn attribute_filter(filter: &DashboardAttributeFilter) -> DashboardFilter {
    if filter.negative_selection {
        DashboardFilter::NegativeAttribute {
            display_form: filter.display_form.clone(),
            elements: filter.elements.clone(),
        }
    } else {
        DashboardFilter::PositiveAttribute {
            display_form: filter.display_form.clone(),
            elements: filter.elements.clone(),
        }
    }
}

fn date_filter(filter: &DashboardDateFilter, data_set: &ObjRef) -> Option<DashboardFilter> {
    match filter.filter_type {
        DateFilterType::Relative => match (filter.from.as_offset(), filter.to.as_offset()) {
            (Some(from), Some(to)) => Some(DashboardFilter::RelativeDate {
                data_set: data_set.clone(),
                granularity: filter.granularity,
                from,
                to,
            }),
            _ => {
                tracing::warn!(
                    "Skipping relative date filter with non-numeric bounds {} .. {}",
                    filter.from.as_text(),
                    filter.to.as_text()
                );
                None
            }
        },
        DateFilterType::Absolute => Some(DashboardFilter::AbsoluteDate {
            data_set: data_set.clone(),
            from: filter.from.as_text(),
            to: filter.to.as_text(),
        }),
    }
}

/// Dashboard filters that apply to `widget`.
///
/// Attribute filters on ignored display forms are dropped, matched through the
/// catalog so a uri and an identifier of the same display form agree. The date
/// filter only applies when the widget is bound to a date dataset.
pub fn filter_context_items_to_filters_for_widget(
    catalog: &Catalog,
    filter_context: &FilterContext,
    widget: &Widget,
) -> Vec<DashboardFilter> {
    let settings = widget.filter_settings();

    filter_context
        .filters
        .iter()
        .filter_map(|item| match item {
            FilterContextItem::Attribute(attribute) => {
                let ignored = settings
                    .ignore_dashboard_filters
                    .iter()
                    .any(|display_form| catalog.same_display_form(display_form, &attribute.display_form));
                (!ignored).then(|| attribute_filter(attribute))
            }
            FilterContextItem::Date(date) => settings
                .date_dataset
                .as_ref()
                .and_then(|data_set| date_filter(date, data_set)),
        })
        .collect()
}

/// Effective filters of a widget on the dashboard.
///
/// The widget's own filters (insight filters, or `overrides` when given) come first,
/// followed by the dashboard filters the widget does not ignore.
pub fn query_widget_filters(
    state: &DashboardState,
    widget_ref: &ObjRef,
    overrides: Option<&[DashboardFilter]>,
) -> Result<Vec<DashboardFilter>, CommandError> {
    let widget = select_widget(state, widget_ref).ok_or_else(|| {
        CommandError::unresolved(MissingReference::Widget {
            widget: widget_ref.clone(),
        })
    })?;

    let mut filters = match (overrides, widget) {
        (Some(overrides), _) => overrides.to_vec(),
        (None, Widget::Insight(insight_widget)) => state
            .insights
            .get(&insight_widget.insight)
            .map(|insight| insight.filters.clone())
            .ok_or_else(|| {
                CommandError::unresolved(MissingReference::Insights {
                    refs: vec![insight_widget.insight.clone()],
                })
            })?,
        (None, Widget::Kpi(_)) => Vec::new(),
    };

    filters.extend(filter_context_items_to_filters_for_widget(
        select_catalog(state),
        select_filter_context(state),
        widget,
    ));
    Ok(filters)
}
