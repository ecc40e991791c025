// Item normalization - sizes, insights and KPI measures referenced by new items
use crate::application::context::DashboardContext;
use crate::application::error::{CommandError, MissingReference};
use crate::application::store::selectors::select_catalog;
use crate::application::store::state::DashboardState;
use crate::application::validation::validate_item_sizes;
use crate::domain::catalog::{CatalogItem, Insight};
use crate::domain::layout::Item;
use crate::domain::refs::ObjRef;
use crate::domain::widget::Widget;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedItems {
    pub items: Vec<Item>,
    /// Insights fetched because the dashboard did not know them yet.
    pub loaded_insights: Vec<Insight>,
}

fn push_unique(refs: &mut Vec<ObjRef>, obj_ref: &ObjRef) {
    if !refs.contains(obj_ref) {
        refs.push(obj_ref.clone());
    }
}

/// Validates items and rewrites their insight and measure refs to identifiers.
///
/// Every unknown insight or measure is reported in a single failure.
pub async fn validate_and_normalize_items(
    ctx: &DashboardContext,
    state: &DashboardState,
    mut items: Vec<Item>,
) -> Result<NormalizedItems, CommandError> {
    validate_item_sizes(&items)?;

    let mut unknown_insights = Vec::new();
    let mut unknown_measures = Vec::new();
    for item in &items {
        match &item.widget {
            Widget::Insight(widget) if !state.insights.contains(&widget.insight) => {
                push_unique(&mut unknown_insights, &widget.insight)
            }
            Widget::Kpi(kpi) if select_catalog(state).measure(&kpi.measure).is_none() => {
                push_unique(&mut unknown_measures, &kpi.measure)
            }
            _ => {}
        }
    }

    let loaded_insights = if unknown_insights.is_empty() {
        Vec::new()
    } else {
        tracing::debug!("Loading {} insights not yet on the dashboard", unknown_insights.len());
        ctx.services
            .insights
            .load_insights(&unknown_insights)
            .await
            .map_err(|e| CommandError::external("insights", e))?
    };

    let missing_insights: Vec<ObjRef> = unknown_insights
        .into_iter()
        .filter(|obj_ref| !loaded_insights.iter().any(|insight| insight.matches(obj_ref)))
        .collect();
    if !missing_insights.is_empty() {
        return Err(CommandError::unresolved(MissingReference::Insights {
            refs: missing_insights,
        }));
    }

    let resolved_measures = if unknown_measures.is_empty() {
        Vec::new()
    } else {
        let lookup = ctx
            .services
            .catalog
            .resolve_catalog_items(&unknown_measures)
            .await
            .map_err(|e| CommandError::external("catalog", e))?;

        let mut missing = lookup.missing;
        // anything that resolved to a non-measure is as good as missing
        for obj_ref in &unknown_measures {
            let is_measure = lookup
                .found
                .iter()
                .any(|item| matches!(item, CatalogItem::Measure(_)) && item.matches(obj_ref));
            if !is_measure && !missing.contains(obj_ref) {
                missing.push(obj_ref.clone());
            }
        }
        if !missing.is_empty() {
            return Err(CommandError::unresolved(MissingReference::CatalogItems { refs: missing }));
        }
        lookup.found
    };

    for item in &mut items {
        match &mut item.widget {
            Widget::Insight(widget) => {
                let canonical = state
                    .insights
                    .get(&widget.insight)
                    .or_else(|| loaded_insights.iter().find(|i| i.matches(&widget.insight)))
                    .map(|insight| insight.meta.obj_ref());
                if let Some(canonical) = canonical {
                    widget.insight = canonical;
                }
            }
            Widget::Kpi(kpi) => {
                let canonical = state
                    .catalog
                    .measure(&kpi.measure)
                    .map(|m| m.measure.obj_ref())
                    .or_else(|| {
                        resolved_measures.iter().find_map(|item| match item {
                            CatalogItem::Measure(m) if m.measure.matches(&kpi.measure) => {
                                Some(m.measure.obj_ref())
                            }
                            _ => None,
                        })
                    });
                if let Some(canonical) = canonical {
                    kpi.measure = canonical;
                }
            }
        }
    }

    Ok(NormalizedItems {
        items,
        loaded_insights,
    })
}
