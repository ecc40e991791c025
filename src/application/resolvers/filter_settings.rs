// Filter settings of new items - date dataset and ignored dashboard filters
use crate::application::context::DashboardContext;
use crate::application::error::{CommandError, MissingReference};
use crate::application::store::selectors::select_catalog;
use crate::application::store::state::DashboardState;
use crate::domain::catalog::CatalogDateDataset;
use crate::domain::filter::FilterContextItem;
use crate::domain::layout::Item;
use crate::domain::refs::ObjRef;

/// Most relevant dataset; among equals the first one listed wins.
pub fn most_relevant_date_dataset(candidates: &[CatalogDateDataset]) -> Option<&CatalogDateDataset> {
    candidates.iter().fold(None, |best: Option<&CatalogDateDataset>, candidate| match best {
        Some(current) if current.relevance >= candidate.relevance => Some(current),
        _ => Some(candidate),
    })
}

/// The display form ref the dashboard filters `display_form` by, as the filter context spells it.
fn ignored_filter_in_context(state: &DashboardState, display_form: &ObjRef) -> Option<ObjRef> {
    state.filter_context.filters.iter().find_map(|filter| match filter {
        FilterContextItem::Attribute(attribute)
            if select_catalog(state).same_display_form(&attribute.display_form, display_form) =>
        {
            Some(attribute.display_form.clone())
        }
        _ => None,
    })
}

/// Checks explicit filter settings against the state and fills in missing date datasets
/// when `auto_resolve` is set.
pub async fn validate_and_resolve_item_filter_settings(
    ctx: &DashboardContext,
    state: &DashboardState,
    mut items: Vec<Item>,
    auto_resolve: bool,
) -> Result<Vec<Item>, CommandError> {
    for item in &mut items {
        let settings = item.widget.filter_settings();

        let mut ignored = Vec::with_capacity(settings.ignore_dashboard_filters.len());
        for display_form in &settings.ignore_dashboard_filters {
            let in_context = ignored_filter_in_context(state, display_form).ok_or_else(|| {
                CommandError::invalid_argument(format!(
                    "widget '{}' ignores {}, which is not filtered on the dashboard",
                    item.widget.title(),
                    display_form
                ))
            })?;
            ignored.push(in_context);
        }
        let date_dataset = settings.date_dataset.clone();
        item.widget.filter_settings_mut().ignore_dashboard_filters = ignored;

        match date_dataset {
            Some(data_set) => {
                let known = select_catalog(state).date_dataset(&data_set).ok_or_else(|| {
                    CommandError::unresolved(MissingReference::DateDataset {
                        data_set: data_set.clone(),
                    })
                })?;
                item.widget.filter_settings_mut().date_dataset = Some(known.data_set.obj_ref());
            }
            None if auto_resolve => {
                let target = item.widget.target().clone();
                let related = ctx
                    .services
                    .catalog
                    .related_date_datasets(&target)
                    .await
                    .map_err(|e| CommandError::external("catalog", e))?;

                match most_relevant_date_dataset(&related) {
                    Some(chosen) => {
                        tracing::debug!(
                            "Resolved date dataset {} for widget '{}'",
                            chosen.data_set.identifier,
                            item.widget.title()
                        );
                        item.widget.filter_settings_mut().date_dataset = Some(chosen.data_set.obj_ref());
                    }
                    None => tracing::debug!("No date dataset related to {}", target),
                }
            }
            None => {}
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{context_for, insight_item, kpi_item, sales_state};
    use crate::domain::refs::MetadataObject;
    use crate::infrastructure::memory_backend::InMemoryBackend;
    use crate::infrastructure::memory_backend::fixtures::sales_fixture;

    fn dataset(identifier: &str, relevance: i32) -> CatalogDateDataset {
        CatalogDateDataset {
            data_set: MetadataObject::new(identifier, format!("/obj/{}", identifier), identifier),
            relevance,
        }
    }

    #[test]
    fn test_most_relevant_dataset_ties_keep_first() {
        let candidates = [dataset("a", 1), dataset("b", 5), dataset("c", 5), dataset("d", 2)];
        assert_eq!(
            most_relevant_date_dataset(&candidates).map(|d| d.data_set.identifier.as_str()),
            Some("b")
        );
        assert!(most_relevant_date_dataset(&[]).is_none());
    }

    #[tokio::test]
    async fn test_auto_resolution_picks_related_dataset() {
        let (ctx, _store) = context_for(InMemoryBackend::new(sales_fixture()), sales_state());
        let state = ctx.snapshot();

        let items = validate_and_resolve_item_filter_settings(
            &ctx,
            &state,
            vec![insight_item(ObjRef::identifier("pipeline"))],
            true,
        )
        .await
        .unwrap();

        assert_eq!(
            items[0].widget.filter_settings().date_dataset,
            Some(ObjRef::identifier("created"))
        );
    }

    #[tokio::test]
    async fn test_without_auto_resolution_dataset_stays_empty() {
        let (ctx, _store) = context_for(InMemoryBackend::new(sales_fixture()), sales_state());
        let state = ctx.snapshot();

        let items = validate_and_resolve_item_filter_settings(
            &ctx,
            &state,
            vec![insight_item(ObjRef::identifier("pipeline"))],
            false,
        )
        .await
        .unwrap();
        assert_eq!(items[0].widget.filter_settings().date_dataset, None);
    }

    #[tokio::test]
    async fn test_explicit_dataset_must_be_in_catalog() {
        let (ctx, _store) = context_for(InMemoryBackend::new(sales_fixture()), sales_state());
        let state = ctx.snapshot();

        let mut known = kpi_item(ObjRef::identifier("revenue"));
        known.widget.filter_settings_mut().date_dataset = Some(ObjRef::uri("/obj/11"));
        let items = validate_and_resolve_item_filter_settings(&ctx, &state, vec![known], false)
            .await
            .unwrap();
        assert_eq!(
            items[0].widget.filter_settings().date_dataset,
            Some(ObjRef::identifier("closed"))
        );

        let mut unknown = kpi_item(ObjRef::identifier("revenue"));
        unknown.widget.filter_settings_mut().date_dataset = Some(ObjRef::identifier("shipped"));
        let error = validate_and_resolve_item_filter_settings(&ctx, &state, vec![unknown], false)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            CommandError::UnresolvedReference {
                missing: MissingReference::DateDataset { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_ignored_filters_must_be_on_the_dashboard() {
        let (ctx, _store) = context_for(InMemoryBackend::new(sales_fixture()), sales_state());
        let state = ctx.snapshot();

        let mut by_uri = kpi_item(ObjRef::identifier("revenue"));
        by_uri.widget.filter_settings_mut().ignore_dashboard_filters = vec![ObjRef::uri("/obj/2")];
        let items = validate_and_resolve_item_filter_settings(&ctx, &state, vec![by_uri], false)
            .await
            .unwrap();
        assert_eq!(
            items[0].widget.filter_settings().ignore_dashboard_filters,
            vec![ObjRef::identifier("region.name")]
        );

        let mut stray = kpi_item(ObjRef::identifier("revenue"));
        stray.widget.filter_settings_mut().ignore_dashboard_filters = vec![ObjRef::identifier("product.name")];
        let error = validate_and_resolve_item_filter_settings(&ctx, &state, vec![stray], false)
            .await
            .unwrap_err();
        assert!(matches!(error, CommandError::InvalidArgument { .. }));
    }
}
