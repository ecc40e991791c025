// Section items - adding and removing widgets inside a section
use super::{CommandHandler, Committed, Resolution, recheck};
use crate::application::context::DashboardContext;
use crate::application::error::CommandError;
use crate::application::event::EventBody;
use crate::application::resolvers::filter_settings::validate_and_resolve_item_filter_settings;
use crate::application::resolvers::identity::add_temporary_identity_to_widgets;
use crate::application::resolvers::index::{resolve_index_of_new_item, validate_item_exists, validate_section_exists};
use crate::application::resolvers::items::validate_and_normalize_items;
use crate::application::resolvers::stash::{ensure_stashes_available, validate_and_resolve_stashed_items};
use crate::application::store::action::{Action, InsightsAction, LayoutAction};
use crate::application::store::selectors::{select_layout, select_stash};
use crate::application::store::state::DashboardState;
use crate::application::validation::ensure_can_edit;
use crate::domain::catalog::Insight;
use crate::domain::layout::{Item, ItemDefinition, Stash, StashId};
use async_trait::async_trait;

/// Items ready to be placed into the layout.
pub(super) struct PreparedItems {
    pub items: Vec<Item>,
    pub used_stashes: Vec<StashId>,
    /// Stash contents spliced into `items`, checked again at commit time.
    pub stash_contents: Stash,
    pub loaded_insights: Vec<Insight>,
}

impl PreparedItems {
    /// Pending insights go in before the layout change in the same batch.
    pub fn actions(&self, layout: LayoutAction) -> Vec<Action> {
        let mut actions = Vec::with_capacity(2);
        if !self.loaded_insights.is_empty() {
            actions.push(Action::Insights(InsightsAction::Add(self.loaded_insights.clone())));
        }
        actions.push(Action::Layout(layout));
        actions
    }
}

/// Identity, stash resolution, normalization and filter settings, in that order.
pub(super) async fn prepare_items(
    ctx: &DashboardContext,
    state: &DashboardState,
    definitions: Vec<ItemDefinition>,
    auto_resolve_date_filter_dataset: bool,
) -> Result<PreparedItems, CommandError> {
    let definitions = add_temporary_identity_to_widgets(definitions);
    let resolution = validate_and_resolve_stashed_items(select_stash(state), &definitions)?;
    let normalized = validate_and_normalize_items(ctx, state, resolution.items).await?;
    let items = validate_and_resolve_item_filter_settings(
        ctx,
        state,
        normalized.items,
        auto_resolve_date_filter_dataset,
    )
    .await?;

    Ok(PreparedItems {
        items,
        used_stashes: resolution.existing,
        stash_contents: resolution.contents,
        loaded_insights: normalized.loaded_insights,
    })
}

pub struct AddSectionItems {
    pub section_index: usize,
    pub item_index: i64,
    pub items: Vec<ItemDefinition>,
    pub auto_resolve_date_filter_dataset: bool,
}

#[async_trait]
impl CommandHandler for AddSectionItems {
    async fn resolve(&self, ctx: &DashboardContext) -> Result<Resolution, CommandError> {
        let state = ctx.snapshot();
        ensure_can_edit(&state)?;
        validate_section_exists(select_layout(&state), self.section_index)?;
        if self.items.is_empty() {
            return Err(CommandError::invalid_argument("at least one item must be added"));
        }

        let prepared = prepare_items(ctx, &state, self.items.clone(), self.auto_resolve_date_filter_dataset).await?;
        let section_index = self.section_index;
        let requested = self.item_index;

        Ok(Resolution::mutation(move |state: &DashboardState| {
            ensure_can_edit(state)?;
            recheck(validate_section_exists(select_layout(state), section_index))?;
            ensure_stashes_available(select_stash(state), &prepared.stash_contents)?;

            let item_count = select_layout(state).sections[section_index].items.len();
            let start_index = resolve_index_of_new_item(item_count, requested);
            let actions = prepared.actions(LayoutAction::AddSectionItems {
                section_index,
                item_index: start_index,
                items: prepared.items.clone(),
                used_stashes: prepared.used_stashes.clone(),
            });

            Ok(Committed::recorded(
                actions,
                EventBody::SectionItemsAdded {
                    section_index,
                    start_index,
                    items: prepared.items,
                },
            ))
        }))
    }
}

pub struct RemoveSectionItem {
    pub section_index: usize,
    pub item_index: usize,
    pub stash_identifier: Option<StashId>,
    pub eager: bool,
}

#[async_trait]
impl CommandHandler for RemoveSectionItem {
    async fn resolve(&self, ctx: &DashboardContext) -> Result<Resolution, CommandError> {
        let state = ctx.snapshot();
        ensure_can_edit(&state)?;
        validate_item_exists(select_layout(&state), self.section_index, self.item_index)?;

        let section_index = self.section_index;
        let item_index = self.item_index;
        let stash_identifier = self.stash_identifier.clone();
        let eager = self.eager;

        Ok(Resolution::mutation(move |state: &DashboardState| {
            ensure_can_edit(state)?;
            recheck(validate_item_exists(select_layout(state), section_index, item_index))?;

            let section = &select_layout(state).sections[section_index];
            let item = section.items[item_index].clone();
            let section_removed = eager && section.items.len() == 1;

            Ok(Committed::recorded(
                vec![Action::Layout(LayoutAction::RemoveSectionItem {
                    section_index,
                    item_index,
                    stash_identifier: stash_identifier.clone(),
                    eager,
                })],
                EventBody::SectionItemRemoved {
                    item,
                    section_index,
                    item_index,
                    section_removed,
                    stash_identifier,
                },
            ))
        }))
    }
}
