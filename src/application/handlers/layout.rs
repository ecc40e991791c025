// Layout sections - add, remove and move
use super::items::prepare_items;
use super::{CommandHandler, Committed, Resolution, recheck};
use crate::application::context::DashboardContext;
use crate::application::error::CommandError;
use crate::application::event::EventBody;
use crate::application::resolvers::index::{resolve_index_of_new_item, resolve_move_target, validate_section_exists};
use crate::application::resolvers::stash::ensure_stashes_available;
use crate::application::store::action::{Action, LayoutAction};
use crate::application::store::selectors::{select_layout, select_section_count, select_stash};
use crate::application::store::state::DashboardState;
use crate::application::validation::ensure_can_edit;
use crate::domain::layout::{ItemDefinition, Section, SectionHeader, StashId};
use async_trait::async_trait;

pub struct AddLayoutSection {
    pub index: i64,
    pub header: Option<SectionHeader>,
    pub items: Vec<ItemDefinition>,
    pub auto_resolve_date_filter_dataset: bool,
}

#[async_trait]
impl CommandHandler for AddLayoutSection {
    async fn resolve(&self, ctx: &DashboardContext) -> Result<Resolution, CommandError> {
        let state = ctx.snapshot();
        ensure_can_edit(&state)?;

        let prepared = prepare_items(ctx, &state, self.items.clone(), self.auto_resolve_date_filter_dataset).await?;
        let header = self.header.clone();
        let requested = self.index;

        Ok(Resolution::mutation(move |state: &DashboardState| {
            ensure_can_edit(state)?;
            ensure_stashes_available(select_stash(state), &prepared.stash_contents)?;

            let index = resolve_index_of_new_item(select_section_count(state), requested);
            let section = Section {
                header,
                items: prepared.items.clone(),
            };
            tracing::debug!("Adding section at {} (requested {})", index, requested);

            Ok(Committed::recorded(
                prepared.actions(LayoutAction::AddSection {
                    section: section.clone(),
                    index,
                    used_stashes: prepared.used_stashes.clone(),
                }),
                EventBody::LayoutSectionAdded { section, index },
            ))
        }))
    }
}

pub struct RemoveLayoutSection {
    pub index: usize,
    pub stash_identifier: Option<StashId>,
}

#[async_trait]
impl CommandHandler for RemoveLayoutSection {
    async fn resolve(&self, ctx: &DashboardContext) -> Result<Resolution, CommandError> {
        let state = ctx.snapshot();
        ensure_can_edit(&state)?;
        validate_section_exists(select_layout(&state), self.index)?;

        let index = self.index;
        let stash_identifier = self.stash_identifier.clone();

        Ok(Resolution::mutation(move |state: &DashboardState| {
            ensure_can_edit(state)?;
            recheck(validate_section_exists(select_layout(state), index))?;

            let section = select_layout(state).sections[index].clone();
            Ok(Committed::recorded(
                vec![Action::Layout(LayoutAction::RemoveSection {
                    index,
                    stash_identifier: stash_identifier.clone(),
                })],
                EventBody::LayoutSectionRemoved {
                    section,
                    index,
                    stash_identifier,
                },
            ))
        }))
    }
}

pub struct MoveLayoutSection {
    pub from: usize,
    pub to: i64,
}

#[async_trait]
impl CommandHandler for MoveLayoutSection {
    async fn resolve(&self, ctx: &DashboardContext) -> Result<Resolution, CommandError> {
        let state = ctx.snapshot();
        ensure_can_edit(&state)?;
        validate_section_exists(select_layout(&state), self.from)?;

        let from = self.from;
        let requested = self.to;

        Ok(Resolution::mutation(move |state: &DashboardState| {
            ensure_can_edit(state)?;
            recheck(validate_section_exists(select_layout(state), from))?;

            let to = resolve_move_target(select_section_count(state), requested);
            let section = select_layout(state).sections[from].clone();
            Ok(Committed::recorded(
                vec![Action::Layout(LayoutAction::MoveSection { from, to })],
                EventBody::LayoutSectionMoved { section, from, to },
            ))
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::application::command::Command;
    use crate::application::error::{CommandError, MissingReference};
    use crate::application::event::EventBody;
    use crate::application::handlers::testing::run;
    use crate::application::test_support::{context_for, insight_item, kpi_item, sales_state, sales_state_with_layout};
    use crate::domain::layout::{ItemDefinition, SectionHeader, StashId};
    use crate::domain::refs::ObjRef;
    use crate::infrastructure::memory_backend::InMemoryBackend;
    use crate::infrastructure::memory_backend::fixtures::sales_fixture;

    fn header(title: &str) -> Option<SectionHeader> {
        Some(SectionHeader {
            title: Some(title.to_string()),
            description: None,
        })
    }

    fn add_section(index: i64, title: &str, items: Vec<ItemDefinition>) -> Command {
        Command::AddLayoutSection {
            index,
            header: header(title),
            items,
            auto_resolve_date_filter_dataset: false,
        }
    }

    fn section_titles(store: &crate::application::store::Store) -> Vec<String> {
        store
            .snapshot()
            .layout
            .layout
            .sections
            .iter()
            .map(|s| s.header.as_ref().and_then(|h| h.title.clone()).unwrap_or_default())
            .collect()
    }

    #[tokio::test]
    async fn test_add_section_to_empty_dashboard() {
        let (ctx, mut store) = context_for(InMemoryBackend::new(sales_fixture()), sales_state());

        let body = run(
            add_section(0, "Overview", vec![insight_item(ObjRef::identifier("pipeline")).into()]),
            &ctx,
            &mut store,
        )
        .await
        .unwrap();

        match body {
            EventBody::LayoutSectionAdded { section, index } => {
                assert_eq!(index, 0);
                let reference = section.items[0].widget.reference().unwrap();
                assert!(reference.identifier.starts_with("tmp-"));
            }
            other => panic!("unexpected {:?}", other),
        }
        let state = store.snapshot();
        assert_eq!(state.version, 1);
        assert_eq!(state.undo.len(), 1);
        assert!(state.insights.contains(&ObjRef::identifier("pipeline")));
    }

    #[tokio::test]
    async fn test_add_section_index_past_end_appends() {
        let (ctx, mut store) = context_for(InMemoryBackend::new(sales_fixture()), sales_state());
        run(add_section(0, "a", vec![]), &ctx, &mut store).await.unwrap();
        run(add_section(1, "b", vec![]), &ctx, &mut store).await.unwrap();

        let body = run(add_section(99, "c", vec![]), &ctx, &mut store).await.unwrap();
        assert!(matches!(body, EventBody::LayoutSectionAdded { index: 2, .. }));

        run(add_section(-1, "first", vec![]), &ctx, &mut store).await.unwrap();
        assert_eq!(section_titles(&store), vec!["first", "a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_missing_stashes_fail_without_state_change() {
        let (ctx, mut store) = context_for(InMemoryBackend::new(sales_fixture()), sales_state_with_layout());
        run(
            Command::RemoveLayoutSection {
                index: 0,
                stash_identifier: Some(StashId::new("b")),
            },
            &ctx,
            &mut store,
        )
        .await
        .unwrap();
        let version = store.snapshot().version;

        let stashed = |id: &str| ItemDefinition::Stashed { stash: StashId::new(id) };
        let error = run(
            add_section(0, "restored", vec![stashed("a"), stashed("b"), stashed("c")]),
            &ctx,
            &mut store,
        )
        .await
        .unwrap_err();

        assert_eq!(
            error,
            CommandError::unresolved(MissingReference::Stashes {
                ids: vec![StashId::new("a"), StashId::new("c")],
            })
        );
        let state = store.snapshot();
        assert_eq!(state.version, version);
        assert!(state.layout.stash.contains_key(&StashId::new("b")));
        assert!(state.layout.layout.sections.is_empty());
    }

    #[tokio::test]
    async fn test_move_section_clamps_target() {
        let (ctx, mut store) = context_for(InMemoryBackend::new(sales_fixture()), sales_state());
        for (index, title) in ["a", "b", "c"].iter().enumerate() {
            run(add_section(index as i64, title, vec![]), &ctx, &mut store)
                .await
                .unwrap();
        }

        let body = run(Command::MoveLayoutSection { from: 0, to: 10 }, &ctx, &mut store)
            .await
            .unwrap();
        assert!(matches!(body, EventBody::LayoutSectionMoved { from: 0, to: 2, .. }));
        assert_eq!(section_titles(&store), vec!["b", "c", "a"]);

        let error = run(Command::MoveLayoutSection { from: 3, to: 0 }, &ctx, &mut store)
            .await
            .unwrap_err();
        assert!(matches!(error, CommandError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_layout_commands_require_edit_permission() {
        let mut state = sales_state_with_layout();
        state.permissions.can_edit_dashboard = false;
        let (ctx, mut store) = context_for(InMemoryBackend::new(sales_fixture()), state);

        let error = run(
            add_section(0, "nope", vec![kpi_item(ObjRef::identifier("revenue")).into()]),
            &ctx,
            &mut store,
        )
        .await
        .unwrap_err();
        assert!(matches!(error, CommandError::PreconditionFailed { .. }));
    }
}
