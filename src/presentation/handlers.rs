// Session step runners - drive the dispatcher and element loaders from a script
use crate::application::command::{Command, CorrelationId};
use crate::application::dispatcher::CommandHandle;
use crate::application::event::{DashboardEvent, EventKind};
use crate::presentation::app_state::AppState;
use crate::presentation::session_script::{ElementLoad, ScriptedCommand, SessionScript};
use anyhow::Context;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub elements_loaded: usize,
}

impl SessionReport {
    fn record(&mut self, event: &DashboardEvent) {
        match event.kind() {
            EventKind::CommandFailed => self.failed += 1,
            EventKind::CommandCancelled => self.cancelled += 1,
            _ => self.succeeded += 1,
        }
    }
}

/// Runs a whole script: the dashboard first, then command rounds, then element loads.
pub async fn run_session(state: &AppState, script: &SessionScript, base: &Path) -> anyhow::Result<SessionReport> {
    let mut report = SessionReport::default();

    if let Some(dashboard) = script.load_dashboard(base)? {
        let event = state
            .dispatcher
            .submit(
                Command::InitializeDashboard { dashboard },
                Some(CorrelationId::new("initialize")),
            )
            .await
            .context("Dashboard initialization did not finish")?;
        report.record(&event);
    }

    for round in script.rounds() {
        for event in run_round(state, round).await? {
            report.record(&event);
        }
    }

    for load in &script.element_loads {
        report.elements_loaded += run_element_load(state, load).await;
    }

    tracing::info!(
        "Session finished: {} succeeded, {} failed, {} cancelled, {} elements loaded",
        report.succeeded,
        report.failed,
        report.cancelled,
        report.elements_loaded
    );
    Ok(report)
}

/// Dispatches every command of a round before awaiting any outcome.
pub async fn run_round(state: &AppState, round: &[ScriptedCommand]) -> anyhow::Result<Vec<DashboardEvent>> {
    let handles: Vec<CommandHandle> = round
        .iter()
        .map(|scripted| {
            let handle = state
                .dispatcher
                .dispatch(scripted.command.clone(), scripted.correlation_id.clone());
            if let Some(delay) = scripted.cancel_after_ms {
                let canceller = handle.canceller();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    canceller.cancel();
                });
            }
            handle
        })
        .collect();

    let outcomes = futures::future::join_all(handles.into_iter().map(CommandHandle::outcome)).await;
    outcomes
        .into_iter()
        .map(|outcome| outcome.context("Command did not finish"))
        .collect()
}

/// Loads one page of elements; failures are logged and count as nothing loaded.
pub async fn run_element_load(state: &AppState, load: &ElementLoad) -> usize {
    let loader = state.loader_for(&load.display_form);
    if load.search != loader.search() {
        loader.set_search(load.search.clone().unwrap_or_default());
    }

    match loader.load_elements_range(load.offset, load.limit, None).await {
        Ok(page) => {
            let titles: Vec<&str> = page.items.iter().map(|e| e.title.as_str()).collect();
            tracing::info!(
                "Elements of {} [{}..]: {} of {} ({})",
                load.display_form,
                page.offset,
                page.items.len(),
                page.total_count,
                titles.join(", ")
            );
            page.items.len()
        }
        Err(e) => {
            tracing::warn!("Element load of {} failed: {}", load.display_form, e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::backend::Services;
    use crate::application::dispatcher::Dispatcher;
    use crate::domain::dashboard::{DashboardDocument, DashboardSettings};
    use crate::domain::refs::ObjRef;
    use crate::infrastructure::memory_backend::InMemoryBackend;
    use crate::infrastructure::memory_backend::fixtures::sales_fixture;
    use std::sync::Arc;

    fn app_state(backend: InMemoryBackend) -> AppState {
        let services = Services::from_backend(Arc::new(backend));
        AppState::new(
            Dispatcher::new(services.clone(), DashboardSettings::default()),
            services,
        )
    }

    fn scripted(command: Command, concurrent: bool) -> ScriptedCommand {
        ScriptedCommand {
            correlation_id: None,
            concurrent,
            cancel_after_ms: None,
            command,
        }
    }

    fn add_section(index: i64) -> Command {
        Command::AddLayoutSection {
            index,
            header: None,
            items: vec![],
            auto_resolve_date_filter_dataset: false,
        }
    }

    #[tokio::test]
    async fn test_session_runs_rounds_and_element_loads() {
        let state = app_state(InMemoryBackend::new(sales_fixture()));
        let script = SessionScript {
            dashboard: None,
            commands: vec![
                scripted(
                    Command::InitializeDashboard {
                        dashboard: DashboardDocument {
                            title: "Sales".to_string(),
                            ..DashboardDocument::default()
                        },
                    },
                    false,
                ),
                scripted(add_section(0), true),
                scripted(add_section(-1), true),
                scripted(Command::UndoLastChange, false),
                scripted(Command::RemoveLayoutSection { index: 5, stash_identifier: None }, false),
            ],
            element_loads: vec![ElementLoad {
                display_form: ObjRef::identifier("region.name"),
                search: Some("ap".to_string()),
                offset: 0,
                limit: 10,
            }],
        };

        let report = run_session(&state, &script, Path::new(".")).await.unwrap();

        assert_eq!(
            report,
            SessionReport {
                succeeded: 4,
                failed: 1,
                cancelled: 0,
                elements_loaded: 1,
            }
        );
        assert_eq!(state.dispatcher.store().snapshot().layout.layout.sections.len(), 1);
    }

    #[tokio::test]
    async fn test_scheduled_cancel_stops_slow_command() {
        let state = app_state(InMemoryBackend::new(sales_fixture()).with_latency(Duration::from_millis(200)));
        let mut command = scripted(
            Command::InitializeDashboard {
                dashboard: DashboardDocument::default(),
            },
            false,
        );
        command.cancel_after_ms = Some(10);

        let events = run_round(&state, std::slice::from_ref(&command)).await.unwrap();

        assert_eq!(events[0].kind(), EventKind::CommandCancelled);
        assert_eq!(state.dispatcher.store().version(), 0);
    }

    #[tokio::test]
    async fn test_loader_is_reused_per_display_form() {
        let state = app_state(InMemoryBackend::new(sales_fixture()));
        let load = ElementLoad {
            display_form: ObjRef::identifier("region.name"),
            search: None,
            offset: 0,
            limit: 2,
        };

        assert_eq!(run_element_load(&state, &load).await, 2);
        let next = ElementLoad { offset: 2, ..load.clone() };
        assert_eq!(run_element_load(&state, &next).await, 1);
        assert_eq!(state.loader_for(&load.display_form).all_items().len(), 3);
    }
}
