// Dispatcher - runs handlers concurrently and serializes their commits
use crate::application::backend::Services;
use crate::application::command::{Command, CommandEnvelope, CommandKind, CorrelationId};
use crate::application::context::DashboardContext;
use crate::application::error::{CommandError, DispatchError};
use crate::application::event::DashboardEvent;
use crate::application::event_bus::EventBus;
use crate::application::handlers::{Commit, Committed, Resolution, handler_for};
use crate::application::store::action::Batch;
use crate::application::store::state::DashboardState;
use crate::application::store::{Store, StoreReader};
use crate::domain::dashboard::DashboardSettings;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

struct CommitRequest {
    correlation_id: CorrelationId,
    command: Command,
    commit: Box<dyn Commit>,
    reply: oneshot::Sender<DashboardEvent>,
}

/// Cancels a dispatched command while its first phase is still running.
#[derive(Clone)]
pub struct Canceller {
    tx: Arc<watch::Sender<bool>>,
}

impl Canceller {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

pub struct CommandHandle {
    correlation_id: CorrelationId,
    canceller: Canceller,
    outcome: oneshot::Receiver<DashboardEvent>,
}

impl CommandHandle {
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// No effect once the commit has been queued.
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    /// The terminal event of the command.
    pub async fn outcome(self) -> Result<DashboardEvent, DispatchError> {
        self.outcome.await.map_err(|_| DispatchError::OutcomeLost {
            correlation_id: self.correlation_id.to_string(),
        })
    }
}

pub struct Dispatcher {
    store: StoreReader,
    services: Services,
    default_settings: DashboardSettings,
    commits: mpsc::UnboundedSender<CommitRequest>,
    bus: EventBus,
}

impl Dispatcher {
    /// Starts the commit loop on the current runtime with an empty dashboard.
    pub fn new(services: Services, default_settings: DashboardSettings) -> Self {
        let store = Store::new(DashboardState::default());
        let reader = store.reader();
        let bus = EventBus::new();
        let (commits, rx) = mpsc::unbounded_channel();

        tokio::spawn(run_commit_loop(store, rx, bus.clone()));

        Self {
            store: reader,
            services,
            default_settings,
            commits,
            bus,
        }
    }

    pub fn store(&self) -> &StoreReader {
        &self.store
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn dispatch(&self, command: Command, correlation_id: Option<CorrelationId>) -> CommandHandle {
        let envelope = CommandEnvelope::new(command, correlation_id);
        let correlation_id = envelope.correlation_id.clone();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let ctx = DashboardContext::new(
            self.store.clone(),
            self.services.clone(),
            self.default_settings.clone(),
            correlation_id.clone(),
        );
        tracing::debug!("Dispatching {} ({})", envelope.command.kind(), correlation_id);
        tokio::spawn(run_command(
            envelope,
            ctx,
            cancel_rx,
            self.commits.clone(),
            self.bus.clone(),
            outcome_tx,
        ));

        CommandHandle {
            correlation_id,
            canceller: Canceller {
                tx: Arc::new(cancel_tx),
            },
            outcome: outcome_rx,
        }
    }

    pub async fn submit(
        &self,
        command: Command,
        correlation_id: Option<CorrelationId>,
    ) -> Result<DashboardEvent, DispatchError> {
        self.dispatch(command, correlation_id).outcome().await
    }
}

/// Resolves once cancellation is requested; never when every canceller is gone.
async fn cancellation(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn shut_down() -> CommandError {
    CommandError::cancelled("dispatcher shut down")
}

async fn run_command(
    envelope: CommandEnvelope,
    ctx: DashboardContext,
    mut cancel: watch::Receiver<bool>,
    commits: mpsc::UnboundedSender<CommitRequest>,
    bus: EventBus,
    outcome: oneshot::Sender<DashboardEvent>,
) {
    let CommandEnvelope {
        correlation_id,
        command,
    } = envelope;
    let kind = command.kind();
    let handler = handler_for(command.clone());

    let resolved = tokio::select! {
        biased;
        _ = cancellation(&mut cancel) => Err(CommandError::cancelled("cancelled before commit")),
        resolved = handler.resolve(&ctx) => resolved,
    };

    let event = match resolved {
        Ok(Resolution::Query(body)) => DashboardEvent::succeeded(correlation_id, kind, None, body),
        Ok(Resolution::Mutation(commit)) => {
            let (reply, committed) = oneshot::channel();
            let request = CommitRequest {
                correlation_id: correlation_id.clone(),
                command,
                commit,
                reply,
            };
            if commits.send(request).is_err() {
                DashboardEvent::failed(correlation_id, kind, shut_down())
            } else {
                match committed.await {
                    // published by the commit loop
                    Ok(event) => {
                        let _ = outcome.send(event);
                        return;
                    }
                    Err(_) => DashboardEvent::failed(correlation_id, kind, shut_down()),
                }
            }
        }
        Err(error) => DashboardEvent::failed(correlation_id, kind, error),
    };

    report(&event, kind);
    bus.publish(&event);
    let _ = outcome.send(event);
}

fn report(event: &DashboardEvent, kind: CommandKind) {
    match event.error() {
        Some(error) => tracing::warn!("{} ({}) failed: {}", kind, event.correlation_id, error),
        None if !event.is_success() => tracing::warn!("{} ({}) cancelled", kind, event.correlation_id),
        None => tracing::debug!("{} ({}) finished", kind, event.correlation_id),
    }
}

async fn run_commit_loop(mut store: Store, mut requests: mpsc::UnboundedReceiver<CommitRequest>, bus: EventBus) {
    while let Some(request) = requests.recv().await {
        let CommitRequest {
            correlation_id,
            command,
            commit,
            reply,
        } = request;
        let kind = command.kind();

        let event = match commit.commit(&store.snapshot()) {
            Ok(Committed { actions, undo, body }) => {
                let undo = undo.effect(correlation_id.clone(), command);
                let version = store.apply(Batch::new(actions, undo));
                tracing::info!("Committed {} ({}) as version {}", kind, correlation_id, version);
                DashboardEvent::succeeded(correlation_id, kind, Some(version), body)
            }
            Err(error) => DashboardEvent::failed(correlation_id, kind, error),
        };

        report(&event, kind);
        bus.publish(&event);
        let _ = reply.send(event);
    }

    tracing::debug!("Commit loop stopped");
}
