// State store - single writer, snapshot readers
pub mod action;
pub mod selectors;
pub mod state;
pub mod undo;

use action::{Batch, UndoEffect};
use state::DashboardState;
use std::sync::Arc;
use tokio::sync::watch;
use undo::UndoEntry;

/// Owner of the dashboard state. Only the commit loop holds one.
pub struct Store {
    tx: watch::Sender<Arc<DashboardState>>,
}

impl Store {
    pub fn new(initial: DashboardState) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    pub fn reader(&self) -> StoreReader {
        StoreReader {
            rx: self.tx.subscribe(),
        }
    }

    pub fn snapshot(&self) -> Arc<DashboardState> {
        self.tx.borrow().clone()
    }

    /// Applies every action of the batch and publishes the result as one new version.
    pub fn apply(&mut self, batch: Batch) -> u64 {
        let before = self.snapshot();
        let mut next = DashboardState::clone(&before);

        let mut actions = batch.actions;
        // stable: actions on the same slice keep their relative order
        actions.sort_by_key(|action| action.slice());

        let inverse = match &batch.undo {
            UndoEffect::Record { .. } => undo::inverse_actions(&before, &actions),
            _ => Vec::new(),
        };

        let action_count = actions.len();
        for action in actions {
            action.apply(&mut next);
        }

        next.version = before.version + 1;

        match batch.undo {
            UndoEffect::Skip => {}
            UndoEffect::Record {
                correlation_id,
                command,
            } => next.undo.entries.push(UndoEntry {
                correlation_id,
                command,
                version: next.version,
                inverse,
            }),
            UndoEffect::Pop => {
                next.undo.entries.pop();
            }
            UndoEffect::Clear => next.undo.entries.clear(),
        }

        let version = next.version;
        tracing::debug!(
            "Applied batch of {} actions, store version {} -> {}",
            action_count,
            before.version,
            version
        );
        self.tx.send_replace(Arc::new(next));
        version
    }
}

/// Lock-free view of the latest committed snapshot.
#[derive(Clone)]
pub struct StoreReader {
    rx: watch::Receiver<Arc<DashboardState>>,
}

impl StoreReader {
    pub fn snapshot(&self) -> Arc<DashboardState> {
        self.rx.borrow().clone()
    }

    pub fn select<R>(&self, selector: impl FnOnce(&DashboardState) -> R) -> R {
        selector(&self.rx.borrow())
    }

    pub fn version(&self) -> u64 {
        self.rx.borrow().version
    }

    /// Waits until a snapshot with at least `version` has been published.
    pub async fn wait_for_version(&self, version: u64) -> Arc<DashboardState> {
        let mut rx = self.rx.clone();
        let reached = match rx.wait_for(|state| state.version >= version).await {
            Ok(state) => state.clone(),
            // store dropped, nothing newer will ever arrive
            Err(_) => self.snapshot(),
        };
        reached
    }
}

#[cfg(test)]
mod tests {
    use super::action::{Action, LayoutAction};
    use super::*;
    use crate::application::command::{Command, CorrelationId};
    use crate::domain::layout::{Section, SectionHeader, StashId};

    fn titled(title: &str) -> Section {
        Section {
            header: Some(SectionHeader {
                title: Some(title.to_string()),
                description: None,
            }),
            items: vec![],
        }
    }

    fn record(id: &str) -> UndoEffect {
        UndoEffect::Record {
            correlation_id: CorrelationId::new(id),
            command: Command::UndoLastChange,
        }
    }

    #[test]
    fn test_apply_publishes_one_version_per_batch() {
        let mut store = Store::new(DashboardState::default());
        let reader = store.reader();

        let version = store.apply(Batch::new(
            vec![
                Action::Layout(LayoutAction::AddSection {
                    section: titled("first"),
                    index: 0,
                    used_stashes: vec![],
                }),
                Action::Layout(LayoutAction::AddSection {
                    section: titled("second"),
                    index: 1,
                    used_stashes: vec![],
                }),
            ],
            record("c1"),
        ));

        assert_eq!(version, 1);
        assert_eq!(reader.version(), 1);
        assert_eq!(reader.select(|s| s.layout.layout.sections.len()), 2);
        assert_eq!(reader.select(|s| s.undo.len()), 1);
    }

    #[test]
    fn test_undo_entry_inverse_restores_previous_layout() {
        let mut store = Store::new(DashboardState::default());
        store.apply(Batch::new(
            vec![Action::Layout(LayoutAction::AddSection {
                section: titled("kept"),
                index: 0,
                used_stashes: vec![],
            })],
            UndoEffect::Skip,
        ));
        store.apply(Batch::new(
            vec![Action::Layout(LayoutAction::RemoveSection {
                index: 0,
                stash_identifier: Some(StashId::new("s1")),
            })],
            record("c2"),
        ));

        let state = store.snapshot();
        assert!(state.layout.layout.sections.is_empty());
        assert!(state.layout.stash.contains_key(&StashId::new("s1")));

        let inverse = state.undo.last().unwrap().inverse.clone();
        store.apply(Batch::new(inverse, UndoEffect::Pop));

        let state = store.snapshot();
        assert_eq!(state.layout.layout.sections, vec![titled("kept")]);
        assert!(state.layout.stash.is_empty());
        assert!(state.undo.is_empty());
        assert_eq!(state.version, 3);
    }

    #[tokio::test]
    async fn test_reader_waits_for_version() {
        let mut store = Store::new(DashboardState::default());
        let reader = store.reader();

        let waiter = tokio::spawn(async move { reader.wait_for_version(1).await.version });
        store.apply(Batch::new(vec![], UndoEffect::Skip));

        assert_eq!(waiter.await.unwrap(), 1);
    }
}
