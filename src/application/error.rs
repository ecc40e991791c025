// Command failures - the typed reasons carried by failure events
use crate::domain::layout::StashId;
use crate::domain::refs::ObjRef;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MissingReference {
    Stashes { ids: Vec<StashId> },
    Insights { refs: Vec<ObjRef> },
    CatalogItems { refs: Vec<ObjRef> },
    DateDataset { data_set: ObjRef },
    Widget { widget: ObjRef },
    Filter { local_id: String },
}

impl std::fmt::Display for MissingReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingReference::Stashes { ids } => {
                let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                write!(
                    f,
                    "Attempting to use non-existing stashes. Identifiers of missing stashes: {}",
                    ids.join(", ")
                )
            }
            MissingReference::Insights { refs } => write!(f, "unknown insights: {}", join_refs(refs)),
            MissingReference::CatalogItems { refs } => {
                write!(f, "unknown catalog items: {}", join_refs(refs))
            }
            MissingReference::DateDataset { data_set } => {
                write!(f, "unknown date dataset: {}", data_set)
            }
            MissingReference::Widget { widget } => write!(f, "unknown widget: {}", widget),
            MissingReference::Filter { local_id } => {
                write!(f, "unknown filter context item: {}", local_id)
            }
        }
    }
}

fn join_refs(refs: &[ObjRef]) -> String {
    refs.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum CommandError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("{missing}")]
    UnresolvedReference { missing: MissingReference },

    #[error("precondition failed: {message}")]
    PreconditionFailed { message: String },

    #[error("{collaborator} failed: {message}")]
    ExternalFailure {
        collaborator: &'static str,
        message: String,
    },

    #[error("cancelled: {message}")]
    Cancelled { message: String },
}

impl CommandError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CommandError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn unresolved(missing: MissingReference) -> Self {
        CommandError::UnresolvedReference { missing }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        CommandError::PreconditionFailed {
            message: message.into(),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        CommandError::Cancelled {
            message: message.into(),
        }
    }

    /// Wraps a collaborator error without retrying.
    pub fn external(collaborator: &'static str, error: anyhow::Error) -> Self {
        CommandError::ExternalFailure {
            collaborator,
            message: format!("{:#}", error),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CommandError::Cancelled { .. })
    }
}

/// Errors of the dispatch machinery itself, as opposed to command outcomes.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("command task for {correlation_id} ended without an outcome")]
    OutcomeLost { correlation_id: String },
}
