// Stash resolution - splice stashed items into an outgoing item list
use crate::application::error::{CommandError, MissingReference};
use crate::domain::layout::{Item, ItemDefinition, Stash, StashId};

/// Outcome of dereferencing the stash references in a payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StashResolution {
    /// Payload items with stash contents spliced in place, in stash order.
    pub items: Vec<Item>,
    pub existing: Vec<StashId>,
    pub missing: Vec<StashId>,
    /// Contents of the existing stashes as they were read.
    pub contents: Stash,
}

pub fn resolve_stashed_items(stash: &Stash, definitions: &[ItemDefinition]) -> StashResolution {
    let mut resolution = StashResolution::default();

    for definition in definitions {
        match definition {
            ItemDefinition::Item(item) => resolution.items.push(item.clone()),
            ItemDefinition::Stashed { stash: stash_id } => match stash.get(stash_id) {
                Some(stashed) => {
                    resolution.items.extend(stashed.iter().cloned());
                    resolution.existing.push(stash_id.clone());
                    resolution.contents.insert(stash_id.clone(), stashed.clone());
                }
                None => resolution.missing.push(stash_id.clone()),
            },
        }
    }

    resolution
}

/// Resolves the stash references, failing once with every missing id.
pub fn validate_and_resolve_stashed_items(
    stash: &Stash,
    definitions: &[ItemDefinition],
) -> Result<StashResolution, CommandError> {
    let mut seen = Vec::new();
    for definition in definitions {
        if let ItemDefinition::Stashed { stash: stash_id } = definition {
            if seen.contains(&stash_id) {
                return Err(CommandError::invalid_argument(format!(
                    "stash {} is referenced more than once",
                    stash_id
                )));
            }
            seen.push(stash_id);
        }
    }

    let resolution = resolve_stashed_items(stash, definitions);
    if !resolution.missing.is_empty() {
        return Err(CommandError::unresolved(MissingReference::Stashes {
            ids: resolution.missing,
        }));
    }

    Ok(resolution)
}

/// Commit-time check that the stashes resolved in phase 1 still hold what was spliced in.
pub fn ensure_stashes_available(stash: &Stash, expected: &Stash) -> Result<(), CommandError> {
    let gone: Vec<String> = expected
        .keys()
        .filter(|id| !stash.contains_key(*id))
        .map(|id| id.to_string())
        .collect();
    if !gone.is_empty() {
        return Err(CommandError::precondition(format!(
            "stashes consumed by a concurrent command: {}",
            gone.join(", ")
        )));
    }

    let changed: Vec<String> = expected
        .iter()
        .filter(|(id, items)| stash.get(*id) != Some(*items))
        .map(|(id, _)| id.to_string())
        .collect();
    if !changed.is_empty() {
        return Err(CommandError::precondition(format!(
            "stashes replaced by a concurrent command: {}",
            changed.join(", ")
        )));
    }
    Ok(())
}
