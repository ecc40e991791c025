// Index resolution - effective positions for insertions and moves
use crate::application::error::CommandError;
use crate::domain::layout::Layout;

/// Effective insertion index for `requested` into a sequence of `len` elements.
///
/// Requests past the end append; negative requests prepend.
pub fn resolve_index_of_new_item(len: usize, requested: i64) -> usize {
    if requested <= 0 {
        return 0;
    }
    usize::try_from(requested).map_or(len, |index| index.min(len))
}

/// Effective target of a move within a sequence of `len` elements (`len > 0`).
pub fn resolve_move_target(len: usize, requested: i64) -> usize {
    resolve_index_of_new_item(len.saturating_sub(1), requested)
}

pub fn validate_section_exists(layout: &Layout, index: usize) -> Result<(), CommandError> {
    if index < layout.sections.len() {
        return Ok(());
    }
    Err(CommandError::invalid_argument(format!(
        "Attempting to use section at wrong index {}. There are currently {} sections.",
        index,
        layout.sections.len()
    )))
}

pub fn validate_item_exists(layout: &Layout, section_index: usize, item_index: usize) -> Result<(), CommandError> {
    validate_section_exists(layout, section_index)?;

    let item_count = layout.sections[section_index].items.len();
    if item_index < item_count {
        return Ok(());
    }
    Err(CommandError::invalid_argument(format!(
        "Attempting to use item at wrong index {} of section {}. There are currently {} items.",
        item_index, section_index, item_count
    )))
}
