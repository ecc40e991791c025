// Validators - pure checks over state and payload that reject instead of mutating
use crate::application::command::DateFilterSelection;
use crate::application::error::CommandError;
use crate::application::store::selectors::select_can_edit_dashboard;
use crate::application::store::state::DashboardState;
use crate::domain::filter::{DashboardDateFilter, DateFilterType, DateGranularity, DateValue};
use crate::domain::layout::{GRID_COLUMNS, Item};
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn ensure_can_edit(state: &DashboardState) -> Result<(), CommandError> {
    if select_can_edit_dashboard(state) {
        Ok(())
    } else {
        Err(CommandError::precondition("the dashboard cannot be edited with current permissions"))
    }
}

pub fn validate_item_sizes(items: &[Item]) -> Result<(), CommandError> {
    for (idx, item) in items.iter().enumerate() {
        for (breakpoint, size) in &item.size.0 {
            if size.grid_width == 0 || size.grid_width > GRID_COLUMNS {
                return Err(CommandError::invalid_argument(format!(
                    "item {} has width {} at {:?}; widths must be between 1 and {}",
                    idx, size.grid_width, breakpoint, GRID_COLUMNS
                )));
            }
            if size.grid_height == Some(0) {
                return Err(CommandError::invalid_argument(format!(
                    "item {} has zero height at {:?}",
                    idx, breakpoint
                )));
            }
        }
    }
    Ok(())
}

pub fn parse_date(value: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        CommandError::invalid_argument(format!("'{}' is not a {} date: {}", value, DATE_FORMAT, e))
    })
}

/// Turns a date selection into the filter stored in the filter context (`None` for all time).
pub fn validate_date_selection(
    selection: &DateFilterSelection,
    current: Option<&DashboardDateFilter>,
) -> Result<Option<DashboardDateFilter>, CommandError> {
    let data_set = current.and_then(|filter| filter.data_set.clone());

    match selection {
        DateFilterSelection::AllTime => Ok(None),
        DateFilterSelection::Relative { granularity, from, to } => {
            if from > to {
                return Err(CommandError::invalid_argument(format!(
                    "relative date filter must not end before it starts ({} > {})",
                    from, to
                )));
            }
            Ok(Some(DashboardDateFilter {
                filter_type: DateFilterType::Relative,
                granularity: *granularity,
                from: DateValue::Number(*from),
                to: DateValue::Number(*to),
                data_set,
            }))
        }
        DateFilterSelection::Absolute { from, to } => {
            let start = parse_date(from)?;
            let end = parse_date(to)?;
            if start > end {
                return Err(CommandError::invalid_argument(format!(
                    "absolute date filter must not end before it starts ({} > {})",
                    from, to
                )));
            }
            Ok(Some(DashboardDateFilter {
                filter_type: DateFilterType::Absolute,
                granularity: current.map_or(DateGranularity::Day, |f| f.granularity),
                from: DateValue::Text(start.format(DATE_FORMAT).to_string()),
                to: DateValue::Text(end.format(DATE_FORMAT).to_string()),
                data_set,
            }))
        }
    }
}
