// Filter value resolution - element titles and concrete date ranges for drills
use crate::application::backend::{ElementsQuery, ElementsRequest};
use crate::application::error::CommandError;
use crate::application::event::{ResolvedDateRange, ResolvedFilterValues};
use crate::application::validation::parse_date;
use crate::domain::filter::{AttributeElements, DashboardFilter, DateGranularity};
use crate::domain::refs::ObjRef;
use chrono::{Datelike, Days, Months, NaiveDate};
use std::collections::BTreeMap;

fn attribute_key(display_form: &ObjRef) -> String {
    match display_form {
        ObjRef::Identifier(id) => id.clone(),
        ObjRef::Uri(uri) => uri.clone(),
    }
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}

fn month_periods(period_start: NaiveDate, months_per_period: i64, from: i64, to: i64) -> Option<(NaiveDate, NaiveDate)> {
    let start = shift_months(period_start, from.checked_mul(months_per_period)?)?;
    let next = shift_months(period_start, to.checked_add(1)?.checked_mul(months_per_period)?)?;
    Some((start, next.pred_opt()?))
}

/// Concrete `[from, to]` of a relative filter, offsets counted in whole periods from
/// the period containing `today`. Weeks start on Sunday.
pub fn relative_date_range(
    granularity: DateGranularity,
    from: i64,
    to: i64,
    today: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    match granularity {
        DateGranularity::Day => Some((shift_days(today, from)?, shift_days(today, to)?)),
        DateGranularity::Week => {
            let week_start = shift_days(today, -i64::from(today.weekday().num_days_from_sunday()))?;
            let start = shift_days(week_start, from.checked_mul(7)?)?;
            let end = shift_days(week_start, to.checked_mul(7)?.checked_add(6)?)?;
            Some((start, end))
        }
        DateGranularity::Month => month_periods(today.with_day(1)?, 1, from, to),
        DateGranularity::Quarter => {
            let first_month = (today.month0() / 3) * 3 + 1;
            month_periods(NaiveDate::from_ymd_opt(today.year(), first_month, 1)?, 3, from, to)
        }
        DateGranularity::Year => month_periods(NaiveDate::from_ymd_opt(today.year(), 1, 1)?, 12, from, to),
    }
}

async fn element_titles(
    display_form: &ObjRef,
    elements: &AttributeElements,
    query: &dyn ElementsQuery,
) -> Result<BTreeMap<String, String>, CommandError> {
    match elements {
        AttributeElements::Values(values) => Ok(values.iter().map(|v| (v.clone(), v.clone())).collect()),
        AttributeElements::Uris(uris) if uris.is_empty() => Ok(BTreeMap::new()),
        AttributeElements::Uris(uris) => {
            let mut request = ElementsRequest::page(display_form.clone(), 0, uris.len());
            request.uris = Some(uris.clone());

            let page = query
                .query_elements(request)
                .await
                .map_err(|e| CommandError::external("elements", e))?;
            Ok(page
                .items
                .into_iter()
                .map(|element| (element.uri, element.title))
                .collect())
        }
    }
}

/// Resolves human-readable values for `filters`, querying element titles as needed.
pub async fn resolve_filter_values(
    filters: &[DashboardFilter],
    query: &dyn ElementsQuery,
    today: NaiveDate,
) -> Result<ResolvedFilterValues, CommandError> {
    let mut resolved = ResolvedFilterValues::default();

    for filter in filters {
        match filter {
            DashboardFilter::PositiveAttribute { display_form, elements }
            | DashboardFilter::NegativeAttribute { display_form, elements } => {
                let titles = element_titles(display_form, elements, query).await?;
                resolved
                    .attribute_filters
                    .entry(attribute_key(display_form))
                    .or_default()
                    .extend(titles);
            }
            DashboardFilter::RelativeDate {
                data_set,
                granularity,
                from,
                to,
            } => {
                let (start, end) = relative_date_range(*granularity, *from, *to, today).ok_or_else(|| {
                    CommandError::invalid_argument(format!(
                        "relative date range {} .. {} ({}) is out of the supported calendar",
                        from, to, granularity
                    ))
                })?;
                resolved.date_filters.push(ResolvedDateRange {
                    data_set: data_set.clone(),
                    from: start,
                    to: end,
                });
            }
            DashboardFilter::AbsoluteDate { data_set, from, to } => {
                resolved.date_filters.push(ResolvedDateRange {
                    data_set: data_set.clone(),
                    from: parse_date(from)?,
                    to: parse_date(to)?,
                });
            }
        }
    }

    tracing::debug!(
        "Resolved values of {} attribute and {} date filters",
        resolved.attribute_filters.len(),
        resolved.date_filters.len()
    );
    Ok(resolved)
}
