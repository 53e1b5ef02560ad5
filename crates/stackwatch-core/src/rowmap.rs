//! Keyed row maps and merging

use crate::error::Result;
use crate::record::{Change, StackEvent, StackResourceSummary};
use crate::row::DisplayRow;
use std::collections::HashMap;

/// Display rows keyed by logical resource id
pub type RowMap = HashMap<String, DisplayRow>;

/// Build a row map from change-set entries. Later duplicates win.
pub fn change_map(changes: &[Change], active: bool) -> Result<RowMap> {
    let mut rows = RowMap::with_capacity(changes.len());
    for change in changes {
        let row = DisplayRow::from_change(change, active)?;
        rows.insert(row.logical_resource_id.clone(), row);
    }
    Ok(rows)
}

/// Build a row map from stack events. Later duplicates win, so events must
/// arrive oldest first for the newest state to stick.
pub fn event_map(events: &[StackEvent]) -> Result<RowMap> {
    let mut rows = RowMap::with_capacity(events.len());
    for event in events {
        let row = DisplayRow::from_event(event)?;
        rows.insert(row.logical_resource_id.clone(), row);
    }
    Ok(rows)
}

/// Build a row map from listed resources. Later duplicates win.
pub fn resource_map(resources: &[StackResourceSummary]) -> Result<RowMap> {
    let mut rows = RowMap::with_capacity(resources.len());
    for resource in resources {
        let row = DisplayRow::from_resource_summary(resource)?;
        rows.insert(row.logical_resource_id.clone(), row);
    }
    Ok(rows)
}

/// Copy of `rows` with every row marked active. `rows` is left untouched.
pub fn activate(rows: &RowMap) -> RowMap {
    rows.iter()
        .map(|(id, row)| {
            let mut row = row.clone();
            row.active = true;
            (id.clone(), row)
        })
        .collect()
}

/// Overlay event rows on top of `previous`.
///
/// Event rows replace earlier rows with the same id, but events carry no
/// notion of the plan, so the earlier row's `active` flag is kept.
pub fn merge_events(previous: &RowMap, events: RowMap) -> RowMap {
    let mut merged = previous.clone();
    for (id, mut row) in events {
        if let Some(prior) = previous.get(&id) {
            row.active = prior.active;
        }
        merged.insert(id, row);
    }
    merged
}

/// Rows in display order: event rows by timestamp, then the rest by id.
pub fn ordered_rows(rows: &RowMap) -> Vec<&DisplayRow> {
    let mut ordered: Vec<&DisplayRow> = rows.values().collect();
    ordered.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(ta), Some(tb)) => ta
            .cmp(&tb)
            .then_with(|| a.logical_resource_id.cmp(&b.logical_resource_id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.logical_resource_id.cmp(&b.logical_resource_id),
    });
    ordered
}

/// First failed row in display order, preferring resources over the stack row
pub fn first_negative(rows: &RowMap) -> Option<&DisplayRow> {
    let ordered = ordered_rows(rows);
    ordered
        .iter()
        .find(|row| row.is_negative() && !row.is_stack())
        .or_else(|| ordered.iter().find(|row| row.is_negative()))
        .copied()
}

/// First failed event in fetch order, preferring resources over the stack itself
///
/// Unlike [`first_negative`] this looks at the raw event sequence, so a failure
/// later overwritten by rollback events is still found.
pub fn first_negative_event(events: &[StackEvent]) -> Result<Option<DisplayRow>> {
    let mut stack_failure = None;
    for event in events {
        let row = DisplayRow::from_event(event)?;
        if !row.is_negative() {
            continue;
        }
        if !row.is_stack() {
            return Ok(Some(row));
        }
        if stack_failure.is_none() {
            stack_failure = Some(row);
        }
    }
    Ok(stack_failure)
}
