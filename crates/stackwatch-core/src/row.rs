//! Display rows
//!
//! Change-set entries, stack events and resource summaries all describe a
//! resource from a different angle. Each is normalized into a [`DisplayRow`]
//! keyed by logical resource id so renderers only ever deal with one shape.

use crate::error::{CoreError, Result};
use crate::record::{
    Change, ChangeAction, Replacement, STACK_RESOURCE_TYPE, StackEvent, StackResourceSummary,
};
use crate::status::{ResourceStatus, StatusClass};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a display row came from; decides which fields are meaningful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSource {
    Change,
    Event,
}

impl std::fmt::Display for RowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowSource::Change => write!(f, "change"),
            RowSource::Event => write!(f, "event"),
        }
    }
}

/// One reconciled fact about a resource at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub logical_resource_id: String,
    pub resource_type: String,

    /// Only set for event rows
    pub status: Option<ResourceStatus>,

    /// Only set for event rows
    pub timestamp: Option<DateTime<Utc>>,

    pub status_reason: Option<String>,

    /// Only set for change rows
    pub replacement: Option<Replacement>,

    pub action: Option<ChangeAction>,

    pub source: Option<RowSource>,

    /// Part of the plan currently being executed
    pub active: bool,
}

fn required(value: Option<&str>, record: &'static str, field: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CoreError::malformed(record, field)),
    }
}

impl DisplayRow {
    /// Normalize a change-set entry
    pub fn from_change(change: &Change, active: bool) -> Result<Self> {
        let rc = change
            .resource_change
            .as_ref()
            .ok_or_else(|| CoreError::malformed("change", "ResourceChange"))?;

        Ok(Self {
            logical_resource_id: required(
                rc.logical_resource_id.as_deref(),
                "change",
                "LogicalResourceId",
            )?,
            resource_type: required(rc.resource_type.as_deref(), "change", "ResourceType")?,
            status: None,
            timestamp: None,
            status_reason: None,
            replacement: Some(
                rc.replacement
                    .clone()
                    .ok_or_else(|| CoreError::malformed("change", "Replacement"))?,
            ),
            action: Some(
                rc.action
                    .clone()
                    .ok_or_else(|| CoreError::malformed("change", "Action"))?,
            ),
            source: Some(RowSource::Change),
            active,
        })
    }

    /// Normalize a stack event. Events never mark a row active on their own.
    pub fn from_event(event: &StackEvent) -> Result<Self> {
        Ok(Self {
            logical_resource_id: required(
                event.logical_resource_id.as_deref(),
                "event",
                "LogicalResourceId",
            )?,
            resource_type: required(event.resource_type.as_deref(), "event", "ResourceType")?,
            status: Some(
                event
                    .resource_status
                    .clone()
                    .ok_or_else(|| CoreError::malformed("event", "ResourceStatus"))?,
            ),
            timestamp: Some(
                event
                    .timestamp
                    .ok_or_else(|| CoreError::malformed("event", "Timestamp"))?,
            ),
            status_reason: event.resource_status_reason.clone(),
            replacement: None,
            action: None,
            source: Some(RowSource::Event),
            active: false,
        })
    }

    /// Normalize a listed resource for a stack being deleted without a change set.
    ///
    /// Every listed resource is going away, so the action is always `Remove`.
    pub fn from_resource_summary(resource: &StackResourceSummary) -> Result<Self> {
        Ok(Self {
            logical_resource_id: required(
                resource.logical_resource_id.as_deref(),
                "resource",
                "LogicalResourceId",
            )?,
            resource_type: required(
                resource.resource_type.as_deref(),
                "resource",
                "ResourceType",
            )?,
            status: None,
            timestamp: None,
            status_reason: None,
            replacement: None,
            action: Some(ChangeAction::Remove),
            source: None,
            active: false,
        })
    }

    /// Classification of the row's resource status; rows without one are pending
    pub fn class(&self) -> StatusClass {
        self.status
            .as_ref()
            .map(ResourceStatus::class)
            .unwrap_or(StatusClass::Pending)
    }

    pub fn is_negative(&self) -> bool {
        self.class() == StatusClass::Negative
    }

    /// Whether this row describes the stack itself rather than one of its resources
    pub fn is_stack(&self) -> bool {
        self.resource_type == STACK_RESOURCE_TYPE
    }
}
