//! Records returned by the provisioning API
//!
//! Field names follow the API's PascalCase JSON so records can be parsed
//! straight from a response body. Every field is optional here; the row
//! normalizer decides which ones are required.

use crate::status::{ResourceStatus, api_enum};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resource type of the stack itself when it shows up in its own event stream
pub const STACK_RESOURCE_TYPE: &str = "AWS::CloudFormation::Stack";

api_enum! {
    /// What a change set will do to a resource
    ChangeAction {
        Add => "Add",
        Modify => "Modify",
        Remove => "Remove",
        Import => "Import",
        Dynamic => "Dynamic",
    }
}

api_enum! {
    /// Whether a modification replaces the physical resource
    Replacement {
        True => "True",
        False => "False",
        Conditional => "Conditional",
        Unknown => "Unknown",
    }
}

api_enum! {
    /// Lifecycle of a change set before it is executed
    ChangeSetStatus {
        CreatePending => "CREATE_PENDING",
        CreateInProgress => "CREATE_IN_PROGRESS",
        CreateComplete => "CREATE_COMPLETE",
        DeletePending => "DELETE_PENDING",
        DeleteInProgress => "DELETE_IN_PROGRESS",
        DeleteComplete => "DELETE_COMPLETE",
        DeleteFailed => "DELETE_FAILED",
        Failed => "FAILED",
    }
}

impl ChangeSetStatus {
    /// The change set is still being computed
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            ChangeSetStatus::CreatePending | ChangeSetStatus::CreateInProgress
        )
    }
}

/// Identity of a stack and, when one exists, the change set being applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackInfo {
    pub stack_id: String,
    pub change_set_name: Option<String>,
    pub stack_name: String,
}

impl StackInfo {
    pub fn new(stack_id: impl Into<String>, stack_name: impl Into<String>) -> Self {
        Self {
            stack_id: stack_id.into(),
            change_set_name: None,
            stack_name: stack_name.into(),
        }
    }

    pub fn with_change_set(mut self, change_set_name: impl Into<String>) -> Self {
        self.change_set_name = Some(change_set_name.into());
        self
    }

    /// Identifier to address API calls with; the id survives deletion, the name does not
    pub fn address(&self) -> &str {
        if self.stack_id.is_empty() {
            &self.stack_name
        } else {
            &self.stack_id
        }
    }
}

/// One entry of a change set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Change {
    #[serde(default)]
    pub resource_change: Option<ResourceChange>,
}

/// Per-resource detail of a change set entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceChange {
    #[serde(default)]
    pub action: Option<ChangeAction>,
    #[serde(default)]
    pub logical_resource_id: Option<String>,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub replacement: Option<Replacement>,
}

/// One entry of a stack's event history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackEvent {
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub stack_id: Option<String>,
    #[serde(default)]
    pub stack_name: Option<String>,
    #[serde(default)]
    pub logical_resource_id: Option<String>,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resource_status: Option<ResourceStatus>,
    #[serde(default)]
    pub resource_status_reason: Option<String>,
}

/// One resource as listed by the resource-listing API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackResourceSummary {
    #[serde(default)]
    pub logical_resource_id: Option<String>,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub last_updated_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resource_status: Option<ResourceStatus>,
    #[serde(default)]
    pub resource_status_reason: Option<String>,
}
