//! Provisioning API abstraction

use crate::error::Result;
use crate::paginate::Pages;
use crate::record::{Change, ChangeSetStatus, StackEvent, StackInfo, StackResourceSummary};
use crate::status::StackStatus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Client side of the provisioning control plane
///
/// The watcher core only talks to the API through this trait, so transports
/// (CLI wrappers, SDKs, test doubles) are interchangeable.
#[async_trait]
pub trait StackApi: Send + Sync {
    /// Returns the backend name (e.g., "aws-cli")
    fn name(&self) -> &str;

    /// Check that credentials are present and valid
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Submit a change set creating or updating a stack
    async fn create_change_set(&self, request: &ChangeSetRequest) -> Result<StackInfo>;

    /// Current status of the change set named in `stack`
    async fn change_set_status(&self, stack: &StackInfo) -> Result<ChangeSetState>;

    /// Start executing the change set named in `stack`
    async fn execute_change_set(&self, stack: &StackInfo) -> Result<()>;

    /// Submit deletion of a stack
    async fn delete_stack(&self, stack_name: &str) -> Result<StackInfo>;

    /// Current status of the stack
    async fn stack_status(&self, stack: &StackInfo) -> Result<StackStatus>;

    /// Event history of the stack, oldest first
    async fn stack_events(&self, stack: &StackInfo) -> Result<Vec<StackEvent>>;

    /// Entries of the change set named in `stack`
    async fn changes(&self, stack: &StackInfo) -> Result<Vec<Change>>;

    /// Resources of the stack, one page at a time
    fn resource_pages<'a>(&'a self, stack: &'a StackInfo) -> Pages<'a, StackResourceSummary>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Stack tag as accepted by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Template parameter as accepted by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Parameter {
    pub parameter_key: String,
    pub parameter_value: String,
}

/// Everything needed to submit a change set
#[derive(Debug, Clone)]
pub struct ChangeSetRequest {
    pub stack_name: String,
    pub change_set_name: String,
    pub template_body: String,
    pub parameters: Vec<Parameter>,
    pub tags: Vec<Tag>,
}

impl ChangeSetRequest {
    pub fn new(stack_name: impl Into<String>, template_body: impl Into<String>) -> Self {
        let stack_name = stack_name.into();
        let change_set_name = format!(
            "{}-{}",
            stack_name,
            chrono::Utc::now().format("%Y%m%d%H%M%S")
        );
        Self {
            stack_name,
            change_set_name,
            template_body: template_body.into(),
            parameters: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }
}

/// Status of a change set while it is being computed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetState {
    pub status: ChangeSetStatus,
    pub status_reason: Option<String>,
}

impl ChangeSetState {
    /// Change set failed only because the template matches what is deployed
    pub fn is_empty_change(&self) -> bool {
        self.status == ChangeSetStatus::Failed
            && self.status_reason.as_deref().is_some_and(|reason| {
                reason.contains("didn't contain changes")
                    || reason.contains("No updates are to be performed")
            })
    }
}
