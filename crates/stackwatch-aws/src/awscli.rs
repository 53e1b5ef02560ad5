//! aws CLI wrapper
//!
//! Wraps the `aws cloudformation` commands stackwatch needs. Every command
//! runs with `--output json` and its stdout is parsed into the core record
//! types.

use crate::error::{AwsError, Result};
use serde::{Deserialize, Serialize};
use stackwatch_core::{
    Change, ChangeSetStatus, Parameter, StackEvent, StackResourceSummary, StackStatus, Tag,
};
use std::process::Stdio;
use tokio::process::Command;

/// Capabilities acknowledged on every change set
const CAPABILITIES: [&str; 3] = [
    "CAPABILITY_IAM",
    "CAPABILITY_NAMED_IAM",
    "CAPABILITY_AUTO_EXPAND",
];

/// aws CLI wrapper
#[derive(Debug, Clone, Default)]
pub struct AwsCli {
    region: Option<String>,
    profile: Option<String>,
}

impl AwsCli {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Check if the aws CLI is installed and has working credentials
    pub async fn check_auth(&self) -> Result<CallerIdentity> {
        let which = Command::new("which").arg("aws").output().await?;

        if !which.status.success() {
            return Err(AwsError::CliNotFound);
        }

        let output = self
            .run_command(&["sts", "get-caller-identity"])
            .await
            .map_err(|e| match e {
                AwsError::CommandFailed(stderr) => AwsError::AuthenticationFailed(stderr),
                other => other,
            })?;

        let identity: CallerIdentity = serde_json::from_str(&output)?;
        Ok(identity)
    }

    /// Global arguments placed before every command
    fn global_args(&self) -> Vec<&str> {
        let mut args = vec!["--output", "json"];
        if let Some(ref region) = self.region {
            args.push("--region");
            args.push(region.as_str());
        }
        if let Some(ref profile) = self.profile {
            args.push("--profile");
            args.push(profile.as_str());
        }
        args
    }

    /// Run an aws command and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let global = self.global_args();
        let mut cmd = Command::new("aws");
        cmd.args(&global);
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: aws {} {}", global.join(" "), args.join(" "));

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AwsError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run a `cloudformation` subcommand and return stdout
    async fn cloudformation(&self, args: &[&str]) -> Result<String> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("cloudformation");
        full.extend_from_slice(args);
        self.run_command(&full).await
    }

    /// Describe a stack, or `None` if it does not exist
    pub async fn describe_stack(&self, stack: &str) -> Result<Option<StackDescription>> {
        match self
            .cloudformation(&["describe-stacks", "--stack-name", stack])
            .await
        {
            Ok(output) => {
                let described: DescribeStacksOutput = serde_json::from_str(&output)?;
                Ok(described.stacks.into_iter().next())
            }
            Err(AwsError::CommandFailed(stderr)) if is_missing_stack(&stderr) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Submit a change set
    pub async fn create_change_set(
        &self,
        input: &CreateChangeSetInput<'_>,
    ) -> Result<CreateChangeSetOutput> {
        let parameters = serde_json::to_string(input.parameters)?;
        let tags = serde_json::to_string(input.tags)?;

        let mut args = vec![
            "create-change-set",
            "--stack-name",
            input.stack_name,
            "--change-set-name",
            input.change_set_name,
            "--change-set-type",
            input.change_set_type.as_str(),
            "--template-body",
            input.template_body,
            "--capabilities",
        ];
        args.extend(CAPABILITIES);

        if !input.parameters.is_empty() {
            args.push("--parameters");
            args.push(parameters.as_str());
        }

        if !input.tags.is_empty() {
            args.push("--tags");
            args.push(tags.as_str());
        }

        let output = self.cloudformation(&args).await?;
        let created: CreateChangeSetOutput = serde_json::from_str(&output)?;
        Ok(created)
    }

    /// Describe one page of a change set
    pub async fn describe_change_set(
        &self,
        stack: &str,
        change_set: &str,
        next_token: Option<&str>,
    ) -> Result<DescribeChangeSetOutput> {
        let mut args = vec![
            "describe-change-set",
            "--stack-name",
            stack,
            "--change-set-name",
            change_set,
        ];
        if let Some(token) = next_token {
            args.push("--next-token");
            args.push(token);
        }

        let output = self.cloudformation(&args).await?;
        let described: DescribeChangeSetOutput = serde_json::from_str(&output)?;
        Ok(described)
    }

    /// Execute a computed change set
    pub async fn execute_change_set(&self, stack: &str, change_set: &str) -> Result<()> {
        self.cloudformation(&[
            "execute-change-set",
            "--stack-name",
            stack,
            "--change-set-name",
            change_set,
        ])
        .await?;
        Ok(())
    }

    /// Submit deletion of a stack
    pub async fn delete_stack(&self, stack: &str) -> Result<()> {
        self.cloudformation(&["delete-stack", "--stack-name", stack])
            .await?;
        Ok(())
    }

    /// Full event history of a stack, newest first as returned by the API
    pub async fn describe_stack_events(&self, stack: &str) -> Result<Vec<StackEvent>> {
        let output = self
            .cloudformation(&["describe-stack-events", "--stack-name", stack])
            .await?;

        let described: DescribeStackEventsOutput = serde_json::from_str(&output)?;
        Ok(described.stack_events)
    }

    /// One page of a stack's resources
    pub async fn list_stack_resources(
        &self,
        stack: &str,
        starting_token: Option<&str>,
        page_size: u32,
    ) -> Result<ListStackResourcesOutput> {
        let max_items = page_size.to_string();
        let mut args = vec![
            "list-stack-resources",
            "--stack-name",
            stack,
            "--max-items",
            max_items.as_str(),
        ];
        if let Some(token) = starting_token {
            args.push("--starting-token");
            args.push(token);
        }

        let output = self.cloudformation(&args).await?;
        let listed: ListStackResourcesOutput = serde_json::from_str(&output)?;
        Ok(listed)
    }
}

fn is_missing_stack(stderr: &str) -> bool {
    stderr.contains("does not exist")
}

/// Whether a change set creates a new stack or updates an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSetType {
    Create,
    Update,
}

impl ChangeSetType {
    /// Pick the change set type for a stack in its current state.
    ///
    /// A stack left in REVIEW_IN_PROGRESS by an unexecuted create still needs
    /// a CREATE change set.
    pub fn for_existing(stack: Option<&StackDescription>) -> Self {
        match stack {
            Some(s) if s.stack_status != StackStatus::ReviewInProgress => ChangeSetType::Update,
            _ => ChangeSetType::Create,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeSetType::Create => "CREATE",
            ChangeSetType::Update => "UPDATE",
        }
    }
}

/// Arguments for `create-change-set`
#[derive(Debug, Clone)]
pub struct CreateChangeSetInput<'a> {
    pub stack_name: &'a str,
    pub change_set_name: &'a str,
    pub change_set_type: ChangeSetType,
    pub template_body: &'a str,
    pub parameters: &'a [Parameter],
    pub tags: &'a [Tag],
}

/// Output of `sts get-caller-identity`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallerIdentity {
    pub user_id: Option<String>,
    pub account: Option<String>,
    pub arn: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacksOutput {
    #[serde(default)]
    stacks: Vec<StackDescription>,
}

/// A stack as returned by `describe-stacks`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackDescription {
    pub stack_id: String,
    pub stack_name: String,
    pub stack_status: StackStatus,
    #[serde(default)]
    pub stack_status_reason: Option<String>,
}

/// Output of `create-change-set`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateChangeSetOutput {
    pub id: String,
    pub stack_id: String,
}

/// Output of `describe-change-set`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeChangeSetOutput {
    pub status: ChangeSetStatus,
    #[serde(default)]
    pub status_reason: Option<String>,
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStackEventsOutput {
    #[serde(default)]
    stack_events: Vec<StackEvent>,
}

/// Output of `list-stack-resources`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListStackResourcesOutput {
    #[serde(default)]
    pub stack_resource_summaries: Vec<StackResourceSummary>,
    #[serde(default)]
    pub next_token: Option<String>,
}
