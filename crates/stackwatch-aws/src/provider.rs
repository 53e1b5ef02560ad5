//! CloudFormation backend implementation

use crate::awscli::{AwsCli, ChangeSetType, CreateChangeSetInput};
use crate::error::AwsError;
use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use stackwatch_core::{
    AuthStatus, Change, ChangeSetRequest, ChangeSetState, CoreError, Pages, StackApi, StackEvent,
    StackInfo, StackResourceSummary, StackStatus, collect_pages,
};

/// Page size used when listing stack resources
const RESOURCE_PAGE_SIZE: u32 = 100;

/// CloudFormation through the aws CLI
pub struct CloudFormationCli {
    cli: AwsCli,
    page_size: u32,
}

impl CloudFormationCli {
    pub fn new(cli: AwsCli) -> Self {
        Self {
            cli,
            page_size: RESOURCE_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn change_set_name<'s>(stack: &'s StackInfo) -> Result<&'s str, AwsError> {
        stack
            .change_set_name
            .as_deref()
            .ok_or_else(|| AwsError::MissingChangeSet(stack.stack_name.clone()))
    }
}

#[async_trait]
impl StackApi for CloudFormationCli {
    fn name(&self) -> &str {
        "aws-cli"
    }

    async fn check_auth(&self) -> stackwatch_core::Result<AuthStatus> {
        match self.cli.check_auth().await {
            Ok(identity) => {
                let account_info = match (identity.arn, identity.account) {
                    (Some(arn), Some(account)) => format!("{} ({})", arn, account),
                    (Some(arn), None) => arn,
                    (None, Some(account)) => account,
                    (None, None) => "Unknown".to_string(),
                };
                Ok(AuthStatus::ok(account_info))
            }
            Err(AwsError::CliNotFound) => Ok(AuthStatus::failed("aws CLI is not installed")),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn create_change_set(
        &self,
        request: &ChangeSetRequest,
    ) -> stackwatch_core::Result<StackInfo> {
        let existing = self.cli.describe_stack(&request.stack_name).await?;
        let change_set_type = ChangeSetType::for_existing(existing.as_ref());

        tracing::info!(
            "Creating {} change set {} for {}",
            change_set_type.as_str(),
            request.change_set_name,
            request.stack_name
        );

        let created = self
            .cli
            .create_change_set(&CreateChangeSetInput {
                stack_name: &request.stack_name,
                change_set_name: &request.change_set_name,
                change_set_type,
                template_body: &request.template_body,
                parameters: &request.parameters,
                tags: &request.tags,
            })
            .await?;

        tracing::debug!("Change set id: {}", created.id);
        Ok(StackInfo::new(created.stack_id, &request.stack_name)
            .with_change_set(&request.change_set_name))
    }

    async fn change_set_status(
        &self,
        stack: &StackInfo,
    ) -> stackwatch_core::Result<ChangeSetState> {
        let change_set = Self::change_set_name(stack)?;
        let described = self
            .cli
            .describe_change_set(stack.address(), change_set, None)
            .await?;

        Ok(ChangeSetState {
            status: described.status,
            status_reason: described.status_reason,
        })
    }

    async fn execute_change_set(&self, stack: &StackInfo) -> stackwatch_core::Result<()> {
        let change_set = Self::change_set_name(stack)?;
        tracing::info!("Executing change set {} on {}", change_set, stack.stack_name);
        self.cli
            .execute_change_set(stack.address(), change_set)
            .await?;
        Ok(())
    }

    async fn delete_stack(&self, stack_name: &str) -> stackwatch_core::Result<StackInfo> {
        // Resolve the id first: once deleted, the stack is only reachable by id
        let existing = self
            .cli
            .describe_stack(stack_name)
            .await?
            .ok_or_else(|| AwsError::StackNotFound(stack_name.to_string()))?;

        tracing::info!("Deleting stack {}", existing.stack_name);
        self.cli.delete_stack(&existing.stack_id).await?;

        Ok(StackInfo::new(existing.stack_id, existing.stack_name))
    }

    async fn stack_status(&self, stack: &StackInfo) -> stackwatch_core::Result<StackStatus> {
        let described = self
            .cli
            .describe_stack(stack.address())
            .await?
            .ok_or_else(|| CoreError::StackNotFound(stack.stack_name.clone()))?;
        Ok(described.stack_status)
    }

    async fn stack_events(&self, stack: &StackInfo) -> stackwatch_core::Result<Vec<StackEvent>> {
        let mut events = self.cli.describe_stack_events(stack.address()).await?;
        events.reverse();
        Ok(events)
    }

    async fn changes(&self, stack: &StackInfo) -> stackwatch_core::Result<Vec<Change>> {
        let change_set = Self::change_set_name(stack)?;
        let pages = token_pages(move |token| async move {
            let page = self
                .cli
                .describe_change_set(stack.address(), change_set, token.as_deref())
                .await?;
            Ok::<_, CoreError>((page.changes, page.next_token))
        });
        collect_pages(pages).await
    }

    fn resource_pages<'a>(&'a self, stack: &'a StackInfo) -> Pages<'a, StackResourceSummary> {
        token_pages(move |token| async move {
            let page = self
                .cli
                .list_stack_resources(stack.address(), token.as_deref(), self.page_size)
                .await?;

            tracing::debug!(
                "Fetched {} resources of {}",
                page.stack_resource_summaries.len(),
                stack.stack_name
            );
            Ok::<_, CoreError>((page.stack_resource_summaries, page.next_token))
        })
    }
}

/// Pages driven by a NextToken, fetching until a page comes back without one
///
/// `fetch` receives `None` for the first page and the previous page's token after that.
fn token_pages<'a, T, F, Fut>(fetch: F) -> Pages<'a, T>
where
    T: Send + 'a,
    F: Fn(Option<String>) -> Fut + Send + 'a,
    Fut: Future<Output = stackwatch_core::Result<(Vec<T>, Option<String>)>> + Send + 'a,
{
    // State: Some(token) while pages remain, the first token being None
    stream::try_unfold(Some(None::<String>), move |state| {
        let page = state.map(&fetch);
        async move {
            let Some(page) = page else {
                return Ok::<_, CoreError>(None);
            };
            let (items, next_token) = page.await?;
            Ok(Some((items, next_token.map(Some))))
        }
    })
    .boxed()
}
