use crate::render::{self, TerminalRenderer};
use crate::utils;
use anyhow::Context;
use colored::Colorize;
use stackwatch_core::{ChangeSetRequest, CoreError, StackApi, WatchConfig, Watcher};
use std::path::PathBuf;
use tokio::sync::watch;

pub struct UpArgs {
    pub stack: String,
    pub template: PathBuf,
    pub tags: PathBuf,
    pub parameters: PathBuf,
    pub yes: bool,
}

pub async fn handle(
    api: &dyn StackApi,
    config: WatchConfig,
    cancel: watch::Receiver<bool>,
    args: UpArgs,
) -> anyhow::Result<()> {
    // Input files are validated before anything remote happens
    let tags = stackwatch_config::load_tags(&args.tags)?;
    let parameters = stackwatch_config::load_parameters(&args.parameters)?;
    let template_body = std::fs::read_to_string(&args.template)
        .with_context(|| format!("Unable to read template {}", args.template.display()))?;

    println!("{}", format!("Deploying {}...", args.stack).yellow());
    println!("Template: {}", args.template.display().to_string().cyan());
    if !tags.is_empty() || !parameters.is_empty() {
        println!("Tags: {}  Parameters: {}", tags.len(), parameters.len());
    }
    utils::ensure_authenticated(api).await?;

    let request = ChangeSetRequest::new(&args.stack, template_body)
        .with_parameters(parameters)
        .with_tags(tags);
    let stack = api.create_change_set(&request).await?;
    println!("Change set: {}", request.change_set_name.cyan());

    let watcher = Watcher::new(api, config).with_cancel(cancel);
    match watcher.wait_for_change_set(&stack).await {
        Ok(_) => {}
        Err(CoreError::NoChanges(reason)) => {
            tracing::debug!("Empty change set: {}", reason);
            println!("{}", "✓ No changes to deploy".green());
            return Ok(());
        }
        Err(CoreError::Cancelled(reason)) => {
            tracing::debug!("{}", reason);
            utils::not_executed(&request.change_set_name);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let seed = watcher.seed_from_changes(&stack).await?;
    println!();
    render::print_plan(&seed);
    println!();

    if !args.yes && !utils::confirm("Execute this change set?")? {
        utils::not_executed(&request.change_set_name);
        return Ok(());
    }
    // Ctrl-C while the prompt was open
    if watcher.is_cancelled() {
        utils::not_executed(&request.change_set_name);
        return Ok(());
    }

    let since = utils::events_after(api, &stack).await?;
    api.execute_change_set(&stack).await?;

    let watcher = match since {
        Some(since) => watcher.since(since),
        None => watcher,
    };
    let mut renderer = TerminalRenderer::new();
    let report = watcher.run(&stack, seed, &mut renderer).await?;
    utils::conclude(&args.stack, report)
}
