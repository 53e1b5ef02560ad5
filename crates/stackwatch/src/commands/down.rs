use crate::render::{self, TerminalRenderer};
use crate::utils;
use colored::Colorize;
use stackwatch_core::{StackApi, StackInfo, WatchConfig, Watcher};
use tokio::sync::watch;

pub async fn handle(
    api: &dyn StackApi,
    config: WatchConfig,
    cancel: watch::Receiver<bool>,
    stack_name: &str,
) -> anyhow::Result<()> {
    println!("{}", format!("Deleting {}...", stack_name).yellow());
    utils::ensure_authenticated(api).await?;

    // Resources can only be listed while the stack still exists
    let existing = StackInfo::new(String::new(), stack_name);
    let status = api.stack_status(&existing).await?;
    tracing::debug!("{} is {} before delete", stack_name, status);

    let watcher = Watcher::new(api, config).with_cancel(cancel);
    let seed = watcher.seed_from_resources(&existing).await?;
    println!();
    render::print_plan(&seed);

    let since = utils::events_after(api, &existing).await?;
    if watcher.is_cancelled() {
        println!("{}", format!("Cancelled, {} was not deleted", stack_name).yellow());
        return Ok(());
    }
    let stack = api.delete_stack(stack_name).await?;
    println!();

    let watcher = match since {
        Some(since) => watcher.since(since),
        None => watcher,
    };
    let mut renderer = TerminalRenderer::new();
    let report = watcher.run(&stack, seed, &mut renderer).await?;
    utils::conclude(stack_name, report)
}
