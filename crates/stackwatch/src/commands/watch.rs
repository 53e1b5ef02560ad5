use crate::render::TerminalRenderer;
use crate::utils;
use colored::Colorize;
use stackwatch_core::{RowMap, StackApi, StackInfo, WatchConfig, Watcher};
use tokio::sync::watch;

pub async fn handle(
    api: &dyn StackApi,
    config: WatchConfig,
    cancel: watch::Receiver<bool>,
    stack_name: &str,
) -> anyhow::Result<()> {
    utils::ensure_authenticated(api).await?;

    let by_name = StackInfo::new(String::new(), stack_name);
    let status = api.stack_status(&by_name).await?;

    // Pin the stack id so a deletion in progress stays observable
    let stack_id = api
        .stack_events(&by_name)
        .await?
        .into_iter()
        .find_map(|event| event.stack_id)
        .unwrap_or_default();
    let stack = StackInfo::new(stack_id, stack_name);

    println!(
        "{} {} ({})",
        "Watching".yellow(),
        stack_name.cyan(),
        status
    );
    println!();

    let watcher = Watcher::new(api, config).with_cancel(cancel);
    let mut renderer = TerminalRenderer::new();
    let report = watcher.run(&stack, RowMap::new(), &mut renderer).await?;
    utils::conclude(stack_name, report)
}
