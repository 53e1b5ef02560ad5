use chrono::{DateTime, TimeDelta, Utc};
use colored::Colorize;
use stackwatch_core::{StackApi, StackInfo, WatchOutcome, WatchReport};
use std::io::Write;

/// Asks a yes/no question on the terminal, defaulting to no
pub fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{} [y/N]: ", question);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    let answer = input.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

pub fn not_executed(change_set: &str) {
    println!("{}", format!("Change set {} was not executed", change_set).yellow());
}

/// Instant after the newest event already recorded for the stack
///
/// Used to hide events from earlier operations. Derived from the event
/// stream rather than the local clock so clock skew cannot drop events.
pub async fn events_after(
    api: &dyn StackApi,
    stack: &StackInfo,
) -> anyhow::Result<Option<DateTime<Utc>>> {
    let events = api.stack_events(stack).await?;
    Ok(newest_timestamp(events.iter().filter_map(|e| e.timestamp)))
}

fn newest_timestamp(timestamps: impl Iterator<Item = DateTime<Utc>>) -> Option<DateTime<Utc>> {
    timestamps.max().map(|ts| ts + TimeDelta::milliseconds(1))
}

/// Verifies credentials before any stack call
pub async fn ensure_authenticated(api: &dyn StackApi) -> anyhow::Result<()> {
    let auth = api.check_auth().await?;
    if !auth.authenticated {
        anyhow::bail!(
            "Not authenticated with {}: {}",
            api.name(),
            auth.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    if let Some(account) = &auth.account_info {
        println!("Account: {}", account.cyan());
    }
    Ok(())
}

/// Turns a finished watch into the process result
pub fn conclude(stack: &str, report: WatchReport) -> anyhow::Result<()> {
    tracing::debug!("Watch ended after {} polls", report.polls);
    match report.outcome {
        WatchOutcome::Succeeded { .. } => Ok(()),
        WatchOutcome::Failed { status, reason } => match reason {
            Some(reason) => anyhow::bail!("Stack {} ended in {}: {}", stack, status, reason),
            None => anyhow::bail!("Stack {} ended in {}", stack, status),
        },
        WatchOutcome::Cancelled { status } => {
            println!();
            let last = status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "{}",
                format!("Stopped watching {} (last status: {})", stack, last).yellow()
            );
            println!(
                "  The operation continues remotely. Resume with: stackwatch watch --stack {}",
                stack
            );
            Ok(())
        }
    }
}
