// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kubelock wait <name> --leaser L` - Poll until the lock is ours

use super::{Context, LockArgs, EXIT_TIMEOUT};
use anyhow::{anyhow, Result};
use clap::Args;
use kubelock_core::{PollError, PollOptions};
use std::process::ExitCode;
use std::time::Duration;

/// Polling schedule flags shared by `wait` and `run`
#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    /// Delay between attempts (e.g. "500ms", "2s")
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    pub interval: Duration,

    /// Grow the delay by 1.5x after every attempt
    #[arg(long)]
    pub backoff: bool,
}

impl PollArgs {
    pub fn options(&self, timeout: Option<Duration>) -> PollOptions {
        let options = PollOptions::new(self.interval).with_backoff(self.backoff);
        match timeout {
            Some(timeout) => options.with_timeout(timeout),
            None => options,
        }
    }
}

#[derive(Args, Debug)]
pub struct WaitArgs {
    #[command(flatten)]
    pub lock: LockArgs,

    /// Give up after this long; waits forever when omitted
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    #[command(flatten)]
    pub poll: PollArgs,
}

pub async fn wait(ctx: &Context, args: WaitArgs) -> Result<ExitCode> {
    let lock = ctx.qualified(&args.lock.name);
    let options = args.poll.options(args.timeout);

    match ctx
        .locker
        .acquire_within(&ctx.namespace, &args.lock.name, &args.lock.leaser, &options)
        .await
    {
        Ok(()) => {
            println!("acquired {} as {}", lock, args.lock.leaser);
            Ok(ExitCode::SUCCESS)
        }
        Err(PollError::Timeout(after)) => {
            eprintln!(
                "timed out after {} waiting for {}",
                humantime::format_duration(after),
                lock
            );
            Ok(ExitCode::from(EXIT_TIMEOUT))
        }
        Err(PollError::Operation(e)) => Err(anyhow!(e).context(format!("failed to acquire {}", lock))),
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod tests;
