// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kubelock run <name> --leaser L -- <cmd>...` - Run a command while holding the lock

use super::acquire::report;
use super::wait::PollArgs;
use super::{Context, LockArgs, EXIT_TIMEOUT};
use anyhow::{anyhow, Context as _, Result};
use clap::Args;
use kubelock_core::{AcquireOutcome, PollError};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub lock: LockArgs,

    /// Wait up to this long for the lock instead of failing immediately
    #[arg(long, value_parser = humantime::parse_duration)]
    pub wait: Option<Duration>,

    #[command(flatten)]
    pub poll: PollArgs,

    /// Command and arguments to run
    #[arg(last = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

pub async fn run(ctx: &Context, args: RunArgs) -> Result<ExitCode> {
    let lock = ctx.qualified(&args.lock.name);

    if let Some(code) = take_lock(ctx, &args, &lock).await? {
        return Ok(code);
    }

    let outcome = run_child(&args.command).await;

    // Always give the lock back, even when the command could not start
    let released = ctx
        .locker
        .release(&ctx.namespace, &args.lock.name, args.lock.leaser.as_str())
        .await;

    match (outcome, released) {
        (Ok(code), Ok(())) => {
            tracing::info!(lock = %lock, code, "command finished");
            Ok(ExitCode::from(code))
        }
        (Ok(code), Err(e)) => {
            eprintln!("error: failed to release {}: {}", lock, e);
            Ok(ExitCode::from(if code == 0 { 1 } else { code }))
        }
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_err)) => {
            eprintln!("error: failed to release {}: {}", lock, release_err);
            Err(e)
        }
    }
}

/// Acquire the lock; `Some(code)` means stop without running the command
async fn take_lock(ctx: &Context, args: &RunArgs, lock: &str) -> Result<Option<ExitCode>> {
    match args.wait {
        Some(timeout) => {
            let options = args.poll.options(Some(timeout));
            match ctx
                .locker
                .acquire_within(&ctx.namespace, &args.lock.name, &args.lock.leaser, &options)
                .await
            {
                Ok(()) => Ok(None),
                Err(PollError::Timeout(_)) => {
                    eprintln!("timed out waiting for {}", lock);
                    Ok(Some(ExitCode::from(EXIT_TIMEOUT)))
                }
                Err(PollError::Operation(e)) => {
                    Err(anyhow!(e).context(format!("failed to acquire {}", lock)))
                }
            }
        }
        None => {
            let outcome = ctx
                .locker
                .try_acquire(&ctx.namespace, &args.lock.name, &args.lock.leaser)
                .await
                .with_context(|| format!("failed to acquire {}", lock))?;
            match outcome {
                AcquireOutcome::Acquired => Ok(None),
                other => Ok(Some(report(lock, args.lock.leaser.as_str(), &other))),
            }
        }
    }
}

/// Run the command to completion and return its exit code
async fn run_child(command: &[String]) -> Result<u8> {
    let (program, rest) = command
        .split_first()
        .ok_or_else(|| anyhow!("no command given"))?;

    let mut child = tokio::process::Command::new(program)
        .args(rest)
        .spawn()
        .with_context(|| format!("failed to start {}", program))?;

    let status = loop {
        tokio::select! {
            status = child.wait() => break status.with_context(|| format!("failed to wait for {}", program))?,
            // The child shares our process group and sees the signal too
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!(program = %program, "interrupted; waiting for command to exit");
            }
        }
    };

    Ok(exit_status_code(status))
}

fn exit_status_code(status: std::process::ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return u8::try_from(code).unwrap_or(1);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return u8::try_from(128 + signal).unwrap_or(1);
        }
    }
    1
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
