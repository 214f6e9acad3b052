// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kubelock acquire <name> --leaser L` - Take the lock once, without waiting

use super::{Context, LockArgs, EXIT_HELD};
use anyhow::{Context as _, Result};
use kubelock_core::AcquireOutcome;
use std::process::ExitCode;

pub async fn acquire(ctx: &Context, args: LockArgs) -> Result<ExitCode> {
    let lock = ctx.qualified(&args.name);
    let outcome = ctx
        .locker
        .try_acquire(&ctx.namespace, &args.name, &args.leaser)
        .await
        .with_context(|| format!("failed to acquire {}", lock))?;

    Ok(report(&lock, &args.leaser.to_string(), &outcome))
}

/// Print the outcome and map it to an exit code
pub fn report(lock: &str, leaser: &str, outcome: &AcquireOutcome) -> ExitCode {
    match outcome {
        AcquireOutcome::Acquired => {
            println!("acquired {} as {}", lock, leaser);
            ExitCode::SUCCESS
        }
        AcquireOutcome::Held { leaser: holder } => {
            eprintln!("{} is held by {}", lock, holder);
            ExitCode::from(EXIT_HELD)
        }
        AcquireOutcome::Unmanaged => {
            eprintln!("{} exists but is not a lock (no `locked` field)", lock);
            ExitCode::from(EXIT_HELD)
        }
        AcquireOutcome::LostRace => {
            eprintln!("{} was taken by another leaser", lock);
            ExitCode::from(EXIT_HELD)
        }
    }
}
