// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kubelock release <name> --leaser L` - Give up a held lock

use super::{Context, LockArgs};
use anyhow::{Context as _, Result};
use std::process::ExitCode;

pub async fn release(ctx: &Context, args: LockArgs) -> Result<ExitCode> {
    let lock = ctx.qualified(&args.name);
    ctx.locker
        .release(&ctx.namespace, &args.name, args.leaser.as_str())
        .await
        .with_context(|| format!("failed to release {}", lock))?;

    println!("released {}", lock);
    Ok(ExitCode::SUCCESS)
}
