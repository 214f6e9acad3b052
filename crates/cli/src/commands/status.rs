// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kubelock status <name>` - Show who holds a lock

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::{Context as _, Result};
use clap::Args;
use kubelock_core::LockState;
use serde::Serialize;
use std::fmt;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Name of the ConfigMap backing the lock
    pub name: String,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct LockStatus {
    pub namespace: String,
    pub name: String,
    #[serde(flatten)]
    pub state: LockState,
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.namespace, self.name, self.state)
    }
}

pub async fn status(ctx: &Context, args: StatusArgs) -> Result<ExitCode> {
    let state = ctx
        .locker
        .inspect(&ctx.namespace, &args.name)
        .await
        .with_context(|| format!("failed to read {}", ctx.qualified(&args.name)))?;

    let status = LockStatus {
        namespace: ctx.namespace.clone(),
        name: args.name,
        state,
    };
    output::print(&status, OutputFormat::from_json_flag(args.json));
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
