// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kubelock - cluster-wide mutex over a Kubernetes ConfigMap

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{acquire, release, run, status, wait, Context, LockArgs};
use config::Settings;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "kubelock",
    version,
    about = "Cluster-wide locks backed by Kubernetes ConfigMaps"
)]
struct Cli {
    /// Namespace holding the lock ConfigMap
    #[arg(short, long, global = true, env = "KUBELOCK_NAMESPACE")]
    namespace: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take the lock if it is free (exit 3 if held)
    Acquire(LockArgs),
    /// Release a lock held by this leaser
    Release(LockArgs),
    /// Poll until the lock is acquired (exit 4 on timeout)
    Wait(wait::WaitArgs),
    /// Show the current holder of a lock
    Status(status::StatusArgs),
    /// Run a command while holding the lock
    Run(run::RunArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::from_env();
    let ctx = Context::connect(cli.namespace, &settings)?;

    match cli.command {
        Commands::Acquire(args) => acquire::acquire(&ctx, args).await,
        Commands::Release(args) => release::release(&ctx, args).await,
        Commands::Wait(args) => wait::wait(&ctx, args).await,
        Commands::Status(args) => status::status(&ctx, args).await,
        Commands::Run(args) => run::run(&ctx, args).await,
    }
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
