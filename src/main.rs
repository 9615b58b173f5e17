// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod cli;

use anyhow::{Result, anyhow};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;

use cli::Args;
use k8slookup::config::{self, Config};
use k8slookup::kubernetes::K8sClient;
use k8slookup::lookup::{LookupEngine, LookupOutput};
use k8slookup::output;

/// Initialize logging with file output and optional stderr
fn init_logging(verbose: bool) {
    use tracing_rolling_file::{RollingConditionBase, RollingFileAppenderBase};
    use tracing_subscriber::fmt::format::FmtSpan;

    let log_dir = config::base_dir()
        .map(|p| p.join("log"))
        .unwrap_or_else(|_| std::path::PathBuf::from("."));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
        return;
    }

    // Rotate daily or at 10MB, keep 5 files
    let log_path = log_dir.join("k8slookup.log");
    let condition = RollingConditionBase::new()
        .daily()
        .max_size(10 * 1024 * 1024);

    let file_appender = match RollingFileAppenderBase::new(log_path, condition, 5) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {}", e);
            return;
        }
    };

    let (non_blocking, guard) = file_appender.get_non_blocking_appender();
    // Leak the guard to keep the background writer alive
    std::mem::forget(guard);

    let filter = if verbose {
        "k8slookup=debug"
    } else {
        "k8slookup=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_span_events(FmtSpan::NONE);

    if verbose {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::NONE);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(stderr_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (aws-lc-rs)
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::load()?;
    let mut options = config.resolve_options();
    if let Some(namespace) = &args.lookup_namespace {
        options.lookup_namespace = namespace.clone();
    }
    options
        .cluster_scoped_allow_list
        .extend(args.allow.iter().cloned());

    let context = args.context.as_deref().or(config.context.as_deref());
    let client = K8sClient::new(context).await?;
    info!(
        context = %client.context(),
        lookup_namespace = %options.lookup_namespace,
        "Starting lookup"
    );

    let engine = LookupEngine::from_client(Arc::new(client));
    let evaluation = engine.evaluation(options);

    let found = evaluation
        .lookup(
            &args.api_version,
            &args.kind,
            &args.namespace,
            args.name.as_deref().unwrap_or(""),
            args.selector.as_deref(),
        )
        .await?;

    let value = found.map(LookupOutput::into_value);
    println!("{}", output::format(value.as_ref(), &args.output).trim_end());

    if evaluation.template_result().has_sensitive_data() {
        eprintln!("Note: the result contains sensitive data");
    }

    Ok(())
}
