// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use clap::Parser;
use k8slookup::lookup::ClusterScopedObject;
use k8slookup::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "k8slookup")]
#[command(author, version, about = "Look up Kubernetes resources the way a template would")]
pub struct Args {
    /// API version of the resource (e.g., v1, apps/v1)
    pub api_version: String,

    /// Resource kind (e.g., ConfigMap, Pod)
    pub kind: String,

    /// Object name; omit to list
    pub name: Option<String>,

    /// Namespace to read from (defaults to the lookup namespace, if any)
    #[arg(short, long, default_value = "")]
    pub namespace: String,

    /// Label selector for list lookups (e.g., "app=web,tier!=db")
    #[arg(short = 'l', long)]
    pub selector: Option<String>,

    /// Kubernetes context to use
    #[arg(short, long, value_name = "CONTEXT")]
    pub context: Option<String>,

    /// Restrict lookups to this namespace (overrides the config file)
    #[arg(long, value_name = "NAMESPACE")]
    pub lookup_namespace: Option<String>,

    /// Allow a cluster-scoped object under a namespace restriction; repeatable.
    /// Format: GROUP/KIND/NAME, "*" matches anything (e.g., "/Namespace/*")
    #[arg(long = "allow", value_name = "GROUP/KIND/NAME")]
    pub allow: Vec<ClusterScopedObject>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
