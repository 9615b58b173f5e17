// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration persistence for k8slookup
//!
//! Stores the lookup restrictions applied by default. All k8slookup data is
//! stored under ~/.k8slookup/:
//! - ~/.k8slookup/config.json - user configuration
//! - ~/.k8slookup/log/ - log files

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::lookup::{ClusterScopedObject, ResolveOptions};

/// Get the base k8slookup directory (~/.k8slookup/)
pub fn base_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".k8slookup"))
        .context("Could not determine home directory")
}

/// k8slookup configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Kubeconfig context to use when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Namespace lookups are restricted to (empty for no restriction)
    #[serde(default)]
    pub lookup_namespace: String,
    /// Cluster-scoped objects readable under a namespace restriction
    #[serde(default)]
    pub cluster_scoped_allow_list: Vec<ClusterScopedObject>,
}

impl Config {
    /// Load config from disk, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Get the config file path (~/.k8slookup/config.json)
    pub fn config_path() -> Result<PathBuf> {
        Ok(base_dir()?.join("config.json"))
    }

    /// Options for one evaluation, starting from the configured restrictions
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            lookup_namespace: self.lookup_namespace.clone(),
            cluster_scoped_allow_list: self.cluster_scoped_allow_list.clone(),
            watcher: None,
        }
    }
}
