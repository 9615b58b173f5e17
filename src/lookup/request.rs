// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Lookup request parsing
//!
//! Turns the raw template arguments (apiVersion, kind, namespace, name and an
//! optional label selector) into validated parts.

use kube::core::GroupVersionKind;

use super::error::{LookupError, LookupResult};

/// A single lookup as issued by a template
///
/// An empty `name` means a List query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupRequest {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    /// Label selector, only meaningful for List queries
    pub selector: Option<String>,
}

impl LookupRequest {
    pub fn get(api_version: &str, kind: &str, namespace: &str, name: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            selector: None,
        }
    }

    pub fn list(api_version: &str, kind: &str, namespace: &str) -> Self {
        Self::get(api_version, kind, namespace, "")
    }

    pub fn with_selector(mut self, selector: &str) -> Self {
        self.selector = Some(selector.to_string());
        self
    }

    pub fn is_list(&self) -> bool {
        self.name.is_empty()
    }

    /// apiVersion and kind are required; nothing else is checked here
    pub fn check_arguments(&self) -> LookupResult<()> {
        if self.api_version.is_empty() || self.kind.is_empty() {
            return Err(LookupError::MissingArguments);
        }
        Ok(())
    }

    /// Validate the required fields and split apiVersion into group/version
    pub fn group_version_kind(&self) -> LookupResult<GroupVersionKind> {
        self.check_arguments()?;
        let (group, version) = parse_api_version(&self.api_version)?;
        Ok(GroupVersionKind::gvk(&group, &version, &self.kind))
    }
}

/// Split an apiVersion string into (group, version)
///
/// `"v1"` is the core group, `"apps/v1"` is group `apps`. More than one slash
/// is rejected.
pub fn parse_api_version(api_version: &str) -> LookupResult<(String, String)> {
    let invalid = |reason: &str| LookupError::InvalidApiVersion {
        api_version: api_version.to_string(),
        reason: reason.to_string(),
    };

    if api_version.is_empty() {
        return Ok((String::new(), String::new()));
    }
    match api_version.split_once('/') {
        None => Ok((String::new(), api_version.to_string())),
        Some((_, rest)) if rest.contains('/') => Err(invalid("unexpected GroupVersion string")),
        Some((group, version)) => Ok((group.to_string(), version.to_string())),
    }
}
