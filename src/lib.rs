// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Read-only Kubernetes object lookups for template evaluation
//!
//! Templates read cluster state through [`lookup::EvaluationContext`], which
//! enforces the namespace restriction and cluster-scoped allowlist, resolves
//! resource types and serves reads either from live watches or from a
//! per-evaluation cache in front of the API server.

pub mod config;
pub mod kubernetes;
pub mod lookup;
pub mod output;
