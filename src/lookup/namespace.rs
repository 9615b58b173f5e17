// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use super::error::{LookupError, LookupResult};

/// Pick the namespace a lookup runs in, enforcing the configured restriction
///
/// An empty `restriction` means any namespace may be read. With a restriction
/// set, an empty `target` defaults to the restricted namespace and any other
/// namespace is refused.
pub fn resolve_namespace(target: &str, restriction: &str) -> LookupResult<String> {
    if restriction.is_empty() || target == restriction {
        return Ok(target.to_string());
    }

    if target.is_empty() {
        return Ok(restriction.to_string());
    }

    Err(LookupError::RestrictedNamespace {
        namespace: target.to_string(),
        restriction: restriction.to_string(),
    })
}
