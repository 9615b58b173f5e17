// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use std::sync::atomic::{AtomicBool, Ordering};

/// Kind whose successful read marks the rendered output as sensitive
pub const SENSITIVE_KIND: &str = "Secret";

/// Facts accumulated while rendering one template
///
/// Shared by all lookups of an evaluation. The sensitive flag only ever goes
/// from false to true.
#[derive(Debug, Default)]
pub struct TemplateResult {
    has_sensitive_data: AtomicBool,
}

impl TemplateResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_sensitive_data(&self) -> bool {
        self.has_sensitive_data.load(Ordering::Acquire)
    }

    pub fn mark_sensitive(&self) {
        self.has_sensitive_data.store(true, Ordering::Release);
    }

    /// Record a read of `found` documents of `kind`
    pub(crate) fn record_read(&self, kind: &str, found: usize) {
        if kind == SENSITIVE_KIND && found > 0 {
            self.mark_sensitive();
        }
    }
}
