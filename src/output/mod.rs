// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod json;
mod yaml;

pub use json::JsonFormatter;
pub use yaml::YamlFormatter;

use clap::ValueEnum;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Render a lookup result; an empty lookup renders as `null`
pub fn format(value: Option<&Value>, format: &OutputFormat) -> String {
    let value = value.unwrap_or(&Value::Null);
    match format {
        OutputFormat::Json => JsonFormatter::format(value),
        OutputFormat::Yaml => YamlFormatter::format(value),
    }
}
