use serde_json::Value;

pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
    }
}
