use std::collections::BTreeMap;

use reqwest::Method;
use serde_json::Value;

/// Builds the canonical key for a request from its method, url, params and body.
///
/// Object keys in the body are written in sorted order, so two bodies that differ
/// only in property order produce the same key.
pub fn request_key(
    method: &Method,
    url: &str,
    params: &BTreeMap<String, String>,
    body: Option<&Value>,
) -> String {
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let mut key = format!("{} {}?{}", method, url, query);
    if let Some(body) = body {
        key.push(' ');
        write_canonical(body, &mut key);
    }
    key
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}
