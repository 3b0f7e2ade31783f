//! `raw` → `fields` normalizer

use crate::comfy;
use crate::value::FieldValue;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

fn kv_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^:]+):\s*(.*)$").unwrap())
}

const RECOGNIZED_KEYS: [&str; 4] = ["prompt", "negative_prompt", "Prompt", "Negative prompt"];

pub fn normalize(raw: &IndexMap<String, String>) -> IndexMap<String, FieldValue> {
    let mut fields = IndexMap::new();

    if let Some(parameters) = raw.get("parameters") {
        fields.insert("parameters_raw".to_string(), FieldValue::String(parameters.clone()));
        parse_parameters_block(parameters, &mut fields);
    }

    for key in RECOGNIZED_KEYS {
        if let Some(value) = raw.get(key) {
            let normalized_key = key.replace(' ', "_");
            fields.insert(normalized_key, FieldValue::String(value.clone()));
        }
    }

    for (key, value) in raw {
        let trimmed = value.trim();
        let looks_json = (trimmed.starts_with('{') && trimmed.ends_with('}'))
            || (trimmed.starts_with('[') && trimmed.ends_with(']'));
        if !looks_json {
            continue;
        }
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(trimmed) {
            fields.insert(format!("{key}_json"), parsed.into());
        }
    }

    if let Some(comfy_fields) = comfy::extract(&fields) {
        fields.extend(comfy_fields);
    }

    fields
}

fn parse_parameters_block(parameters: &str, fields: &mut IndexMap<String, FieldValue>) {
    let lines: Vec<&str> = parameters
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    if let Some(first) = lines.first() {
        fields.insert("prompt".to_string(), FieldValue::String((*first).to_string()));
    }

    for line in lines.iter().skip(1) {
        for segment in line.split(", ") {
            let Some(caps) = kv_line_re().captures(segment) else {
                continue;
            };
            let key = caps[1].trim().to_string();
            if key.is_empty() {
                continue;
            }
            let value = caps[2].trim().to_string();
            fields.insert(key, FieldValue::String(value));
        }
    }
}
