//! Forge/JSON → A1111 text converter

use serde_json::{Map, Value};

/// Convert a Forge-shaped (or similarly structured) JSON object into an A1111
/// text block. Returns `None` when no recognizable `prompt` key is present.
pub fn convert(value: &Value) -> Option<String> {
    let obj = value.as_object()?;
    let prompt = get_any(obj, &["prompt", "Prompt"])?.as_str()?;
    let negative = get_any(obj, &["negativePrompt", "Negative prompt", "negative_prompt"])
        .and_then(Value::as_str)
        .unwrap_or("");

    let mut settings = Vec::new();
    if let Some(v) = get_any(obj, &["steps", "Steps"]) {
        settings.push(format!("Steps: {}", scalar(v)));
    }
    if let Some(v) = get_any(obj, &["sampler", "Sampler"]) {
        settings.push(format!("Sampler: {}", scalar(v)));
    }
    if let Some(v) = get_any(obj, &["cfgScale", "cfg", "CFG scale"]) {
        settings.push(format!("CFG scale: {}", scalar(v)));
    }
    if let Some(v) = get_any(obj, &["seed", "Seed"]) {
        settings.push(format!("Seed: {}", scalar(v)));
    }
    let width = get_any(obj, &["width", "Width"]);
    let height = get_any(obj, &["height", "Height"]);
    if let (Some(w), Some(h)) = (width, height) {
        settings.push(format!("Size: {}x{}", scalar(w), scalar(h)));
    }
    let model = get_any(obj, &["model", "Model"]).or_else(|| {
        obj.get("hashes")
            .and_then(Value::as_object)
            .and_then(|hashes| hashes.get("model"))
    });
    if let Some(v) = model {
        settings.push(format!("Model: {}", scalar(v)));
    }

    Some(format!(
        "{prompt}\nNegative prompt: {negative}\n{}",
        settings.join(", ")
    ))
}

fn get_any<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_forge_shaped_object() {
        let value = json!({
            "prompt": "a cat",
            "negativePrompt": "blurry",
            "steps": 20,
            "sampler": "Euler",
            "cfg": 7,
            "seed": 42,
            "width": 512,
            "height": 512,
        });
        let text = convert(&value).unwrap();
        assert!(text.starts_with("a cat\nNegative prompt: blurry\n"));
        assert!(text.contains("Steps: 20"));
        assert!(text.contains("Size: 512x512"));
    }

    #[test]
    fn emits_negative_prompt_label_even_when_absent() {
        let value = json!({"prompt": "a cat"});
        let text = convert(&value).unwrap();
        assert!(text.contains("\nNegative prompt: \n"));
    }

    #[test]
    fn missing_prompt_returns_none() {
        assert_eq!(convert(&json!({"steps": 1})), None);
    }
}
