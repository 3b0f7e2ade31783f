//! ComfyUI workflow-graph recognizer

use crate::value::FieldValue;
use indexmap::IndexMap;

/// Scan `fields` for a ComfyUI-shaped graph, resolve its sampler node and
/// prompts, and return the fields to merge in. Returns `None` if no
/// candidate graph yields a sampler node.
pub fn extract(fields: &IndexMap<String, FieldValue>) -> Option<IndexMap<String, FieldValue>> {
    for graph in candidate_graphs(fields) {
        if is_graph(&graph) {
            if let Some(result) = extract_from_graph(&graph) {
                return Some(result);
            }
        }
    }
    None
}

fn candidate_graphs(fields: &IndexMap<String, FieldValue>) -> Vec<IndexMap<String, FieldValue>> {
    let mut graphs = Vec::new();

    if let Some(FieldValue::Object(obj)) = fields.get("prompt_json") {
        graphs.push(obj.clone());
    }
    if let Some(FieldValue::Object(obj)) = fields.get("workflow_json") {
        if let Some(projected) = project_workflow_nodes(obj) {
            graphs.push(projected);
        }
    }

    for (key, value) in fields {
        if !key.ends_with("_json") {
            continue;
        }
        let FieldValue::Object(obj) = value else {
            continue;
        };
        if let Some(FieldValue::Object(inner)) = obj.get("prompt") {
            graphs.push(inner.clone());
        }
        if let Some(FieldValue::Object(inner)) = obj.get("workflow") {
            if let Some(projected) = project_workflow_nodes(inner) {
                graphs.push(projected);
            }
        }
    }

    graphs
}

fn is_graph(graph: &IndexMap<String, FieldValue>) -> bool {
    graph.values().any(|node| {
        node.as_object()
            .and_then(|obj| obj.get("class_type"))
            .map(|ct| matches!(ct, FieldValue::String(_)))
            .unwrap_or(false)
    })
}

fn project_workflow_nodes(workflow: &IndexMap<String, FieldValue>) -> Option<IndexMap<String, FieldValue>> {
    let FieldValue::Array(nodes) = workflow.get("nodes")? else {
        return None;
    };
    let mut map = IndexMap::new();
    for node in nodes {
        let FieldValue::Object(obj) = node else { continue };
        let Some(id) = obj.get("id").and_then(field_value_to_key) else {
            continue;
        };
        map.insert(id, node.clone());
    }
    Some(map)
}

fn field_value_to_key(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::String(s) => Some(s.clone()),
        FieldValue::Number(n) if n.fract() == 0.0 => Some((*n as i64).to_string()),
        FieldValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn extract_from_graph(graph: &IndexMap<String, FieldValue>) -> Option<IndexMap<String, FieldValue>> {
    let sampler_node = graph.values().find(|node| {
        node.as_object()
            .and_then(|obj| obj.get("class_type"))
            .and_then(FieldValue::as_str)
            .map(|ct| ct.starts_with("KSampler"))
            .unwrap_or(false)
    })?;
    let sampler_obj = sampler_node.as_object()?;
    let inputs = sampler_obj.get("inputs")?.as_object()?;

    let mut out = IndexMap::new();
    out.insert("generator".to_string(), FieldValue::String("ComfyUI".to_string()));

    for (src, dest) in [
        ("seed", "seed"),
        ("steps", "steps"),
        ("cfg", "cfg_scale"),
        ("sampler_name", "sampler"),
        ("scheduler", "scheduler"),
        ("denoise", "denoise"),
    ] {
        if let Some(v) = inputs.get(src) {
            out.insert(dest.to_string(), v.clone());
        }
    }

    if let Some(prompt) = resolve_prompt(graph, inputs.get("positive")) {
        out.insert("prompt".to_string(), FieldValue::String(prompt));
    }
    if let Some(negative) = resolve_prompt(graph, inputs.get("negative")) {
        out.insert("negative_prompt".to_string(), FieldValue::String(negative));
    }

    Some(out)
}

fn resolve_prompt(graph: &IndexMap<String, FieldValue>, input: Option<&FieldValue>) -> Option<String> {
    let node_id = match input? {
        FieldValue::Array(items) => field_value_to_key(items.first()?)?,
        other => field_value_to_key(other)?,
    };
    let node_inputs = graph.get(&node_id)?.as_object()?.get("inputs")?.as_object()?;

    if let Some(FieldValue::String(text)) = node_inputs.get("text") {
        return Some(text.clone());
    }
    let text_g = node_inputs.get("text_g").and_then(FieldValue::as_str);
    let text_l = node_inputs.get("text_l").and_then(FieldValue::as_str);
    match (text_g, text_l) {
        (Some(g), Some(l)) => Some(format!("{g} {l}")),
        (Some(g), None) => Some(g.to_string()),
        (None, Some(l)) => Some(l.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph_fields() -> IndexMap<String, FieldValue> {
        let graph = json!({
            "3": {
                "class_type": "KSampler",
                "inputs": {
                    "seed": 7, "steps": 20, "cfg": 8,
                    "sampler_name": "euler", "scheduler": "normal", "denoise": 1.0,
                    "positive": ["5", 0], "negative": ["6", 0]
                }
            },
            "5": {"class_type": "CLIPTextEncode", "inputs": {"text": "a cat"}},
            "6": {"class_type": "CLIPTextEncode", "inputs": {"text": "blurry"}}
        });
        let mut fields = IndexMap::new();
        fields.insert("prompt_json".to_string(), graph.into());
        fields
    }

    #[test]
    fn resolves_sampler_and_prompts() {
        let result = extract(&graph_fields()).unwrap();
        assert_eq!(result.get("generator"), Some(&FieldValue::String("ComfyUI".into())));
        assert_eq!(result.get("seed"), Some(&FieldValue::Number(7.0)));
        assert_eq!(result.get("cfg_scale"), Some(&FieldValue::Number(8.0)));
        assert_eq!(result.get("sampler"), Some(&FieldValue::String("euler".into())));
        assert_eq!(result.get("prompt"), Some(&FieldValue::String("a cat".into())));
        assert_eq!(result.get("negative_prompt"), Some(&FieldValue::String("blurry".into())));
    }

    #[test]
    fn non_graph_object_yields_none() {
        let mut fields = IndexMap::new();
        fields.insert("prompt_json".to_string(), json!({"a": 1}).into());
        assert!(extract(&fields).is_none());
    }

    #[test]
    fn resolves_sdxl_style_split_prompt() {
        let graph = json!({
            "1": {
                "class_type": "KSamplerAdvanced",
                "inputs": {"positive": ["2", 0], "negative": ["2", 0]}
            },
            "2": {"class_type": "CLIPTextEncodeSDXL", "inputs": {"text_g": "a cat", "text_l": "masterpiece"}}
        });
        let mut fields = IndexMap::new();
        fields.insert("prompt_json".to_string(), graph.into());
        let result = extract(&fields).unwrap();
        assert_eq!(result.get("prompt"), Some(&FieldValue::String("a cat masterpiece".into())));
    }
}
