//! Step records, validation, and the renderer-ready graph shapes.
//!
//! Model output is decoded into typed [`StepRecord`]s rather than trusted
//! as-is: elements that fail to decode are rejected with a logged reason,
//! duplicate ids are rejected, and edges to nonexistent nodes are repaired
//! away before mapping.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Vertical distance between stacked nodes, in renderer units.
const NODE_VERTICAL_SPACING: f32 = 180.0;

/// Visual category of a flowchart step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepKind {
    Start,
    End,
    Input,
    Output,
    Decision,
    #[default]
    Process,
}

impl StepKind {
    /// Unknown and missing labels resolve to `Process`.
    fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("start") => StepKind::Start,
            Some("end") => StepKind::End,
            Some("input") => StepKind::Input,
            Some("output") => StepKind::Output,
            Some("decision") => StepKind::Decision,
            _ => StepKind::Process,
        }
    }
}

/// One node of the model-derived flowchart description.
#[derive(Debug, Clone, Deserialize)]
pub struct StepRecord {
    /// Step identifier; models emit both strings and numbers here
    #[serde(deserialize_with = "id_from_value")]
    pub id: String,

    /// Human-readable label for the node
    pub label: String,

    /// Visual category; absent or unrecognized values become `Process`
    #[serde(rename = "type", default, deserialize_with = "kind_from_value")]
    pub kind: StepKind,

    /// Ids of the steps this one leads to
    #[serde(default, deserialize_with = "ids_from_value")]
    pub next: Vec<String>,
}

fn canonical_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_from_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    canonical_id(&value)
        .ok_or_else(|| serde::de::Error::custom("id must be a string or a number"))
}

fn ids_from_value<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    // Models occasionally emit null instead of an empty list.
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    values
        .iter()
        .map(|v| {
            canonical_id(v)
                .ok_or_else(|| serde::de::Error::custom("next ids must be strings or numbers"))
        })
        .collect()
}

fn kind_from_value<'de, D>(deserializer: D) -> Result<StepKind, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(StepKind::from_label(value.as_str()))
}

/// Decode raw array elements into step records, rejecting malformed ones.
///
/// Each rejection is logged with the element index and reason instead of
/// vanishing silently.
pub fn decode_steps(values: Vec<Value>) -> Vec<StepRecord> {
    let mut steps = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<StepRecord>(value) {
            Ok(step) => steps.push(step),
            Err(e) => warn!("rejected step record at index {index}: {e}"),
        }
    }
    steps
}

/// Enforce structural invariants on decoded steps.
///
/// Later records reusing an earlier id are rejected; `next` references
/// with no matching node are dropped so edges never point at nonexistent
/// nodes. A chart without a start or end step is logged but kept.
pub fn validate_steps(steps: Vec<StepRecord>) -> Vec<StepRecord> {
    let mut seen = HashSet::new();
    let mut unique: Vec<StepRecord> = Vec::with_capacity(steps.len());
    for step in steps {
        if seen.insert(step.id.clone()) {
            unique.push(step);
        } else {
            warn!("rejected step record with duplicate id {:?}", step.id);
        }
    }

    let ids: HashSet<&str> = unique.iter().map(|s| s.id.as_str()).collect();
    let mut repaired = Vec::with_capacity(unique.len());
    for step in &unique {
        let mut next = Vec::with_capacity(step.next.len());
        for target in &step.next {
            if ids.contains(target.as_str()) {
                next.push(target.clone());
            } else {
                warn!(
                    "dropped dangling edge {:?} -> {:?}: no such step",
                    step.id, target
                );
            }
        }
        repaired.push(StepRecord {
            next,
            ..step.clone()
        });
    }

    if !repaired.is_empty() {
        if !repaired.iter().any(|s| s.kind == StepKind::Start) {
            warn!("flowchart has no start step");
        }
        if !repaired.iter().any(|s| s.kind == StepKind::End) {
            warn!("flowchart has no end step");
        }
    }

    repaired
}

/// Inline CSS properties for one node, in the renderer's camelCase form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    pub padding: &'static str,
    pub font_weight: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_path: Option<&'static str>,
    pub background: &'static str,
    pub border: &'static str,
    pub color: &'static str,
}

/// Fixed style table keyed on step kind.
fn shape_style(kind: StepKind) -> NodeStyle {
    let base = NodeStyle {
        padding: "10px 20px",
        font_weight: "600",
        border_radius: None,
        clip_path: None,
        background: "#E3F2FD",
        border: "2px solid #42A5F5",
        color: "#1565C0",
    };
    match kind {
        StepKind::Start => NodeStyle {
            border_radius: Some("50px"),
            background: "#E8F5E9",
            border: "2px solid #66BB6A",
            color: "#2E7D32",
            ..base
        },
        StepKind::End => NodeStyle {
            border_radius: Some("50px"),
            background: "#FFEBEE",
            border: "2px solid #EF5350",
            color: "#B71C1C",
            ..base
        },
        StepKind::Input => NodeStyle {
            clip_path: Some("polygon(10% 0%, 100% 0%, 90% 100%, 0% 100%)"),
            background: "#FFF3E0",
            border: "2px solid #FB8C00",
            color: "#E65100",
            ..base
        },
        StepKind::Output => NodeStyle {
            clip_path: Some("polygon(10% 0%, 100% 0%, 90% 100%, 0% 100%)"),
            background: "#E1F5FE",
            border: "2px solid #039BE5",
            color: "#01579B",
            ..base
        },
        StepKind::Decision => NodeStyle {
            clip_path: Some("polygon(50% 0%, 100% 50%, 50% 100%, 0% 50%)"),
            background: "#F3E5F5",
            border: "2px solid #AB47BC",
            color: "#6A1B9A",
            ..base
        },
        StepKind::Process => base,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeData {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Renderer-ready node record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub data: NodeData,
    pub position: Position,
    pub style: NodeStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke: &'static str,
    pub stroke_width: u32,
}

/// Renderer-ready directed edge record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub animated: bool,
    pub style: EdgeStyle,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FlowchartGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Map validated steps onto renderer node/edge records.
///
/// Pure and deterministic: nodes stack vertically by input index, edges
/// are the flattening of each step's `next` list. No layout beyond the
/// fixed vertical spacing.
pub fn map_steps(steps: &[StepRecord]) -> FlowchartGraph {
    let nodes = steps
        .iter()
        .enumerate()
        .map(|(index, step)| GraphNode {
            id: step.id.clone(),
            data: NodeData {
                label: step.label.clone(),
            },
            position: Position {
                x: 0.0,
                y: index as f32 * NODE_VERTICAL_SPACING,
            },
            style: shape_style(step.kind),
        })
        .collect();

    let edges = steps
        .iter()
        .flat_map(|step| {
            step.next.iter().map(|target| GraphEdge {
                id: format!("{}-{}", step.id, target),
                source: step.id.clone(),
                target: target.clone(),
                animated: true,
                style: EdgeStyle {
                    stroke: "#42A5F5",
                    stroke_width: 2,
                },
            })
        })
        .collect();

    FlowchartGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn steps_from(raw: Value) -> Vec<StepRecord> {
        let Value::Array(values) = raw else {
            panic!("fixture must be an array")
        };
        decode_steps(values)
    }

    #[test]
    fn test_decode_accepts_numeric_and_string_ids() {
        let steps = steps_from(json!([
            {"id": 1, "label": "Start", "type": "start", "next": [2]},
            {"id": "2", "label": "End", "type": "end", "next": []}
        ]));
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id, "1");
        assert_eq!(steps[0].next, vec!["2"]);
        assert_eq!(steps[1].id, "2");
    }

    #[test]
    fn test_decode_rejects_malformed_elements() {
        let steps = steps_from(json!([
            {"id": 1, "label": "ok"},
            {"label": "no id"},
            "not even an object",
            {"id": 2, "label": "also ok"}
        ]));
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id, "1");
        assert_eq!(steps[1].id, "2");
    }

    #[test]
    fn test_unknown_or_missing_type_becomes_process() {
        let steps = steps_from(json!([
            {"id": 1, "label": "a", "type": "subroutine"},
            {"id": 2, "label": "b"}
        ]));
        assert_eq!(steps[0].kind, StepKind::Process);
        assert_eq!(steps[1].kind, StepKind::Process);
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let steps = steps_from(json!([
            {"id": 1, "label": "first"},
            {"id": 1, "label": "second"}
        ]));
        let validated = validate_steps(steps);
        assert_eq!(validated.len(), 1);
        assert_eq!(validated[0].label, "first");
    }

    #[test]
    fn test_validate_drops_dangling_edges() {
        let steps = steps_from(json!([
            {"id": 1, "label": "a", "next": [2, 99]},
            {"id": 2, "label": "b", "next": []}
        ]));
        let validated = validate_steps(steps);
        assert_eq!(validated[0].next, vec!["2"]);
    }

    #[test]
    fn test_map_example_chart() {
        let steps = validate_steps(steps_from(json!([
            {"id": 1, "label": "Start", "type": "start", "next": [2]},
            {"id": 2, "label": "End", "type": "end", "next": []}
        ])));
        let graph = map_steps(&steps);

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].id, "1");
        assert_eq!(graph.nodes[1].id, "2");
        assert_eq!(graph.nodes[0].position.y, 0.0);
        assert_eq!(graph.nodes[1].position.y, NODE_VERTICAL_SPACING);

        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].id, "1-2");
        assert_eq!(graph.edges[0].source, "1");
        assert_eq!(graph.edges[0].target, "2");
    }

    #[test]
    fn test_map_is_deterministic() {
        let make = || {
            validate_steps(steps_from(json!([
                {"id": "a", "label": "read", "type": "input", "next": ["b"]},
                {"id": "b", "label": "check", "type": "decision", "next": ["a"]}
            ])))
        };
        let first = map_steps(&make());
        let second = map_steps(&make());
        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.edges, second.edges);
    }

    #[test]
    fn test_style_serializes_camel_case() {
        let style = shape_style(StepKind::Start);
        let value = serde_json::to_value(&style).expect("style serializes");
        assert_eq!(value["borderRadius"], "50px");
        assert_eq!(value["fontWeight"], "600");
        assert!(value.get("clipPath").is_none());
    }

    #[test]
    fn test_decision_style_has_diamond_clip_path() {
        let style = shape_style(StepKind::Decision);
        assert!(style.clip_path.expect("decision has clip path").contains("50% 0%"));
    }
}
