//! Textual export of a single diagram.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::layout::{render_svg, LayoutConfig};
use crate::{C4Level, C4Model, Element, Relationship, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Full-fidelity JSON of the diagram with its elements resolved.
    #[default]
    Json,
    /// Graphviz DOT.
    Dot,
    /// The radial layout drawn as SVG.
    Svg,
}

impl ExportFormat {
    /// Parse a format name. Unknown names fall back to JSON.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "dot" | "graphviz" => ExportFormat::Dot,
            "svg" => ExportFormat::Svg,
            _ => ExportFormat::Json,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Dot => "dot",
            ExportFormat::Svg => "svg",
        }
    }
}

/// A diagram together with the current state of its elements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagramSnapshot {
    pub id: String,
    pub name: String,
    pub level: C4Level,
    pub elements: Vec<Element>,
    pub relationships: Vec<Relationship>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiagramSnapshot {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_dot(&self) -> String {
        let mut lines = vec![
            "digraph G {".to_string(),
            "  rankdir=TB;".to_string(),
            "  node [shape=box, style=filled, fillcolor=lightblue];".to_string(),
        ];
        for element in &self.elements {
            lines.push(format!(
                "  \"{}\" [label=\"{}\\n{}\"];",
                escape_dot(&element.id),
                escape_dot(&element.name),
                element.kind
            ));
        }
        for rel in &self.relationships {
            lines.push(format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"];",
                escape_dot(&rel.from),
                escape_dot(&rel.to),
                escape_dot(&rel.description)
            ));
        }
        lines.push("}".to_string());
        lines.join("\n")
    }
}

impl C4Model {
    pub fn snapshot(&self, diagram_id: &str) -> Option<DiagramSnapshot> {
        let diagram = self.diagram(diagram_id)?;
        Some(DiagramSnapshot {
            id: diagram.id.clone(),
            name: diagram.name.clone(),
            level: diagram.level,
            elements: self.diagram_elements(diagram).into_iter().cloned().collect(),
            relationships: diagram.relationships.clone(),
            created_at: diagram.created_at,
            updated_at: diagram.updated_at,
        })
    }

    /// Export a diagram as text. An unknown diagram exports as an empty
    /// string.
    pub fn export_diagram(&self, diagram_id: &str, format: ExportFormat, config: &LayoutConfig) -> String {
        let Some(snapshot) = self.snapshot(diagram_id) else {
            return String::new();
        };
        match format {
            ExportFormat::Json => serde_json::to_string_pretty(&snapshot).unwrap_or_else(|e| {
                warn!(diagram_id; "Failed to serialize diagram: {e}");
                String::new()
            }),
            ExportFormat::Dot => snapshot.to_dot(),
            ExportFormat::Svg => self
                .layout::<&str>(diagram_id, &[], config)
                .map(|layout| render_svg(&layout, config))
                .unwrap_or_default(),
        }
    }
}

fn escape_dot(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}
