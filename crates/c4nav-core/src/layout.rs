//! Radial layout and SVG rendering for a single diagram.
//!
//! Elements sit evenly spaced on a circle, in diagram order, starting at angle
//! zero. Positions depend only on element order, so the same diagram always
//! lays out the same way.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::C4Model;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub radius: f64,
    pub node_color: String,
    pub node_size: f64,
    pub highlight_color: String,
    pub highlight_size: f64,
    pub edge_color: String,
    pub width: f64,
    pub height: f64,
    /// SVG pixels per layout unit.
    pub scale: f64,
    pub font_family: String,
    pub font_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            radius: 3.0,
            node_color: "lightblue".to_string(),
            node_size: 20.0,
            highlight_color: "red".to_string(),
            highlight_size: 30.0,
            edge_color: "gray".to_string(),
            width: 800.0,
            height: 600.0,
            scale: 80.0,
            font_family: "sans-serif".to_string(),
            font_size: 12.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub size: f64,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub label: String,
    pub start: (f64, f64),
    pub end: (f64, f64),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layout {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Position of item `index` of `count` on a circle of `radius`.
pub fn radial_position(index: usize, count: usize, radius: f64) -> (f64, f64) {
    if count == 0 {
        return (radius, 0.0);
    }
    let angle = 2.0 * PI * index as f64 / count as f64;
    (radius * angle.cos(), radius * angle.sin())
}

impl C4Model {
    /// Lay out a diagram. Returns `None` for an unknown diagram.
    ///
    /// Elements whose id is in `highlighted` use the highlight style.
    /// Relationships with an endpoint outside the diagram are left out.
    pub fn layout<S: AsRef<str>>(&self, diagram_id: &str, highlighted: &[S], config: &LayoutConfig) -> Option<Layout> {
        let diagram = self.diagram(diagram_id)?;
        let elements = self.diagram_elements(diagram);
        let count = elements.len();

        let nodes: Vec<NodeLayout> = elements
            .iter()
            .enumerate()
            .map(|(i, element)| {
                let (x, y) = radial_position(i, count, config.radius);
                let lit = highlighted.iter().any(|h| h.as_ref() == element.id);
                NodeLayout {
                    id: element.id.clone(),
                    label: element.label(),
                    x,
                    y,
                    color: (if lit { &config.highlight_color } else { &config.node_color }).clone(),
                    size: if lit { config.highlight_size } else { config.node_size },
                    highlighted: lit,
                }
            })
            .collect();

        let position = |id: &str| nodes.iter().find(|n| n.id == id).map(|n| (n.x, n.y));
        let edges = diagram
            .relationships
            .iter()
            .filter_map(|rel| {
                let start = position(&rel.from)?;
                let end = position(&rel.to)?;
                Some(EdgeLayout {
                    from: rel.from.clone(),
                    to: rel.to.clone(),
                    label: rel.description.clone(),
                    start,
                    end,
                })
            })
            .collect();

        Some(Layout {
            title: diagram.name.clone(),
            width: config.width,
            height: config.height,
            nodes,
            edges,
        })
    }
}

/// Draw a layout as a standalone SVG document, centred on the canvas.
pub fn render_svg(layout: &Layout, config: &LayoutConfig) -> String {
    let (width, height) = (layout.width.max(1.0), layout.height.max(1.0));
    let (cx, cy) = (width / 2.0, height / 2.0);
    // Layout y grows upwards; SVG y grows downwards.
    let project = |(x, y): (f64, f64)| (cx + x * config.scale, cy - y * config.scale);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>");
    svg.push_str(&format!(
        "<defs><marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker></defs>",
        config.edge_color
    ));
    svg.push_str(&format!(
        "<text x=\"{cx:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\">{}</text>",
        config.font_size * 2.0,
        config.font_family,
        config.font_size * 1.5,
        escape_xml(&layout.title)
    ));

    for edge in &layout.edges {
        let (x1, y1) = project(edge.start);
        let (x2, y2) = project(edge.end);
        svg.push_str(&format!(
            "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" stroke=\"{}\" stroke-width=\"2\" marker-end=\"url(#arrow)\"/>",
            config.edge_color
        ));
        if !edge.label.is_empty() {
            svg.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                (x1 + x2) / 2.0,
                (y1 + y2) / 2.0,
                config.font_family,
                config.font_size * 0.85,
                config.edge_color,
                escape_xml(&edge.label)
            ));
        }
    }

    for node in &layout.nodes {
        let (x, y) = project((node.x, node.y));
        svg.push_str(&format!(
            "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{:.2}\" fill=\"{}\" stroke=\"black\" stroke-width=\"2\"><title>{}</title></circle>",
            node.size / 2.0,
            node.color,
            escape_xml(&node.id)
        ));
        let text_y = y + node.size / 2.0 + config.font_size;
        svg.push_str(&format!(
            "<text x=\"{x:.2}\" y=\"{text_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\">",
            config.font_family, config.font_size
        ));
        for (i, line) in node.label.lines().enumerate() {
            let dy = if i == 0 { 0.0 } else { config.font_size * 1.2 };
            svg.push_str(&format!("<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}</tspan>", escape_xml(line)));
        }
        svg.push_str("</text>");
    }

    svg.push_str("</svg>");
    svg
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
