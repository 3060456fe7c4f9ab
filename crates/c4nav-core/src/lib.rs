pub mod analysis;
pub mod error;
pub mod export;
pub mod layout;
pub mod model;
pub mod navigate;
pub mod query;
pub mod rules;
pub mod storage;

pub use analysis::{AnalysisRecord, ImportSummary, ServiceRecord, ServiceRelationship};
pub use error::Error;
pub use export::{DiagramSnapshot, ExportFormat};
pub use layout::{EdgeLayout, Layout, LayoutConfig, NodeLayout};
pub use model::C4Model;
pub use query::{Highlight, HighlightedElement, HierarchyEntry, HierarchySummary};
pub use storage::Settings;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

// --- Types ---

/// The four C4 zoom levels, ordered from the widest view to the narrowest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum C4Level {
    Context,
    Container,
    Component,
    Code,
}

impl C4Level {
    pub fn as_str(self) -> &'static str {
        match self {
            C4Level::Context => "context",
            C4Level::Container => "container",
            C4Level::Component => "component",
            C4Level::Code => "code",
        }
    }
}

impl fmt::Display for C4Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an element represents. Code-level elements are never generated, so
/// there is no kind for them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ElementKind {
    System,
    Container,
    Component,
}

impl ElementKind {
    /// The level an element of this kind is created at.
    pub fn level(self) -> C4Level {
        match self {
            ElementKind::System => C4Level::Context,
            ElementKind::Container => C4Level::Container,
            ElementKind::Component => C4Level::Component,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::System => "System",
            ElementKind::Container => "Container",
            ElementKind::Component => "Component",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form property value attached to an element at creation. Any JSON
/// value is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<PropertyValue>),
    Map(IndexMap<String, PropertyValue>),
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

pub type Properties = IndexMap<String, PropertyValue>;

/// A node in the architecture graph. Elements live in the model's element
/// arena; parent and children are ids into that arena.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    pub name: String,
    pub kind: ElementKind,
    pub level: C4Level,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technology: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: Properties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

impl Element {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Node label used by the renderer and the DOT export.
    pub fn label(&self) -> String {
        format!("{}\n{}", self.name, self.kind)
    }
}

/// A directed edge between two elements, visible only in the diagram that
/// holds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub from: String,
    pub to: String,
    pub description: String,
    #[serde(default)]
    pub technology: String,
}

/// A named view of the graph at one level. Elements are referenced by id and
/// resolved against the model when rendered, so a view always shows the
/// current state of its elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub id: String,
    pub name: String,
    pub level: C4Level,
    pub element_ids: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Diagram {
    /// The element this view was built around: the system of a context
    /// diagram, the parent of a container/component/drill-down diagram.
    pub fn anchor_id(&self) -> Option<&str> {
        self.element_ids.first().map(String::as_str)
    }

    pub fn contains(&self, element_id: &str) -> bool {
        self.element_ids.iter().any(|id| id == element_id)
    }
}

/// Input for one new container or component, as supplied by code analysis.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct ElementSpec {
    /// Display name of the new element
    pub name: String,
    /// What the element does
    #[serde(default)]
    pub description: String,
    /// Technology label, e.g. "Rust/axum", "PostgreSQL"
    #[serde(default)]
    pub technology: String,
    /// Extra key/value data attached to the element
    #[serde(default)]
    pub properties: Properties,
}

impl ElementSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_technology(mut self, technology: impl Into<String>) -> Self {
        self.technology = technology.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Generate a fresh identifier for an element, diagram or relationship.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(C4Level::Context < C4Level::Container);
        assert!(C4Level::Container < C4Level::Component);
        assert!(C4Level::Component < C4Level::Code);
    }

    #[test]
    fn kind_maps_to_creation_level() {
        assert_eq!(ElementKind::System.level(), C4Level::Context);
        assert_eq!(ElementKind::Container.level(), C4Level::Container);
        assert_eq!(ElementKind::Component.level(), C4Level::Component);
    }

    #[test]
    fn spec_defaults_optional_fields() {
        let spec: ElementSpec = serde_json::from_str(r#"{"name": "API"}"#).unwrap();
        assert_eq!(spec, ElementSpec::named("API"));
    }

    #[test]
    fn properties_accept_nested_values() {
        let spec: ElementSpec = serde_json::from_str(
            r#"{"name": "Worker", "properties": {"replicas": 3, "public": false, "owner": "ops", "limits": {"cpu": "2"}}}"#,
        )
        .unwrap();
        assert_eq!(spec.properties["replicas"], PropertyValue::Number(3.0));
        assert_eq!(spec.properties["public"], PropertyValue::Bool(false));
        assert_eq!(spec.properties["owner"], PropertyValue::from("ops"));
        match &spec.properties["limits"] {
            PropertyValue::Map(m) => assert_eq!(m["cpu"], PropertyValue::from("2")),
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn properties_accept_lists_and_null() {
        let spec: ElementSpec = serde_json::from_str(
            r#"{"name": "API", "properties": {"ports": [80, 443], "owner": null, "tags": ["edge", {"tier": 1}]}}"#,
        )
        .unwrap();
        assert_eq!(
            spec.properties["ports"],
            PropertyValue::List(vec![PropertyValue::Number(80.0), PropertyValue::Number(443.0)])
        );
        assert_eq!(spec.properties["owner"], PropertyValue::Null);
        match &spec.properties["tags"] {
            PropertyValue::List(items) => {
                assert_eq!(items[0], PropertyValue::from("edge"));
                assert!(matches!(&items[1], PropertyValue::Map(m) if m["tier"] == PropertyValue::Number(1.0)));
            }
            other => panic!("expected list, got {other:?}"),
        }
        // Null survives a round trip as null.
        let out = serde_json::to_value(&spec.properties).unwrap();
        assert_eq!(out["owner"], serde_json::Value::Null);
        assert_eq!(out["ports"], serde_json::json!([80.0, 443.0]));
    }

    #[test]
    fn level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&C4Level::Component).unwrap(), "\"component\"");
    }
}
