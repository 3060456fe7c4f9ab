//! Read-only queries over a diagram: highlighting and the navigation summary.

use serde::{Deserialize, Serialize};

use crate::{C4Level, C4Model, ElementKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HighlightedElement {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub diagram_id: String,
    pub highlighted_elements: Vec<HighlightedElement>,
}

impl Highlight {
    pub fn ids(&self) -> Vec<&str> {
        self.highlighted_elements.iter().map(|e| e.id.as_str()).collect()
    }
}

/// One element of a diagram, flattened for building navigation UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub level: C4Level,
    pub has_children: bool,
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HierarchySummary {
    pub diagram_id: String,
    pub name: String,
    pub level: C4Level,
    pub elements: Vec<HierarchyEntry>,
}

impl C4Model {
    /// Report which of `element_ids` appear in the diagram, in diagram order.
    ///
    /// `None` means the diagram does not exist; a diagram with no matches
    /// yields `Some` with an empty list.
    pub fn highlight_elements<S: AsRef<str>>(&self, diagram_id: &str, element_ids: &[S]) -> Option<Highlight> {
        let diagram = self.diagram(diagram_id)?;
        let highlighted_elements = self
            .diagram_elements(diagram)
            .into_iter()
            .filter(|e| element_ids.iter().any(|id| id.as_ref() == e.id))
            .map(|e| HighlightedElement {
                id: e.id.clone(),
                name: e.name.clone(),
                kind: e.kind,
                highlighted: true,
            })
            .collect();
        Some(Highlight {
            diagram_id: diagram_id.to_string(),
            highlighted_elements,
        })
    }

    pub fn hierarchy_summary(&self, diagram_id: &str) -> Option<HierarchySummary> {
        let diagram = self.diagram(diagram_id)?;
        let elements = self
            .diagram_elements(diagram)
            .into_iter()
            .map(|e| HierarchyEntry {
                id: e.id.clone(),
                name: e.name.clone(),
                kind: e.kind,
                level: e.level,
                has_children: e.has_children(),
                children: e.children.clone(),
            })
            .collect();
        Some(HierarchySummary {
            diagram_id: diagram.id.clone(),
            name: diagram.name.clone(),
            level: diagram.level,
            elements,
        })
    }
}

/// JSON form of a highlight result: `{}` when the diagram was not found.
pub fn highlight_to_json(result: Option<&Highlight>) -> serde_json::Value {
    match result {
        Some(h) => serde_json::to_value(h).unwrap_or_else(|_| serde_json::json!({})),
        None => serde_json::json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementSpec;

    fn model_with_containers() -> (C4Model, String, Vec<String>) {
        let mut model = C4Model::new();
        let system_id = model.create_context_diagram("Payments", "").element_ids[0].clone();
        let diagram = model
            .create_container_diagram(&system_id, &[ElementSpec::named("API"), ElementSpec::named("Worker")])
            .unwrap();
        let (id, ids) = (diagram.id.clone(), diagram.element_ids.clone());
        (model, id, ids)
    }

    #[test]
    fn unknown_diagram_is_empty_object() {
        let (model, _, ids) = model_with_containers();
        let result = model.highlight_elements("missing", &ids);
        assert!(result.is_none());
        assert_eq!(highlight_to_json(result.as_ref()), serde_json::json!({}));
    }

    #[test]
    fn no_ids_gives_empty_list() {
        let (model, diagram_id, _) = model_with_containers();
        let result = model.highlight_elements::<&str>(&diagram_id, &[]).unwrap();
        assert_eq!(result.diagram_id, diagram_id);
        assert!(result.highlighted_elements.is_empty());
        assert_eq!(
            highlight_to_json(Some(&result)),
            serde_json::json!({"diagramId": diagram_id, "highlightedElements": []})
        );
    }

    #[test]
    fn matches_follow_diagram_order() {
        let (model, diagram_id, ids) = model_with_containers();
        let query = [ids[2].as_str(), "not-there", ids[0].as_str()];
        let result = model.highlight_elements(&diagram_id, &query).unwrap();
        assert_eq!(result.ids(), [ids[0].as_str(), ids[2].as_str()]);
        assert!(result.highlighted_elements.iter().all(|e| e.highlighted));
        assert_eq!(result.highlighted_elements[0].kind, ElementKind::System);
    }

    #[test]
    fn summary_lists_children() {
        let (model, diagram_id, ids) = model_with_containers();
        let summary = model.hierarchy_summary(&diagram_id).unwrap();
        assert_eq!(summary.name, "Payments - Containers");
        assert_eq!(summary.level, C4Level::Container);
        assert_eq!(summary.elements.len(), 3);

        let system = &summary.elements[0];
        assert!(system.has_children);
        assert_eq!(system.children, ids[1..].to_vec());
        assert!(!summary.elements[1].has_children);
        assert_eq!(summary.elements[1].level, C4Level::Container);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["elements"][0]["hasChildren"], true);
        assert_eq!(json["elements"][0]["type"], "System");
    }

    #[test]
    fn summary_of_unknown_diagram_is_none() {
        let (model, _, _) = model_with_containers();
        assert!(model.hierarchy_summary("missing").is_none());
    }
}
