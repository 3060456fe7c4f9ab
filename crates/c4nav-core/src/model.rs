//! The element and diagram store, and the operations that grow it.
//!
//! [`C4Model`] owns every [`Element`] and [`Diagram`] for the lifetime of the
//! process. Elements are kept in a flat arena keyed by id; parent and child
//! links are ids into that arena. The builder methods below and drill-down
//! are the only operations that add elements or diagrams to a live store.
//! A store can also be deserialized whole from a snapshot; such a store is
//! taken as given and can be checked with [`C4Model::hierarchy_violations`].

use chrono::Utc;
use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{new_id, C4Level, Diagram, Element, ElementKind, ElementSpec, Error, Relationship, Result};

const DEPLOYED_ON: &str = "deployed on";
const PART_OF: &str = "part of";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct C4Model {
    #[serde(default)]
    elements: IndexMap<String, Element>,
    #[serde(default)]
    diagrams: IndexMap<String, Diagram>,
}

impl C4Model {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Lookups ---

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn diagram(&self, id: &str) -> Option<&Diagram> {
        self.diagrams.get(id)
    }

    /// All elements, in creation order.
    pub fn elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.elements.values()
    }

    /// All diagrams, in creation order.
    pub fn diagrams(&self) -> impl DoubleEndedIterator<Item = &Diagram> {
        self.diagrams.values()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn diagram_count(&self) -> usize {
        self.diagrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.diagrams.is_empty()
    }

    /// Resolve a diagram's element ids against the store, skipping ids that
    /// no longer resolve.
    pub fn diagram_elements<'a>(&'a self, diagram: &'a Diagram) -> Vec<&'a Element> {
        diagram
            .element_ids
            .iter()
            .filter_map(|id| self.elements.get(id))
            .collect()
    }

    /// Direct children of an element, in the order they were added. Child ids
    /// missing from the store are skipped.
    pub fn children_of(&self, id: &str) -> Vec<&Element> {
        let Some(element) = self.elements.get(id) else {
            return Vec::new();
        };
        element
            .children
            .iter()
            .filter_map(|child_id| {
                let child = self.elements.get(child_id);
                if child.is_none() {
                    trace!(parent = id, child = child_id.as_str(); "Skipping missing child");
                }
                child
            })
            .collect()
    }

    // --- Hierarchy builder ---

    /// Create a single-element context diagram around a new top-level system.
    pub fn create_context_diagram(&mut self, system_name: &str, description: &str) -> &Diagram {
        let diagram_id = new_id();
        let system = Element {
            id: format!("{diagram_id}_system"),
            name: system_name.to_string(),
            kind: ElementKind::System,
            level: C4Level::Context,
            description: description.to_string(),
            technology: String::new(),
            properties: Default::default(),
            parent_id: None,
            children: Vec::new(),
        };

        let now = Utc::now();
        let diagram = Diagram {
            id: diagram_id,
            name: format!("{system_name} - Context"),
            level: C4Level::Context,
            element_ids: vec![system.id.clone()],
            relationships: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        debug!(system_id = system.id.as_str(), diagram_id = diagram.id.as_str(); "Created context diagram");
        self.elements.insert(system.id.clone(), system);
        self.insert_diagram(diagram)
    }

    /// Create containers inside an existing system and a container diagram
    /// showing the system and its new containers.
    ///
    /// Each container gets a "deployed on" relationship to the system in the
    /// new diagram. Fails with [`Error::NotFound`] if `system_id` does not name
    /// a system element.
    pub fn create_container_diagram(&mut self, system_id: &str, containers: &[ElementSpec]) -> Result<&Diagram> {
        self.create_child_diagram(system_id, ElementKind::System, ElementKind::Container, containers, DEPLOYED_ON, "Containers")
    }

    /// Create components inside an existing container, linked to it with
    /// "part of" relationships. Fails with [`Error::NotFound`] if
    /// `container_id` does not name a container element.
    pub fn create_component_diagram(&mut self, container_id: &str, components: &[ElementSpec]) -> Result<&Diagram> {
        self.create_child_diagram(container_id, ElementKind::Container, ElementKind::Component, components, PART_OF, "Components")
    }

    fn create_child_diagram(
        &mut self,
        parent_id: &str,
        parent_kind: ElementKind,
        child_kind: ElementKind,
        specs: &[ElementSpec],
        edge_label: &str,
        suffix: &str,
    ) -> Result<&Diagram> {
        let parent_name = match self.elements.get(parent_id) {
            Some(parent) if parent.kind == parent_kind => parent.name.clone(),
            Some(parent) => {
                debug!(
                    id = parent_id,
                    expected = parent_kind.as_str(),
                    actual = parent.kind.as_str();
                    "Anchor element has the wrong kind"
                );
                return Err(Error::not_found(parent_kind.as_str(), parent_id));
            }
            None => return Err(Error::not_found(parent_kind.as_str(), parent_id)),
        };

        let mut element_ids = Vec::with_capacity(specs.len() + 1);
        element_ids.push(parent_id.to_string());
        let mut relationships = Vec::with_capacity(specs.len());

        for spec in specs {
            let child = Element {
                id: new_id(),
                name: spec.name.clone(),
                kind: child_kind,
                level: child_kind.level(),
                description: spec.description.clone(),
                technology: spec.technology.clone(),
                properties: spec.properties.clone(),
                parent_id: Some(parent_id.to_string()),
                children: Vec::new(),
            };
            relationships.push(Relationship {
                id: new_id(),
                from: child.id.clone(),
                to: parent_id.to_string(),
                description: edge_label.to_string(),
                technology: String::new(),
            });
            element_ids.push(child.id.clone());
            self.elements.insert(child.id.clone(), child);
        }

        if let Some(parent) = self.elements.get_mut(parent_id) {
            parent.children.extend(element_ids.iter().skip(1).cloned());
        }

        let now = Utc::now();
        let diagram = Diagram {
            id: new_id(),
            name: format!("{parent_name} - {suffix}"),
            level: child_kind.level(),
            element_ids,
            relationships,
            created_at: now,
            updated_at: now,
        };

        debug!(
            parent_id,
            diagram_id = diagram.id.as_str(),
            added = specs.len();
            "Created {} diagram", child_kind.level()
        );
        Ok(self.insert_diagram(diagram))
    }

    /// Append a relationship to a diagram. Returns `false` if the diagram does
    /// not exist. Endpoints are not checked against the store.
    pub fn add_relationship(
        &mut self,
        diagram_id: &str,
        from: &str,
        to: &str,
        description: &str,
        technology: Option<&str>,
    ) -> bool {
        let Some(diagram) = self.diagrams.get_mut(diagram_id) else {
            debug!(diagram_id; "add_relationship: diagram not found");
            return false;
        };
        diagram.relationships.push(Relationship {
            id: new_id(),
            from: from.to_string(),
            to: to.to_string(),
            description: description.to_string(),
            technology: technology.unwrap_or_default().to_string(),
        });
        diagram.updated_at = Utc::now();
        true
    }

    pub(crate) fn insert_diagram(&mut self, diagram: Diagram) -> &Diagram {
        let (index, _) = self.diagrams.insert_full(diagram.id.clone(), diagram);
        &self.diagrams[index]
    }

    /// Report every parent/child link that breaks the hierarchy rules: a
    /// child that is not exactly one level below its parent, or whose
    /// `parent_id` does not point back. Missing children are not reported.
    pub fn hierarchy_violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        for parent in self.elements.values() {
            for child in parent.children.iter().filter_map(|id| self.elements.get(id)) {
                if child.parent_id.as_deref() != Some(parent.id.as_str()) {
                    out.push(format!(
                        "'{}' is listed as a child of '{}' but points to parent {:?}",
                        child.id, parent.id, child.parent_id
                    ));
                }
                if crate::navigate::next_level(parent.level) != child.level || parent.level == child.level {
                    out.push(format!(
                        "'{}' ({}) is not one level below its parent '{}' ({})",
                        child.id, child.level, parent.id, parent.level
                    ));
                }
            }
        }
        out
    }
}
