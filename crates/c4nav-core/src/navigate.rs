//! Drill-down navigation.
//!
//! Drilling into an element resolves to the diagram that shows the element
//! with its direct children. The first visit builds that diagram; later visits
//! return the one already in the store.

use chrono::Utc;
use log::debug;

use crate::{new_id, C4Level, C4Model, Diagram};

/// The level below `level`. Code is the bottom and maps to itself.
pub fn next_level(level: C4Level) -> C4Level {
    match level {
        C4Level::Context => C4Level::Container,
        C4Level::Container => C4Level::Component,
        C4Level::Component | C4Level::Code => C4Level::Code,
    }
}

impl C4Model {
    /// Resolve "drill into `element_id`" to a diagram of its children.
    ///
    /// Returns `None` when the element is unknown or has no children. If a
    /// diagram anchored on the element at the next level down already exists,
    /// the most recent one is returned unchanged. Otherwise a new diagram is
    /// built holding the element and its direct children (grandchildren are
    /// left out) with no relationships.
    pub fn drill_down(&mut self, element_id: &str) -> Option<&Diagram> {
        let element = self.element(element_id)?;
        if !element.has_children() {
            debug!(element_id; "drill_down: element has no children");
            return None;
        }
        let level = next_level(element.level);

        if let Some(existing) = self.find_exploration(element_id, level) {
            let id = existing.id.clone();
            debug!(element_id, diagram_id = id.as_str(); "drill_down: reusing diagram");
            return self.diagram(&id);
        }

        let children: Vec<String> = self
            .children_of(element_id)
            .into_iter()
            .map(|child| child.id.clone())
            .collect();
        if children.is_empty() {
            debug!(element_id; "drill_down: no listed child resolves");
            return None;
        }

        let mut element_ids = Vec::with_capacity(children.len() + 1);
        element_ids.push(element_id.to_string());
        element_ids.extend(children);

        let now = Utc::now();
        let diagram = Diagram {
            id: new_id(),
            name: format!("{} - Details", element.name),
            level,
            element_ids,
            relationships: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        debug!(element_id, diagram_id = diagram.id.as_str(); "drill_down: built new diagram");
        Some(self.insert_diagram(diagram))
    }

    /// The most recently created diagram anchored on `element_id` at `level`.
    fn find_exploration(&self, element_id: &str, level: C4Level) -> Option<&Diagram> {
        self.diagrams()
            .rev()
            .find(|d| d.level == level && d.anchor_id() == Some(element_id))
    }
}
