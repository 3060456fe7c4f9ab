//! Building a diagram hierarchy from a repository analysis record.
//!
//! The analyser that produces the record is outside this crate; only the
//! fields read here matter. Services become containers, their components
//! become components, and service-to-service relationships named by service
//! name are added to the container diagram.

use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{C4Model, ElementSpec, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default, schemars::JsonSchema)]
pub struct ServiceRelationship {
    /// Name of the calling service
    pub from: String,
    /// Name of the called service
    pub to: String,
    /// Nature of the coupling, e.g. "reads orders from"
    pub description: String,
    #[serde(default)]
    pub technology: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, schemars::JsonSchema)]
pub struct ServiceRecord {
    #[serde(flatten)]
    pub spec: ElementSpec,
    /// Components discovered inside this service
    #[serde(default)]
    pub components: Vec<ElementSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, schemars::JsonSchema)]
pub struct AnalysisRecord {
    /// Name of the analysed system
    pub system: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub services: Vec<ServiceRecord>,
    #[serde(default)]
    pub relationships: Vec<ServiceRelationship>,
}

impl AnalysisRecord {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Ids of everything an import created.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub system_id: String,
    pub context_diagram_id: String,
    pub container_diagram_id: String,
    pub component_diagram_ids: Vec<String>,
    /// Relationships whose service names did not resolve.
    pub skipped_relationships: usize,
}

impl C4Model {
    /// Build context, container and component diagrams from an analysis
    /// record. Returns the ids of the created system and diagrams.
    pub fn import_analysis(&mut self, record: &AnalysisRecord) -> Result<ImportSummary> {
        let context = self.create_context_diagram(&record.system, &record.description);
        let context_diagram_id = context.id.clone();
        let system_id = context.element_ids[0].clone();

        let specs: Vec<ElementSpec> = record.services.iter().map(|s| s.spec.clone()).collect();
        let containers = self.create_container_diagram(&system_id, &specs)?;
        let container_diagram_id = containers.id.clone();
        let container_ids: Vec<String> = containers.element_ids[1..].to_vec();

        let mut component_diagram_ids = Vec::new();
        for (service, container_id) in record.services.iter().zip(&container_ids) {
            if service.components.is_empty() {
                continue;
            }
            let diagram = self.create_component_diagram(container_id, &service.components)?;
            component_diagram_ids.push(diagram.id.clone());
        }

        // Later services win on duplicate names.
        let by_name: HashMap<&str, &String> = record
            .services
            .iter()
            .map(|s| s.spec.name.as_str())
            .zip(&container_ids)
            .collect();

        let mut skipped_relationships = 0;
        for rel in &record.relationships {
            match (by_name.get(rel.from.as_str()), by_name.get(rel.to.as_str())) {
                (Some(from), Some(to)) => {
                    let technology = (!rel.technology.is_empty()).then_some(rel.technology.as_str());
                    self.add_relationship(&container_diagram_id, from, to, &rel.description, technology);
                }
                _ => {
                    debug!(from = rel.from.as_str(), to = rel.to.as_str(); "Skipping relationship with unknown service");
                    skipped_relationships += 1;
                }
            }
        }

        info!(
            system_id = system_id.as_str(),
            services = record.services.len(),
            component_diagrams = component_diagram_ids.len();
            "Imported analysis for {}", record.system
        );

        Ok(ImportSummary {
            system_id,
            context_diagram_id,
            container_diagram_id,
            component_diagram_ids,
            skipped_relationships,
        })
    }
}
