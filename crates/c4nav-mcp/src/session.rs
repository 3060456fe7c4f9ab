//! Conversation state behind the MCP tools.
//!
//! A session owns the model, remembers which diagram the conversation is
//! looking at and which elements were last highlighted, and writes the
//! autosave snapshot after every change. Every method returns the text the
//! tool sends back; `Err` becomes an error result.

use c4nav_core::export::ExportFormat;
use c4nav_core::query::highlight_to_json;
use c4nav_core::storage::{validate_snapshot_name, Storage};
use c4nav_core::{AnalysisRecord, C4Model, ElementSpec, Settings};
use log::{debug, info, warn};

pub type ToolResult = Result<String, String>;

pub struct Session {
    model: C4Model,
    current_diagram: Option<String>,
    highlighted: Vec<String>,
    settings: Settings,
    storage: Storage,
}

impl Session {
    /// Open a session on `storage`. If settings name an autosave snapshot
    /// that exists, the model is restored from it.
    pub fn open(storage: Storage) -> Self {
        let mut settings = storage.read_settings();
        if let Some(name) = &settings.autosave {
            if let Err(e) = validate_snapshot_name(name) {
                warn!("Autosave disabled: {e}");
                settings.autosave = None;
            }
        }
        let mut model = C4Model::new();
        if let Some(name) = &settings.autosave {
            match storage.list_snapshots() {
                Ok(names) if names.iter().any(|n| n == name) => match storage.load_snapshot(name) {
                    Ok(loaded) => model = loaded,
                    Err(e) => warn!(name = name.as_str(); "Could not restore autosave: {e}"),
                },
                Ok(_) => debug!(name = name.as_str(); "No autosave snapshot yet"),
                Err(e) => warn!("Could not list snapshots: {e}"),
            }
        }
        Self {
            model,
            current_diagram: None,
            highlighted: Vec::new(),
            settings,
            storage,
        }
    }

    pub fn model(&self) -> &C4Model {
        &self.model
    }

    pub fn current_diagram(&self) -> Option<&str> {
        self.current_diagram.as_deref()
    }

    fn set_current(&mut self, diagram_id: &str) {
        if self.current_diagram.as_deref() != Some(diagram_id) {
            self.highlighted.clear();
        }
        self.current_diagram = Some(diagram_id.to_string());
    }

    fn resolve(&self, diagram_id: Option<String>) -> Result<String, String> {
        diagram_id
            .or_else(|| self.current_diagram.clone())
            .ok_or_else(|| "No diagram_id given and no current diagram. Create or drill into a diagram first.".to_string())
    }

    fn autosave(&self) {
        if let Some(name) = &self.settings.autosave {
            if let Err(e) = self.storage.save_snapshot(name, &self.model) {
                warn!(name = name.as_str(); "Autosave failed: {e}");
            }
        }
    }

    fn snapshot_json(&self, diagram_id: &str) -> ToolResult {
        let snapshot = self
            .model
            .snapshot(diagram_id)
            .ok_or_else(|| format!("Diagram '{diagram_id}' not found"))?;
        serde_json::to_string_pretty(&snapshot).map_err(|e| format!("Serialization error: {e}"))
    }

    // --- Tools ---

    pub fn list_diagrams(&self) -> String {
        if self.model.diagram_count() == 0 {
            return "No diagrams yet. Use create_context_diagram or import_analysis to start.".to_string();
        }
        self.model
            .diagrams()
            .map(|d| {
                let marker = if self.current_diagram.as_deref() == Some(d.id.as_str()) { "* " } else { "  " };
                format!(
                    "{marker}{} | {} | {} | {} element(s) | {} relationship(s)",
                    d.id,
                    d.name,
                    d.level,
                    d.element_ids.len(),
                    d.relationships.len()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn create_context_diagram(&mut self, system_name: &str, description: &str) -> ToolResult {
        if system_name.trim().is_empty() {
            return Err("system_name must not be empty".to_string());
        }
        let id = self.model.create_context_diagram(system_name, description).id.clone();
        self.set_current(&id);
        self.autosave();
        self.snapshot_json(&id)
    }

    pub fn create_container_diagram(&mut self, system_id: &str, containers: &[ElementSpec]) -> ToolResult {
        let id = self
            .model
            .create_container_diagram(system_id, containers)
            .map_err(|e| e.to_string())?
            .id
            .clone();
        self.set_current(&id);
        self.autosave();
        self.snapshot_json(&id)
    }

    pub fn create_component_diagram(&mut self, container_id: &str, components: &[ElementSpec]) -> ToolResult {
        let id = self
            .model
            .create_component_diagram(container_id, components)
            .map_err(|e| e.to_string())?
            .id
            .clone();
        self.set_current(&id);
        self.autosave();
        self.snapshot_json(&id)
    }

    pub fn add_relationship(
        &mut self,
        diagram_id: Option<String>,
        from: &str,
        to: &str,
        description: &str,
        technology: Option<&str>,
    ) -> ToolResult {
        let diagram_id = self.resolve(diagram_id)?;
        if !self.model.add_relationship(&diagram_id, from, to, description, technology) {
            return Err(format!("Diagram '{diagram_id}' not found"));
        }
        self.autosave();
        Ok(format!("Added relationship {from} -> {to} ({description}) to {diagram_id}"))
    }

    pub fn drill_down(&mut self, element_id: &str) -> ToolResult {
        let Some(id) = self.model.drill_down(element_id).map(|d| d.id.clone()) else {
            return Ok("No lower level available for this element".to_string());
        };
        self.set_current(&id);
        self.autosave();
        self.snapshot_json(&id)
    }

    /// Highlight elements in a diagram. An unknown diagram reports `{}`.
    pub fn highlight_elements(&mut self, diagram_id: Option<String>, element_ids: Vec<String>) -> ToolResult {
        let diagram_id = self.resolve(diagram_id)?;
        let result = self.model.highlight_elements(&diagram_id, &element_ids);
        if let Some(found) = &result {
            self.set_current(&diagram_id);
            self.highlighted = found.ids().into_iter().map(String::from).collect();
        }
        serde_json::to_string_pretty(&highlight_to_json(result.as_ref())).map_err(|e| format!("Serialization error: {e}"))
    }

    pub fn get_hierarchy(&self, diagram_id: Option<String>) -> ToolResult {
        let diagram_id = self.resolve(diagram_id)?;
        let summary = self
            .model
            .hierarchy_summary(&diagram_id)
            .ok_or_else(|| format!("Diagram '{diagram_id}' not found"))?;
        serde_json::to_string_pretty(&summary).map_err(|e| format!("Serialization error: {e}"))
    }

    pub fn export_diagram(&self, diagram_id: Option<String>, format: Option<&str>) -> ToolResult {
        let diagram_id = self.resolve(diagram_id)?;
        let format = format.map(ExportFormat::from_name).unwrap_or_default();
        let out = match format {
            // SVG output carries the session's highlights.
            ExportFormat::Svg => self
                .model
                .layout(&diagram_id, &self.highlighted, &self.settings.layout)
                .map(|layout| c4nav_core::layout::render_svg(&layout, &self.settings.layout))
                .unwrap_or_default(),
            _ => self.model.export_diagram(&diagram_id, format, &self.settings.layout),
        };
        if out.is_empty() {
            return Err(format!("Diagram '{diagram_id}' not found"));
        }
        Ok(out)
    }

    pub fn get_layout(&self, diagram_id: Option<String>, highlighted: Option<Vec<String>>) -> ToolResult {
        let diagram_id = self.resolve(diagram_id)?;
        let highlighted = highlighted.unwrap_or_else(|| self.highlighted.clone());
        let layout = self
            .model
            .layout(&diagram_id, &highlighted, &self.settings.layout)
            .ok_or_else(|| format!("Diagram '{diagram_id}' not found"))?;
        serde_json::to_string_pretty(&layout).map_err(|e| format!("Serialization error: {e}"))
    }

    pub fn import_analysis(&mut self, data: &str) -> ToolResult {
        let record = AnalysisRecord::from_json(data).map_err(|e| format!("Invalid analysis record: {e}"))?;
        let summary = self.model.import_analysis(&record).map_err(|e| e.to_string())?;
        self.set_current(&summary.container_diagram_id);
        self.autosave();
        serde_json::to_string_pretty(&summary).map_err(|e| format!("Serialization error: {e}"))
    }

    pub fn current(&self) -> ToolResult {
        let id = self.resolve(None)?;
        self.snapshot_json(&id)
    }

    // --- Snapshots ---

    pub fn list_snapshots(&self) -> ToolResult {
        let names = self.storage.list_snapshots().map_err(|e| e.to_string())?;
        Ok(if names.is_empty() {
            "No snapshots saved.".to_string()
        } else {
            names.join("\n")
        })
    }

    pub fn save_snapshot(&self, name: &str) -> ToolResult {
        self.storage.save_snapshot(name, &self.model).map_err(|e| e.to_string())?;
        Ok(format!(
            "Saved {} element(s) and {} diagram(s) as '{name}'",
            self.model.element_count(),
            self.model.diagram_count()
        ))
    }

    pub fn load_snapshot(&mut self, name: &str) -> ToolResult {
        let model = self
            .storage
            .load_snapshot(name)
            .map_err(|e| format!("Failed to load snapshot '{name}': {e}"))?;
        info!(name; "Replacing model from snapshot");
        self.model = model;
        self.current_diagram = None;
        self.highlighted.clear();
        Ok(format!(
            "Loaded '{name}': {} element(s), {} diagram(s)",
            self.model.element_count(),
            self.model.diagram_count()
        ))
    }

    pub fn delete_snapshot(&self, name: &str) -> ToolResult {
        self.storage.delete_snapshot(name).map_err(|e| e.to_string())?;
        Ok(format!("Deleted snapshot '{name}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (Session, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (Session::open(Storage::new(dir.path())), dir)
    }

    fn json(text: &str) -> serde_json::Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn create_and_drill_track_current_diagram() {
        let (mut s, _dir) = session();
        let context = json(&s.create_context_diagram("Payments", "billing").unwrap());
        let system_id = context["elements"][0]["id"].as_str().unwrap().to_string();
        assert_eq!(s.current_diagram(), context["id"].as_str());

        let containers = json(
            &s.create_container_diagram(&system_id, &[ElementSpec::named("API"), ElementSpec::named("Worker")])
                .unwrap(),
        );
        assert_eq!(containers["elements"].as_array().unwrap().len(), 3);
        assert_eq!(s.current_diagram(), containers["id"].as_str());

        // Move away, then drill back in.
        s.create_context_diagram("Other", "").unwrap();
        let drilled = json(&s.drill_down(&system_id).unwrap());
        assert_eq!(drilled["id"], containers["id"]);
        assert_eq!(s.current_diagram(), containers["id"].as_str());

        let api_id = containers["elements"][1]["id"].as_str().unwrap();
        assert_eq!(s.drill_down(api_id).unwrap(), "No lower level available for this element");
        assert_eq!(s.current_diagram(), containers["id"].as_str());
    }

    #[test]
    fn unknown_anchor_is_error_text() {
        let (mut s, _dir) = session();
        let err = s.create_container_diagram("ghost", &[ElementSpec::named("X")]).unwrap_err();
        assert_eq!(err, "System element ghost not found");
        assert!(s.current_diagram().is_none());
    }

    #[test]
    fn tools_default_to_current_diagram() {
        let (mut s, _dir) = session();
        assert!(s.get_hierarchy(None).is_err());

        let context = json(&s.create_context_diagram("Shop", "").unwrap());
        let system_id = context["elements"][0]["id"].as_str().unwrap().to_string();

        assert!(s.add_relationship(None, &system_id, "ext", "calls", None).is_ok());
        let dot = s.export_diagram(None, Some("dot")).unwrap();
        assert!(dot.contains("[label=\"Shop\\nSystem\"]"));
        let hierarchy = json(&s.get_hierarchy(None).unwrap());
        assert_eq!(hierarchy["elements"][0]["hasChildren"], false);
        assert!(s.add_relationship(Some("missing".into()), "a", "b", "calls", None).is_err());
        assert!(s.export_diagram(Some("missing".into()), None).is_err());
    }

    #[test]
    fn highlight_sentinels() {
        let (mut s, _dir) = session();
        let context = json(&s.create_context_diagram("Shop", "").unwrap());
        let diagram_id = context["id"].as_str().unwrap().to_string();
        let system_id = context["elements"][0]["id"].as_str().unwrap().to_string();

        assert_eq!(json(&s.highlight_elements(Some("missing".into()), vec![system_id.clone()]).unwrap()), serde_json::json!({}));

        let empty = json(&s.highlight_elements(Some(diagram_id.clone()), vec![]).unwrap());
        assert_eq!(empty["highlightedElements"], serde_json::json!([]));

        s.highlight_elements(None, vec![system_id.clone()]).unwrap();
        let layout = json(&s.get_layout(None, None).unwrap());
        assert_eq!(layout["nodes"][0]["color"], "red");
        let layout = json(&s.get_layout(None, Some(vec![])).unwrap());
        assert_eq!(layout["nodes"][0]["color"], "lightblue");
    }

    #[test]
    fn import_sets_current_to_containers() {
        let (mut s, _dir) = session();
        let summary = json(
            &s.import_analysis(r#"{"system": "Shop", "services": [{"name": "Web"}, {"name": "API"}]}"#)
                .unwrap(),
        );
        assert_eq!(s.current_diagram(), summary["containerDiagramId"].as_str());
        assert!(s.import_analysis("not json").is_err());
    }

    #[test]
    fn snapshots_round_trip_through_tools() {
        let (mut s, _dir) = session();
        s.create_context_diagram("Shop", "").unwrap();
        assert_eq!(s.list_snapshots().unwrap(), "No snapshots saved.");
        s.save_snapshot("work").unwrap();
        assert!(s.save_snapshot("../escape").is_err());
        assert!(s.save_snapshot("settings").is_err());

        s.create_context_diagram("Scratch", "").unwrap();
        assert_eq!(s.model().diagram_count(), 2);
        s.load_snapshot("work").unwrap();
        assert_eq!(s.model().diagram_count(), 1);
        assert!(s.current_diagram().is_none());

        s.delete_snapshot("work").unwrap();
        assert!(s.load_snapshot("work").is_err());
    }

    #[test]
    fn autosave_name_cannot_leave_data_dir() {
        let root = tempfile::tempdir().unwrap();
        let storage = Storage::new(root.path().join("data"));
        storage
            .write_settings(&Settings {
                autosave: Some("../escaped".to_string()),
                ..Default::default()
            })
            .unwrap();

        let mut s = Session::open(storage);
        s.create_context_diagram("Shop", "").unwrap();
        assert!(!root.path().join("escaped.json").exists());
        assert_eq!(s.list_snapshots().unwrap(), "No snapshots saved.");
    }

    #[test]
    fn autosave_restores_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        storage
            .write_settings(&Settings {
                autosave: Some("auto".to_string()),
                ..Default::default()
            })
            .unwrap();

        let mut s = Session::open(storage.clone());
        s.create_context_diagram("Shop", "").unwrap();
        drop(s);

        let reopened = Session::open(storage);
        assert_eq!(reopened.model().diagram_count(), 1);
    }

    #[test]
    fn list_marks_current_diagram() {
        let (mut s, _dir) = session();
        assert!(s.list_diagrams().starts_with("No diagrams yet"));
        s.create_context_diagram("Shop", "").unwrap();
        s.create_context_diagram("Ledger", "").unwrap();

        let listing = s.list_diagrams();
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  ") && lines[0].contains("Shop - Context"));
        assert!(lines[1].starts_with("* ") && lines[1].contains("Ledger - Context"));
        assert!(lines[1].ends_with("| context | 1 element(s) | 0 relationship(s)"));
    }
}
