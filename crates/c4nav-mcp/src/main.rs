mod args;
mod session;

use std::sync::{Arc, Mutex, MutexGuard};

use c4nav_core::storage::Storage;
use c4nav_core::ElementSpec;
use clap::Parser;
use log::info;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Deserialize;

use crate::args::Args;
use crate::session::{Session, ToolResult};

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct CreateContextRequest {
    /// Name of the software system to create
    system_name: String,
    /// What the system does
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct CreateContainerRequest {
    /// ID of an existing system element (from create_context_diagram)
    system_id: String,
    /// Containers to add under the system. Each has a name and optional description, technology and properties.
    containers: Vec<ElementSpec>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct CreateComponentRequest {
    /// ID of an existing container element
    container_id: String,
    /// Components to add under the container
    components: Vec<ElementSpec>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddRelationshipRequest {
    /// Diagram to add the edge to. Defaults to the current diagram.
    diagram_id: Option<String>,
    /// ID of the calling element
    from: String,
    /// ID of the called element
    to: String,
    /// What the interaction is, e.g. "reads orders from"
    description: String,
    /// Protocol or technology, e.g. "HTTPS"
    technology: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct DrillDownRequest {
    /// ID of the element to drill into
    element_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct HighlightRequest {
    /// Diagram to highlight in. Defaults to the current diagram.
    diagram_id: Option<String>,
    /// Element IDs to highlight. IDs not in the diagram are ignored.
    element_ids: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct DiagramRequest {
    /// Diagram ID. Defaults to the current diagram.
    diagram_id: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ExportRequest {
    /// Diagram ID. Defaults to the current diagram.
    diagram_id: Option<String>,
    /// "json" (default), "dot" or "svg". Unknown formats export as json.
    format: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct LayoutRequest {
    /// Diagram ID. Defaults to the current diagram.
    diagram_id: Option<String>,
    /// Element IDs to draw highlighted. Defaults to the last highlight in this diagram.
    highlighted: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ImportAnalysisRequest {
    /// The analysis record as a JSON string: {system, description?, services: [{name, description?, technology?, properties?, components?: [...]}], relationships?: [{from, to, description, technology?}]}. Relationships name services, not IDs.
    data: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SnapshotRequest {
    /// Snapshot name (letters, digits, '-' and '_')
    name: String,
}

// --- Server ---

#[derive(Clone)]
pub struct C4NavServer {
    tool_router: ToolRouter<Self>,
    session: Arc<Mutex<Session>>,
}

fn respond(result: ToolResult) -> Result<CallToolResult, McpError> {
    Ok(match result {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(text) => CallToolResult::error(vec![Content::text(text)]),
    })
}

#[tool_router]
impl C4NavServer {
    pub fn new(session: Session) -> Self {
        Self {
            tool_router: Self::tool_router(),
            session: Arc::new(Mutex::new(session)),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        // A panicked tool call leaves the model as it was before the call.
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[tool(description = "List all diagrams: id, name, level, element and relationship counts. The current diagram is marked with *.")]
    fn list_diagrams(&self) -> Result<CallToolResult, McpError> {
        respond(Ok(self.session().list_diagrams()))
    }

    #[tool(
        description = "Create a new software system and its context diagram. Returns the diagram JSON: {id, name, level, elements: [{id, name, type, level, description, technology, properties, children}], relationships, createdAt, updatedAt}. The system's id is elements[0].id. Becomes the current diagram."
    )]
    fn create_context_diagram(
        &self,
        Parameters(req): Parameters<CreateContextRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.session().create_context_diagram(&req.system_name, &req.description))
    }

    #[tool(
        description = "Add containers under a system and create a container diagram showing the system plus the new containers, each linked to the system by a \"deployed on\" edge. Fails if system_id is not a system. Becomes the current diagram."
    )]
    fn create_container_diagram(
        &self,
        Parameters(req): Parameters<CreateContainerRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.session().create_container_diagram(&req.system_id, &req.containers))
    }

    #[tool(
        description = "Add components under a container and create a component diagram showing the container plus the new components, each linked by a \"part of\" edge. Fails if container_id is not a container. Becomes the current diagram."
    )]
    fn create_component_diagram(
        &self,
        Parameters(req): Parameters<CreateComponentRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.session().create_component_diagram(&req.container_id, &req.components))
    }

    #[tool(description = "Add a relationship edge to one diagram. Endpoints are not checked against the diagram's elements.")]
    fn add_relationship(
        &self,
        Parameters(req): Parameters<AddRelationshipRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.session().add_relationship(
            req.diagram_id,
            &req.from,
            &req.to,
            &req.description,
            req.technology.as_deref(),
        ))
    }

    #[tool(
        description = "Open the next level down for an element. Returns the existing diagram for its children if one was built, otherwise builds one with the element and its direct children. Elements without children report that no lower level is available. Becomes the current diagram."
    )]
    fn drill_down(&self, Parameters(req): Parameters<DrillDownRequest>) -> Result<CallToolResult, McpError> {
        respond(self.session().drill_down(&req.element_id))
    }

    #[tool(
        description = "Mark elements of a diagram as highlighted. Returns {diagramId, highlightedElements: [{id, name, type, highlighted}]} with the matching elements in diagram order, or {} if the diagram does not exist. Layout and svg export draw the last highlight."
    )]
    fn highlight_elements(&self, Parameters(req): Parameters<HighlightRequest>) -> Result<CallToolResult, McpError> {
        respond(self.session().highlight_elements(req.diagram_id, req.element_ids))
    }

    #[tool(
        description = "Summarise a diagram: {diagramId, name, level, elements: [{id, name, type, level, hasChildren, children}]}. Use hasChildren to decide where drill_down leads somewhere."
    )]
    fn get_hierarchy(&self, Parameters(req): Parameters<DiagramRequest>) -> Result<CallToolResult, McpError> {
        respond(self.session().get_hierarchy(req.diagram_id))
    }

    #[tool(description = "Export a diagram as json, Graphviz dot, or svg.")]
    fn export_diagram(&self, Parameters(req): Parameters<ExportRequest>) -> Result<CallToolResult, McpError> {
        respond(self.session().export_diagram(req.diagram_id, req.format.as_deref()))
    }

    #[tool(
        description = "Compute the radial layout of a diagram: nodes on a circle with position, color, size and label, plus edges with their endpoints."
    )]
    fn get_layout(&self, Parameters(req): Parameters<LayoutRequest>) -> Result<CallToolResult, McpError> {
        respond(self.session().get_layout(req.diagram_id, req.highlighted))
    }

    #[tool(
        description = "Build a whole hierarchy from a repository analysis: one system, a container per service, a component diagram per service with components, and the service-to-service relationships. Returns the created ids. The container diagram becomes current."
    )]
    fn import_analysis(&self, Parameters(req): Parameters<ImportAnalysisRequest>) -> Result<CallToolResult, McpError> {
        respond(self.session().import_analysis(&req.data))
    }

    #[tool(description = "Get the diagram the conversation is currently looking at, as JSON.")]
    fn get_current_diagram(&self) -> Result<CallToolResult, McpError> {
        respond(self.session().current())
    }

    #[tool(description = "List saved snapshots of the whole model")]
    fn list_snapshots(&self) -> Result<CallToolResult, McpError> {
        respond(self.session().list_snapshots())
    }

    #[tool(description = "Save the whole model (all elements and diagrams) under a name")]
    fn save_snapshot(&self, Parameters(req): Parameters<SnapshotRequest>) -> Result<CallToolResult, McpError> {
        respond(self.session().save_snapshot(&req.name))
    }

    #[tool(description = "Replace the model with a saved snapshot. Clears the current diagram.")]
    fn load_snapshot(&self, Parameters(req): Parameters<SnapshotRequest>) -> Result<CallToolResult, McpError> {
        respond(self.session().load_snapshot(&req.name))
    }

    #[tool(description = "Delete a saved snapshot")]
    fn delete_snapshot(&self, Parameters(req): Parameters<SnapshotRequest>) -> Result<CallToolResult, McpError> {
        respond(self.session().delete_snapshot(&req.name))
    }

    #[tool(description = "Get the C4 navigation rules and recommended workflow")]
    fn get_rules(&self) -> Result<CallToolResult, McpError> {
        respond(Ok(c4nav_core::rules::RULES.to_string()))
    }
}

#[tool_handler]
impl ServerHandler for C4NavServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = format!("{}\n\n## C4 Navigation Rules\n{}", INSTRUCTIONS, c4nav_core::rules::RULES);
        ServerInfo {
            instructions: Some(instructions.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

const INSTRUCTIONS: &str = r#"c4nav keeps a hierarchy of C4 architecture diagrams for one conversation and lets you walk it level by level.

## Levels
- **Context**: one software system.
- **Container**: the system plus the containers it deploys as.
- **Component**: one container plus the components inside it.
- **Code**: the level below components. Never generated.

## Current diagram
Creating, drilling into, highlighting in or importing a diagram makes it current. Tools that take an optional `diagram_id` fall back to the current diagram, so a conversation can say "highlight the API" without repeating ids.

## IDs
Element and diagram IDs are generated. Read them from tool output; never invent them."#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let log_level = args.level_filter();
    // stdout carries the MCP protocol.
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .target(env_logger::Target::Stderr)
        .init();

    let storage = Storage::default();
    info!(log_level:?; "Starting c4nav-mcp with data directory {}", storage.dir().display());

    let service = C4NavServer::new(Session::open(storage))
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| log::error!("MCP server error: {e}"))?;
    service.waiting().await?;
    Ok(())
}
