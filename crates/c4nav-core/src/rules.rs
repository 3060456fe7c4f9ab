/// C4 navigation rules. Served to agents as tool guidance and folded into the
/// MCP server instructions.
pub const RULES: &str = "\
1. Four levels, one step at a time. Context shows a system, Container shows what the system \
deploys as, Component shows the parts of one container, Code is the bottom and is never \
generated. Every child sits exactly one level below its parent.\n\
2. Systems come first. `create_context_diagram` is the only way to create a system. Containers \
can only be created inside a system (`create_container_diagram`) and components only inside a \
container (`create_component_diagram`). Passing any other element id fails with a not-found error.\n\
3. Structure edges are implicit. Every new container gets a \"deployed on\" edge to its system and \
every new component a \"part of\" edge to its container. Do not add these by hand.\n\
4. Relationships belong to one diagram. An edge added with `add_relationship` is only visible in \
the diagram it was added to, even if the same two elements appear elsewhere. Add it to the diagram \
the user is looking at.\n\
5. Arrow direction = dependency. `from` is the caller or requester, `to` is the provider \
(e.g. \"Web\" -> \"Orders API\" -> \"Database\").\n\
6. Drill down instead of rebuilding. `drill_down` on an element returns the diagram already built \
for its children, or builds one showing the element and its direct children. Calling it again \
returns the same diagram. An element with no children has nothing to drill into.\n\
7. Children are append-only. Running `create_container_diagram` again on the same system adds more \
containers; existing ones are never removed or reordered.\n\
8. Names describe roles. Name an element after what it is (\"Checkout\", \"Billing Worker\"), put \
frameworks and languages in `technology`.\n\
\n\
## Workflow\n\
1. `list_diagrams` to see what exists. If the user has a saved workspace, `load_snapshot` it.\n\
2. For a repository with analysis output, prefer `import_analysis`: it creates the system, its \
containers, their components and the service-to-service edges in one call.\n\
3. Otherwise build top-down: context, then containers, then components for the containers the \
user cares about.\n\
4. Navigate with `drill_down` and point things out with `highlight_elements`. Both update the \
current diagram, which the export, layout and hierarchy tools use by default.\n\
5. Use `get_hierarchy` to see which elements have children before drilling, and `export_diagram` \
(json, dot or svg) when the user wants something to take away.";

#[cfg(test)]
mod tests {
    use super::RULES;

    #[test]
    fn mentions_every_builder_tool() {
        for tool in [
            "create_context_diagram",
            "create_container_diagram",
            "create_component_diagram",
            "add_relationship",
            "drill_down",
            "highlight_elements",
        ] {
            assert!(RULES.contains(tool), "rules do not mention {tool}");
        }
    }
}
