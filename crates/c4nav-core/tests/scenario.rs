use c4nav_core::{C4Level, C4Model, DiagramSnapshot, ElementKind, ElementSpec, ExportFormat, LayoutConfig};
use proptest::prelude::*;

#[test]
fn payments_walkthrough() {
    let mut model = C4Model::new();

    let context = model.create_context_diagram("Payments", "handles billing").clone();
    assert_eq!(context.element_ids.len(), 1);
    assert!(context.relationships.is_empty());
    let system_id = context.element_ids[0].clone();
    let system = model.element(&system_id).unwrap();
    assert_eq!(system.kind, ElementKind::System);
    assert_eq!(system.level, C4Level::Context);
    assert_eq!(system.name, "Payments");

    let containers = model
        .create_container_diagram(&system_id, &[ElementSpec::named("API"), ElementSpec::named("Worker")])
        .unwrap()
        .clone();
    assert_eq!(containers.element_ids.len(), 3);
    assert_eq!(containers.relationships.len(), 2);
    for rel in &containers.relationships {
        assert_eq!(rel.description, "deployed on");
        assert_eq!(rel.to, system_id);
    }

    let reused = model.drill_down(&system_id).unwrap().id.clone();
    assert_eq!(reused, containers.id);

    let api_id = &containers.element_ids[1];
    assert_eq!(model.element(api_id).unwrap().name, "API");
    assert!(model.drill_down(api_id).is_none());
}

#[test]
fn drill_down_is_idempotent() {
    let mut model = C4Model::new();
    let system_id = model.create_context_diagram("Shop", "").element_ids[0].clone();
    model
        .create_container_diagram(&system_id, &[ElementSpec::named("Web")])
        .unwrap();

    let first = model.drill_down(&system_id).unwrap().id.clone();
    let count = model.diagram_count();
    let second = model.drill_down(&system_id).unwrap().id.clone();
    assert_eq!(first, second);
    assert_eq!(model.diagram_count(), count);
}

#[test]
fn json_export_parses_back() {
    let mut model = C4Model::new();
    let system_id = model.create_context_diagram("Shop", "").element_ids[0].clone();
    let diagram_id = model
        .create_container_diagram(&system_id, &[ElementSpec::named("Web"), ElementSpec::named("DB")])
        .unwrap()
        .id
        .clone();
    let raw = model.export_diagram(&diagram_id, ExportFormat::from_name("json"), &LayoutConfig::default());

    let parsed = DiagramSnapshot::from_json(&raw).unwrap();
    let original = model.diagram(&diagram_id).unwrap();
    assert_eq!(parsed.elements.len(), original.element_ids.len());
    assert_eq!(parsed.relationships.len(), original.relationships.len());
    assert_eq!(parsed.level, original.level);
}

#[test]
fn layout_is_repeatable() {
    let mut model = C4Model::new();
    let system_id = model.create_context_diagram("Shop", "").element_ids[0].clone();
    let specs: Vec<_> = ["A", "B", "C"].into_iter().map(ElementSpec::named).collect();
    let diagram_id = model.create_container_diagram(&system_id, &specs).unwrap().id.clone();

    let config = LayoutConfig::default();
    let first = model.layout::<&str>(&diagram_id, &[], &config).unwrap();
    for _ in 0..5 {
        assert_eq!(model.layout::<&str>(&diagram_id, &[], &config).unwrap(), first);
    }
}

#[test]
fn failed_call_leaves_store_usable() {
    let mut model = C4Model::new();
    assert!(model.create_container_diagram("ghost", &[ElementSpec::named("X")]).is_err());
    let system_id = model.create_context_diagram("Shop", "").element_ids[0].clone();
    assert!(model
        .create_container_diagram(&system_id, &[ElementSpec::named("X")])
        .is_ok());
    assert_eq!(model.element(&system_id).unwrap().children.len(), 1);
}

proptest! {
    #[test]
    fn children_grow_by_request_size(batches in prop::collection::vec(prop::collection::vec("[a-z]{1,8}", 0..5), 1..6)) {
        let mut model = C4Model::new();
        let system_id = model.create_context_diagram("Sys", "").element_ids[0].clone();
        let mut expected: Vec<String> = Vec::new();

        for batch in &batches {
            let before = model.element(&system_id).unwrap().children.len();
            let specs: Vec<_> = batch.iter().map(|n| ElementSpec::named(n.as_str())).collect();
            model.create_container_diagram(&system_id, &specs).unwrap();
            let after = model.element(&system_id).unwrap().children.len();
            prop_assert_eq!(after, before + batch.len());
            expected.extend(batch.iter().cloned());
        }

        let names: Vec<String> = model.children_of(&system_id).iter().map(|c| c.name.clone()).collect();
        prop_assert_eq!(names, expected);
        prop_assert!(model.hierarchy_violations().is_empty());
    }
}
