//! Package diagram scenarios: namespace promotion, dependency synthesis,
//! namespace exclusion, output framing.

mod common;

use common::{database, MockFrontend};
use umlgen::config::Config;
use umlgen::frontend::{
    Declaration, FieldDecl, NamespaceDecl, QualType, RecordDecl, RecordKind, TranslationUnit,
};
use umlgen::generator::{plantuml, Metadata};
use umlgen::model::Access;
use umlgen::pipeline::BuiltDiagram;
use umlgen::GenerationPipeline;

/// Namespace tree:
///
/// ```text
/// app
/// ├── A          (record X: field of AAA type, field of detail::C type,
/// │               field of std::vector)
/// │   └── AAA    (record Y)
/// └── detail     (record C)
/// ```
fn package_unit() -> TranslationUnit {
    let mut y = RecordDecl::new("Y", RecordKind::Struct);
    y.usr = "c:@N@app@N@A@N@AAA@S@Y".to_string();

    let mut x = RecordDecl::new("X", RecordKind::Struct);
    x.usr = "c:@N@app@N@A@S@X".to_string();
    x.fields.push(FieldDecl::new(
        "leaf",
        QualType::record("app::A::AAA::Y"),
        Access::Public,
    ));
    x.fields.push(FieldDecl::new(
        "helper",
        QualType::record("app::detail::C"),
        Access::Public,
    ));
    x.fields.push(FieldDecl::new(
        "names",
        QualType::specialization("std::vector", vec![QualType::record("std::string")]),
        Access::Public,
    ));

    let mut c = RecordDecl::new("C", RecordKind::Struct);
    c.usr = "c:@N@app@N@detail@S@C".to_string();

    let mut tu = TranslationUnit::new("/src/pkg.cc");
    tu.declarations = vec![Declaration::Namespace(NamespaceDecl::new(
        "app",
        vec![
            Declaration::Namespace(NamespaceDecl::new(
                "A",
                vec![
                    Declaration::Record(x),
                    Declaration::Namespace(NamespaceDecl::new("AAA", vec![Declaration::Record(y)])),
                ],
            )),
            Declaration::Namespace(NamespaceDecl::new("detail", vec![Declaration::Record(c)])),
        ],
    ))];
    tu
}

fn build_package_diagram(config_toml: &str) -> (umlgen::diagram::PackageDiagram, Config) {
    let config = Config::from_toml(config_toml).unwrap();
    let name = config.diagrams.keys().next().unwrap().clone();
    let frontend = MockFrontend::new().with_unit(package_unit());
    let pipeline = GenerationPipeline::new(config.clone(), &frontend);
    let (diagram, failures) = pipeline
        .build_diagram(&name, &database(&["/src/pkg.cc"]))
        .unwrap();
    assert!(failures.is_empty());
    match diagram {
        BuiltDiagram::Package(diagram) => (diagram, config),
        _ => panic!("expected a package diagram"),
    }
}

#[test]
fn test_detail_namespace_excluded() {
    let (diagram, config) = build_package_diagram(
        r#"
[diagrams.pkg]
type = "package"
using_namespace = "app"

[diagrams.pkg.include]
namespaces = ["app"]

[diagrams.pkg.exclude]
namespaces = ["app::detail"]
"#,
    );

    assert!(diagram.model.find_by_name("app::A").is_some());
    assert!(diagram.model.find_by_name("app::A::AAA").is_some());
    assert!(diagram.model.find_by_name("app::detail").is_none());
    assert!(diagram.model.find_by_name("std").is_none());

    // A -> AAA survives; edges into excluded or foreign packages vanish.
    let a = diagram.model.find_by_name("app::A").unwrap();
    let aaa = diagram.model.find_by_name("app::A::AAA").unwrap();
    assert!(diagram
        .model
        .relationships()
        .iter()
        .any(|rel| rel.source == a.id && rel.target == aaa.id));
    assert_eq!(
        diagram
            .model
            .relationships()
            .iter()
            .filter(|rel| rel.source == a.id)
            .count(),
        1
    );

    // PlantUML framing.
    let out = plantuml::render_package(
        &diagram,
        &config.diagrams["pkg"],
        &Metadata::disabled(),
    )
    .unwrap();
    assert!(out.starts_with("@startuml"));
    assert!(out.ends_with("@enduml\n"));
    assert!(out.contains("package \"A\""));
    assert!(!out.contains("detail"));
}

#[test]
fn test_dependency_into_admitted_namespace() {
    let (diagram, _) = build_package_diagram(
        r#"
[diagrams.pkg]
type = "package"
[diagrams.pkg.include]
namespaces = ["app"]
"#,
    );

    let a = diagram.model.find_by_name("app::A").unwrap();
    let detail = diagram.model.find_by_name("app::detail").unwrap();
    assert!(diagram
        .model
        .relationships()
        .iter()
        .any(|rel| rel.source == a.id && rel.target == detail.id));
}
