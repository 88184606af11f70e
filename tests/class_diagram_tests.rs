//! End-to-end class diagram scenarios driven through the pipeline with an
//! in-process front-end.

mod common;

use common::{database, location, MockFrontend};
use umlgen::config::Config;
use umlgen::frontend::{
    Declaration, FieldDecl, MethodDecl, NamespaceDecl, ParamDecl, QualType, RecordDecl,
    RecordKind, TemplateParamDecl, TranslationUnit,
};
use umlgen::model::{Access, ElementPayload, RelationshipKind};
use umlgen::pipeline::BuiltDiagram;
use umlgen::GenerationPipeline;

fn build_class_diagram(
    config_toml: &str,
    frontend: &MockFrontend,
    files: &[&str],
) -> umlgen::diagram::ClassDiagram {
    let config = Config::from_toml(config_toml).unwrap();
    let name = config.diagrams.keys().next().unwrap().clone();
    let pipeline = GenerationPipeline::new(config, frontend);
    let (diagram, failures) = pipeline.build_diagram(&name, &database(files)).unwrap();
    assert!(failures.is_empty());
    match diagram {
        BuiltDiagram::Class(diagram) => diagram,
        _ => panic!("expected a class diagram"),
    }
}

/// `widget` holds `impl::widget` behind an owning pointer named `pImpl`;
/// the implementation calls back through a reference parameter.
fn pimpl_unit() -> TranslationUnit {
    let mut widget = RecordDecl::new("widget", RecordKind::Class);
    widget.usr = "c:@N@app@S@widget".to_string();
    widget.location = Some(location("/src/widget.cc", 5));
    let mut pimpl_field = FieldDecl::new(
        "pImpl",
        QualType::specialization(
            "std::unique_ptr",
            vec![QualType::record("app::impl::widget")],
        ),
        Access::Private,
    );
    pimpl_field.comment = Some("owning handle to the implementation".to_string());
    widget.fields.push(pimpl_field);
    // Returning a reference to self must not create a self-edge.
    let clone_method = MethodDecl::new(
        "self_ref",
        QualType::reference_to(QualType::record("app::widget")),
        Access::Public,
    );
    widget.methods.push(clone_method);

    let mut impl_widget = RecordDecl::new("widget", RecordKind::Class);
    impl_widget.usr = "c:@N@app@N@impl@S@widget".to_string();
    impl_widget.location = Some(location("/src/widget.cc", 42));
    let mut notify = MethodDecl::new("notify", QualType::void(), Access::Public);
    notify.parameters.push(ParamDecl::new(
        "parent",
        QualType::reference_to(QualType::record("app::widget")),
    ));
    impl_widget.methods.push(notify);

    let mut tu = TranslationUnit::new("/src/widget.cc");
    tu.declarations = vec![Declaration::Namespace(NamespaceDecl::new(
        "app",
        vec![
            Declaration::Record(widget),
            Declaration::Namespace(NamespaceDecl::new(
                "impl",
                vec![Declaration::Record(impl_widget)],
            )),
        ],
    ))];
    tu
}

#[test]
fn test_pimpl_scenario() {
    let frontend = MockFrontend::new().with_unit(pimpl_unit());
    let diagram = build_class_diagram(
        r#"
[diagrams.pimpl]
type = "class"
using_namespace = "app"
"#,
        &frontend,
        &["/src/widget.cc"],
    );

    let widget = diagram.model.find_by_name("app::widget").expect("widget");
    let impl_widget = diagram
        .model
        .find_by_name("app::impl::widget")
        .expect("impl::widget");

    // Aggregation through the owning pointer, labelled by the member, with
    // the member's access.
    let aggregation = diagram
        .model
        .relationships()
        .iter()
        .find(|rel| rel.kind == RelationshipKind::Aggregation)
        .expect("aggregation edge");
    assert_eq!(aggregation.source, widget.id);
    assert_eq!(aggregation.target, impl_widget.id);
    assert_eq!(aggregation.label.as_deref(), Some("pImpl"));
    assert_eq!(aggregation.access, Access::Private);

    // The implementation depends back on the interface.
    assert!(diagram.model.relationships().iter().any(|rel| {
        rel.kind == RelationshipKind::Dependency
            && rel.source == impl_widget.id
            && rel.target == widget.id
    }));

    // No self-edges on widget.
    assert!(!diagram
        .model
        .relationships()
        .iter()
        .any(|rel| rel.source == widget.id && rel.target == widget.id));
}

/// `A` contains `A::AA` which contains `A::AA::AAA` and `A::AA::BBB`;
/// template primaries `G<T>` and `H<T,P>` are registered under their
/// parameter lists.
fn nested_unit() -> TranslationUnit {
    let mut aaa = RecordDecl::new("AAA", RecordKind::Struct);
    aaa.usr = "c:@S@A@S@AA@S@AAA".to_string();
    let mut bbb = RecordDecl::new("BBB", RecordKind::Struct);
    bbb.usr = "c:@S@A@S@AA@S@BBB".to_string();

    let mut aa = RecordDecl::new("AA", RecordKind::Struct);
    aa.usr = "c:@S@A@S@AA".to_string();
    aa.nested = vec![Declaration::Record(aaa), Declaration::Record(bbb)];

    let mut a = RecordDecl::new("A", RecordKind::Struct);
    a.usr = "c:@S@A".to_string();
    a.nested = vec![Declaration::Record(aa)];

    let mut g = RecordDecl::new("G", RecordKind::Class);
    g.usr = "c:@ST>1#T@G".to_string();
    g.template_params.push(TemplateParamDecl::type_param("T"));

    let mut h = RecordDecl::new("H", RecordKind::Class);
    h.usr = "c:@ST>2#T#T@H".to_string();
    h.template_params.push(TemplateParamDecl::type_param("T"));
    h.template_params.push(TemplateParamDecl::type_param("P"));

    let mut tu = TranslationUnit::new("/src/nested.cc");
    tu.declarations = vec![
        Declaration::Record(a),
        Declaration::Record(g),
        Declaration::Record(h),
    ];
    tu
}

#[test]
fn test_nested_records_and_template_identity() {
    let frontend = MockFrontend::new().with_unit(nested_unit());
    let diagram = build_class_diagram(
        "[diagrams.nested]\ntype = \"class\"\n",
        &frontend,
        &["/src/nested.cc"],
    );

    for name in ["A", "A::AA", "A::AA::AAA", "A::AA::BBB"] {
        assert!(
            diagram.model.find_by_name(name).is_some(),
            "missing {name}"
        );
    }

    // Template identity includes the parameter list.
    let g = diagram.model.find_by_name("G<T>").expect("G<T>");
    match &g.payload {
        ElementPayload::Class(data) => {
            assert!(data.is_template);
            assert_eq!(data.template_params.len(), 1);
        }
        _ => panic!("G must be a class"),
    }
    assert!(diagram.model.find_by_name("H<T,P>").is_some());

    // Nesting edges point inner -> outer.
    let a = diagram.model.find_by_name("A").unwrap();
    let aa = diagram.model.find_by_name("A::AA").unwrap();
    assert!(diagram.model.relationships().iter().any(|rel| {
        rel.kind == RelationshipKind::Nesting && rel.source == aa.id && rel.target == a.id
    }));
}

#[test]
fn test_unnamed_template_parameter_gets_index_placeholder() {
    // `template <typename, typename T> class Q` leaves the first slot
    // unnamed; the front-end reports it by depth/position only.
    let mut q = RecordDecl::new("Q", RecordKind::Class);
    q.usr = "c:@ST>2#T#T@Q".to_string();
    q.template_params.push(TemplateParamDecl::unnamed_type_param(0, 0));
    q.template_params.push(TemplateParamDecl::type_param("T"));

    let mut tu = TranslationUnit::new("/src/q.cc");
    tu.declarations = vec![Declaration::Record(q)];

    let frontend = MockFrontend::new().with_unit(tu);
    let diagram = build_class_diagram(
        "[diagrams.unnamed]\ntype = \"class\"\n",
        &frontend,
        &["/src/q.cc"],
    );

    // The unnamed slot renders its placeholder instead of an empty label,
    // both in the identity and in the stored parameter list.
    let q = diagram
        .model
        .find_by_name("Q<type-parameter-0-0,T>")
        .expect("placeholder identity");
    match &q.payload {
        ElementPayload::Class(data) => {
            assert_eq!(data.template_params.len(), 2);
            let unnamed = &data.template_params[0];
            assert_eq!(unnamed.name, None);
            assert_eq!(unnamed.index_l, Some(0));
            assert_eq!(unnamed.index_r, Some(0));
            assert_eq!(unnamed.to_string(), "type-parameter-0-0");
        }
        _ => panic!("expected class payload"),
    }
}

#[test]
fn test_specialization_gets_instantiation_edge() {
    let mut primary = RecordDecl::new("Box", RecordKind::Class);
    primary.usr = "c:@ST>1#T@Box".to_string();
    primary
        .template_params
        .push(TemplateParamDecl::type_param("T"));

    let mut specialized = RecordDecl::new("Box", RecordKind::Class);
    specialized.usr = "c:@S@Box>#I".to_string();
    specialized.specialization_of = Some("Box<T>".to_string());
    specialized.template_arguments = vec![QualType::Builtin("int".to_string())];

    let mut tu = TranslationUnit::new("/src/box.cc");
    tu.declarations = vec![Declaration::Record(primary), Declaration::Record(specialized)];

    let frontend = MockFrontend::new().with_unit(tu);
    let diagram = build_class_diagram(
        "[diagrams.boxes]\ntype = \"class\"\n",
        &frontend,
        &["/src/box.cc"],
    );

    let primary = diagram.model.find_by_name("Box<T>").expect("primary");
    let spec = diagram.model.find_by_name("Box<int>").expect("specialization");
    assert!(diagram.model.relationships().iter().any(|rel| {
        rel.kind == RelationshipKind::Instantiation
            && rel.source == spec.id
            && rel.target == primary.id
    }));
}

#[test]
fn test_members_respect_access_filter() {
    let mut record = RecordDecl::new("Vault", RecordKind::Class);
    record.usr = "c:@S@Vault".to_string();
    record
        .fields
        .push(FieldDecl::new("visible", QualType::Builtin("int".into()), Access::Public));
    record.fields.push(FieldDecl::new(
        "hidden",
        QualType::Builtin("int".into()),
        Access::Private,
    ));

    let mut tu = TranslationUnit::new("/src/vault.cc");
    tu.declarations = vec![Declaration::Record(record)];

    let frontend = MockFrontend::new().with_unit(tu);
    let diagram = build_class_diagram(
        r#"
[diagrams.vault]
type = "class"
[diagrams.vault.include]
access = ["public"]
"#,
        &frontend,
        &["/src/vault.cc"],
    );

    let vault = diagram.model.find_by_name("Vault").unwrap();
    match &vault.payload {
        ElementPayload::Class(data) => {
            let names: Vec<&str> = data.members.iter().map(|m| m.name.as_str()).collect();
            assert_eq!(names, ["visible"]);
        }
        _ => panic!("expected class payload"),
    }
}
