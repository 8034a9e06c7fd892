#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use emfx_core::metamodel::{ClassifierKind, FeatureKind, TypeRef, UNBOUNDED};
use emfx_core::{ModelError, Value};
use emfx_xmi::{ParseOptions, Parser};

#[tokio::test]
async fn test_team_document_end_to_end() {
    let parsed = common::parse("/models/team.xmi", common::TEAM_XMI);
    assert!(parsed.warnings.is_empty());

    let contents = parsed.resource.read().await;
    assert_eq!(contents.root_ids().len(), 1);
    assert_eq!(contents.count(), 4);

    let team = contents.root_ids()[0];
    let class = contents
        .metamodel()
        .classifier(&contents.object(&team).unwrap().classifier())
        .unwrap();
    assert_eq!(class.name, "Team");
    assert_eq!(class.ns_prefix.as_deref(), Some("team"));

    let members = contents.e_get(&team, "members").unwrap().object_ids();
    let names: Vec<_> = members
        .iter()
        .map(|m| contents.e_get(m, "name").and_then(Value::as_str).unwrap())
        .collect();
    assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
    assert_eq!(contents.e_get(&team, "lead"), Some(&Value::Object(members[1])));
    assert_eq!(contents.container_of(&members[2]).map(|c| c.0), Some(team));
}

#[tokio::test]
async fn test_attribute_literals_are_typed() {
    let parsed = common::parse("/models/team.xmi", common::TEAM_XMI);
    let contents = parsed.resource.read().await;
    let team = contents.root_ids()[0];

    assert_eq!(contents.e_get(&team, "budget"), Some(&Value::I64(1_250_000)));
    assert_eq!(contents.e_get(&team, "ratio"), Some(&Value::F64(0.75)));
    assert_eq!(contents.e_get(&team, "active"), Some(&Value::Bool(true)));
    assert_eq!(contents.e_get(&team, "code"), Some(&Value::I64(7)));
    assert_eq!(
        contents.e_get(&team, "tags"),
        Some(&Value::Many(vec![Value::from("backend"), Value::from("oncall")]))
    );
}

#[tokio::test]
async fn test_fragments_address_members_and_classifiers() {
    let team = common::parse("/models/team.xmi", common::TEAM_XMI).resource;
    let first = team.resolve_fragment("//@members.0").await.unwrap();
    assert_eq!(team.e_get(&first, "name").await, Some(Value::from("Alice")));
    assert_eq!(team.fragment_of(&first).await.as_deref(), Some("//@members.0"));

    let people = common::parse("/models/people.ecore", common::PEOPLE_ECORE).resource;
    let person = people.resolve_fragment("//Person").await.unwrap();
    let contents = people.read().await;
    assert_eq!(contents.metamodel().classifier(&person).unwrap().name, "Person");
}

#[tokio::test]
async fn test_metamodel_descriptors() {
    let parsed = common::parse("/models/people.ecore", common::PEOPLE_ECORE);
    assert!(parsed.warnings.is_empty());
    let contents = parsed.resource.read().await;
    let metamodel = contents.metamodel();

    let root = metamodel.packages().next().unwrap();
    assert_eq!(root.name, "people");
    assert_eq!(root.ns_uri, "http://example.org/people");
    assert_eq!(root.classifiers.len(), 3);
    assert_eq!(root.subpackages.len(), 1);

    let person = metamodel.classifier_named("Person").unwrap();
    assert!(person.class_data().unwrap().is_abstract);
    assert_eq!(person.ns_prefix.as_deref(), Some("people"));

    let friends = &person.features()[1];
    assert!(friends.is_many());
    assert_eq!(friends.bounds(), (0, UNBOUNDED));
    assert_eq!(friends.ty(), Some(&TypeRef::Resolved(person.id)));
    assert!(matches!(
        &friends.kind,
        FeatureKind::Reference { opposite: Some(id), containment: false, .. } if *id == friends.id
    ));

    let employee = metamodel.classifier_named("Employee").unwrap();
    assert_eq!(metamodel.supertypes(&employee.id), vec![person.id]);
    assert_eq!(metamodel.all_features(&employee.id).len(), 3);

    let level = metamodel.classifier_named("Level").unwrap();
    assert_eq!(
        employee.features()[0].ty(),
        Some(&TypeRef::Resolved(level.id))
    );
    let ClassifierKind::Enum { literals } = &level.kind else {
        panic!("Level should be an enum");
    };
    assert_eq!(literals[0].value, 0);
    assert_eq!(literals[1].value, 10);
    assert_eq!(literals[1].literal, "senior");

    let department = metamodel.classifier_named("Department").unwrap().id;
    assert_eq!(department_path(&*contents), Some(department));
}

fn department_path(contents: &emfx_core::ResourceContents) -> Option<emfx_core::Identifier> {
    emfx_core::fragment::resolve_fragment(contents, None, "//hr/Department")
}

#[test]
fn test_missing_ns_uri_yields_no_resource() {
    let text = r##"<ecore:EPackage xmi:version="2.0" xmlns:ecore="http://www.eclipse.org/emf/2002/Ecore" name="broken" nsPrefix="b"/>"##;
    let err = Parser::default().parse_str("/models/broken.ecore", text).unwrap_err();
    assert_eq!(
        err,
        ModelError::MissingRequiredAttribute {
            name: "nsURI".to_string()
        }
    );
}

#[tokio::test]
async fn test_forward_and_backward_links_resolve_alike() {
    let forward = r##"<Board xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI">
  <chair href="#//@seats.1"/>
  <seats name="a"/>
  <seats name="b"/>
</Board>"##;
    let backward = r##"<Board xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI">
  <seats name="a"/>
  <seats name="b"/>
  <chair href="#//@seats.1"/>
</Board>"##;

    for text in [forward, backward] {
        let resource = common::parse("/models/board.xmi", text).resource;
        let contents = resource.read().await;
        let board = contents.root_ids()[0];
        let seats = contents.e_get(&board, "seats").unwrap().object_ids();
        assert_eq!(contents.e_get(&board, "chair"), Some(&Value::Object(seats[1])));
    }
}

#[test]
fn test_link_on_contained_feature_name_is_rejected() {
    let text = r##"<Org xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI">
  <teams name="T2"><lead href="#//@teams.1/@lead"/></teams>
  <teams name="T1"><lead name="Alice"/></teams>
</Org>"##;
    let err = Parser::default().parse_str("/models/org.xmi", text).unwrap_err();
    assert!(matches!(
        err,
        ModelError::FeatureShapeConflict { ref class, ref feature } if class == "teams" && feature == "lead"
    ));
}

#[tokio::test]
async fn test_links_between_siblings_keep_their_owner() {
    let text = r##"<Org xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI">
  <teams name="T2"><backup href="#//@teams.1/@lead"/></teams>
  <teams name="T1"><lead name="Alice"/></teams>
</Org>"##;
    let resource = common::parse("/models/org.xmi", text).resource;
    let contents = resource.read().await;
    let org = contents.root_ids()[0];
    let teams = contents.e_get(&org, "teams").unwrap().object_ids();
    let alice = contents.e_get(&teams[1], "lead").unwrap().object_ids()[0];

    assert_eq!(contents.e_get(&teams[0], "backup"), Some(&Value::Object(alice)));
    let (owner, feature, _) = contents.container_of(&alice).unwrap();
    assert_eq!((owner, feature.as_str()), (teams[1], "lead"));
    assert_eq!(contents.fragment_of(&alice).as_deref(), Some("//@teams.1/@lead"));
}

#[tokio::test]
async fn test_identity_markers_resolve() {
    let text = r##"<Board xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI">
  <seats xmi:id="s1" name="a"/>
  <chair href="#s1"/>
</Board>"##;
    let resource = common::parse("/models/board.xmi", text).resource;
    let contents = resource.read().await;
    let seat = contents.object_by_marker("s1").unwrap();
    let board = contents.root_ids()[0];
    assert_eq!(contents.e_get(&board, "chair"), Some(&Value::Object(seat)));
}

#[tokio::test]
async fn test_cross_document_link_becomes_relative_proxy() {
    let parsed = common::parse("/dir/base.xmi", common::BASE_XMI);
    let contents = parsed.resource.read().await;
    let project = contents.root_ids()[0];

    let Some(Value::Proxy(owner)) = contents.e_get(&project, "owner") else {
        panic!("owner should be a proxy");
    };
    assert_eq!(owner.locator(), "/dir/other.xmi");
    assert_eq!(owner.fragment(), "//@items.1");
    assert!(!owner.is_resolved());
}

#[tokio::test]
async fn test_dangling_links_warn_in_lenient_mode() {
    let text = r##"<Board xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI">
  <seats name="a"/>
  <chair href="#//@seats.4"/>
  <chair href="#//@seats.0"/>
</Board>"##;
    let parsed = common::parse("/models/board.xmi", text);
    assert_eq!(parsed.warnings.len(), 1);
    assert_eq!(parsed.warnings[0].feature, "chair");
    assert_eq!(parsed.warnings[0].link, "#//@seats.4");

    let contents = parsed.resource.read().await;
    let board = contents.root_ids()[0];
    let seat = contents.e_get(&board, "seats").unwrap().object_ids()[0];
    assert_eq!(contents.e_get(&board, "chair"), Some(&Value::Object(seat)));
}

#[test]
fn test_dangling_links_fail_in_strict_mode() {
    let text = r##"<Board xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI"><chair href="#nobody"/></Board>"##;
    let parser = Parser::new(ParseOptions {
        strict_references: true,
        ..ParseOptions::default()
    });
    let err = parser.parse_str("/models/board.xmi", text).unwrap_err();
    assert_eq!(
        err,
        ModelError::InvalidReference {
            reference: "#nobody".to_string()
        }
    );
}

#[test]
fn test_malformed_link_is_invalid_reference() {
    let text = r##"<Board xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI"><chair href="a#b#c"/></Board>"##;
    let err = Parser::default().parse_str("/models/board.xmi", text).unwrap_err();
    assert!(matches!(err, ModelError::InvalidReference { .. }));
}

#[test]
fn test_version_checks() {
    let text = r##"<Board xmi:version="9.9" xmlns:xmi="http://www.omg.org/XMI"/>"##;
    let err = Parser::default().parse_str("/models/v.xmi", text).unwrap_err();
    assert_eq!(
        err,
        ModelError::UnsupportedVersion {
            marker: "9.9".to_string()
        }
    );

    let strict = Parser::new(ParseOptions {
        require_version: true,
        ..ParseOptions::default()
    });
    let err = strict.parse_str("/models/v.xmi", "<Board/>").unwrap_err();
    assert_eq!(
        err,
        ModelError::MissingRequiredAttribute {
            name: "xmi:version".to_string()
        }
    );
    assert!(Parser::default().parse_str("/models/v.xmi", "<Board/>").is_ok());
}

#[test]
fn test_unknown_elements() {
    let unknown_kind = r##"<ecore:EPackage xmlns:ecore="http://www.eclipse.org/emf/2002/Ecore"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" name="p" nsURI="urn:p" nsPrefix="p">
  <eClassifiers xsi:type="ecore:EWidget" name="W"/>
</ecore:EPackage>"##;
    let err = Parser::default().parse_str("/models/p.ecore", unknown_kind).unwrap_err();
    assert_eq!(
        err,
        ModelError::UnknownElement {
            tag: "ecore:EWidget".to_string()
        }
    );

    let empty_type = r##"<Board xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><seats xsi:type=""/></Board>"##;
    let err = Parser::default().parse_str("/models/b.xmi", empty_type).unwrap_err();
    assert!(matches!(err, ModelError::UnknownElement { .. }));
}

#[test]
fn test_feature_outside_class_is_invalid() {
    let text = r##"<ecore:EPackage xmlns:ecore="http://www.eclipse.org/emf/2002/Ecore"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" name="p" nsURI="urn:p" nsPrefix="p">
  <eStructuralFeatures xsi:type="ecore:EAttribute" name="stray"/>
</ecore:EPackage>"##;
    let err = Parser::default().parse_str("/models/p.ecore", text).unwrap_err();
    assert!(matches!(err, ModelError::InvalidDocument { .. }));
}

#[tokio::test]
async fn test_xmi_wrapper_holds_several_roots() {
    let text = r##"<xmi:XMI xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI">
  <Note text="one"/>
  <Note text="two"/>
  <Board><pinned href="#/1"/></Board>
</xmi:XMI>"##;
    let resource = common::parse("/models/notes.xmi", text).resource;
    let contents = resource.read().await;
    assert_eq!(contents.root_ids().len(), 3);

    let second = contents.root_ids()[1];
    assert_eq!(contents.e_get(&second, "text"), Some(&Value::from("two")));
    assert_eq!(contents.fragment_of(&second).as_deref(), Some("/1"));
    let board = contents.root_ids()[2];
    assert_eq!(contents.e_get(&board, "pinned"), Some(&Value::Object(second)));
}

#[test]
fn test_document_level_failures() {
    let parser = Parser::default();
    assert!(matches!(
        parser.parse_bytes("/models/x.xmi", b"   "),
        Err(ModelError::InvalidDocument { .. })
    ));
    assert!(matches!(
        parser.parse_bytes("/models/x.xmi", b"<Board name=\"\xff\"/>"),
        Err(ModelError::InvalidEncoding { .. })
    ));
    assert!(matches!(
        parser.parse_bytes("/models/x.xmi", b"<A/><B/>"),
        Err(ModelError::InvalidDocument { .. })
    ));
}

#[tokio::test]
async fn test_wrapped_packages_keep_classifier_fragments_apart() {
    let text = r##"<xmi:XMI xmi:version="2.0" xmlns:xmi="http://www.omg.org/XMI"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:ecore="http://www.eclipse.org/emf/2002/Ecore">
  <ecore:EPackage name="a" nsURI="http://example.org/a" nsPrefix="a">
    <eClassifiers xsi:type="ecore:EClass" name="Item"/>
    <eClassifiers xsi:type="ecore:EClass" name="Crate" eSuperTypes="#//Item"/>
  </ecore:EPackage>
  <ecore:EPackage name="b" nsURI="http://example.org/b" nsPrefix="b">
    <eClassifiers xsi:type="ecore:EClass" name="Item"/>
    <eClassifiers xsi:type="ecore:EClass" name="Box" eSuperTypes="#/1/Item"/>
  </ecore:EPackage>
</xmi:XMI>"##;
    let parsed = common::parse("/models/two.ecore", text);
    assert!(parsed.warnings.is_empty());

    let contents = parsed.resource.read().await;
    let metamodel = contents.metamodel();
    let item_of = |package: &str| {
        let package = metamodel.packages().find(|p| p.name == package).unwrap();
        package
            .classifiers
            .iter()
            .copied()
            .find(|id| metamodel.classifier(id).unwrap().name == "Item")
            .unwrap()
    };
    let (item_a, item_b) = (item_of("a"), item_of("b"));
    assert_ne!(item_a, item_b);

    let supertype_of = |name: &str| {
        let package = if name == "Crate" { "a" } else { "b" };
        let package = metamodel.packages().find(|p| p.name == package).unwrap();
        let id = package
            .classifiers
            .iter()
            .copied()
            .find(|id| metamodel.classifier(id).unwrap().name == name)
            .unwrap();
        metamodel.supertypes(&id)
    };
    assert_eq!(supertype_of("Crate"), vec![item_a]);
    assert_eq!(supertype_of("Box"), vec![item_b]);
    drop(contents);

    assert_eq!(parsed.resource.resolve_fragment("/1/Item").await, Some(item_b));
}
