//! End-to-end tests driving the parser, the comparison and the encoders
//! together over real documents and directory trees.

use std::path::PathBuf;

use xdiff::{compare, Delta, Encoder, Operation, Parser, PlainTextEncoder, Tree};

const ORIGINAL_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ConnectedApp xmlns="http://soap.sforce.com/2006/04/metadata">
	<contactEmail>foo@example.org</contactEmail>
	<label>WooCommerce</label>
	<oauthConfig>
		<callbackUrl>https://login.salesforce.com/services/oauth2/callback</callbackUrl>
		<consumerKey required="true">CLIENTID</consumerKey>
		<scopes>Basic</scopes>
		<scopes>Api</scopes>
		<scopes>Web</scopes>
		<scopes>Full</scopes>
	</oauthConfig>
</ConnectedApp>
"#;

const EDITED_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ConnectedApp xmlns="http://soap.sforce.com/2006/04/metadata">
    <contactEmail>foo@example.org</contactEmail>
    <label>WooCommerce</label>
    <oauthConfig>
        <callbackUrl>https://login.salesforce.com/services/oauth2/callback</callbackUrl>
		<consumerKey>OTHER</consumerKey>
		<!--Comment-->
        <scopes>Full</scopes>
        <scopes>Basic</scopes>
        <configurable>
            <empty></empty>
        </configurable>
    </oauthConfig>
</ConnectedApp>
"#;

fn parse(xml: &str) -> Tree {
    Parser::new().parse_str(xml).unwrap()
}

fn render(left: &Tree, right: &Tree, deltas: &[Delta]) -> String {
    let mut buf = Vec::new();
    PlainTextEncoder::new(&mut buf)
        .encode(left, right, deltas)
        .unwrap();
    String::from_utf8(buf).unwrap()
}

fn op_count(deltas: &[Delta], op: Operation) -> usize {
    deltas.iter().filter(|d| d.operation == op).count()
}

fn testdata(side: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/testdata")
        .join(side)
        .join("data")
}

#[test]
fn identical_documents_report_no_difference() {
    let mut left = parse(ORIGINAL_DOC);
    let mut right = parse(ORIGINAL_DOC);
    let deltas = compare(&mut left, &mut right).unwrap();
    assert!(deltas.is_empty());
    assert_eq!(render(&left, &right, &deltas), "No difference.\n");
}

#[test]
fn edited_document_yields_six_deltas() {
    let mut left = parse(ORIGINAL_DOC);
    let mut right = parse(EDITED_DOC);
    let deltas = compare(&mut left, &mut right).unwrap();

    assert_eq!(deltas.len(), 6, "{}", render(&left, &right, &deltas));
    // The required="true" attribute disappears, CLIENTID becomes OTHER, a
    // comment shows up, two scopes vanish and <configurable> is new.
    assert_eq!(op_count(&deltas, Operation::Delete), 1);
    assert_eq!(op_count(&deltas, Operation::Update), 1);
    assert_eq!(op_count(&deltas, Operation::Insert), 1);
    assert_eq!(op_count(&deltas, Operation::DeleteSubtree), 2);
    assert_eq!(op_count(&deltas, Operation::InsertSubtree), 1);
}

#[test]
fn update_only_touches_the_edited_value() {
    let mut left = parse("<root>value</root>");
    let mut right = parse("<root>edited</root>");
    let deltas = compare(&mut left, &mut right).unwrap();
    assert_eq!(
        render(&left, &right, &deltas),
        "Update('root/Data'->'root/Data')\n"
    );
}

#[test]
fn renamed_root_replaces_the_subtree() {
    let mut left = parse("<root>value</root>");
    let mut right = parse("<replace>edited</replace>");
    let deltas = compare(&mut left, &mut right).unwrap();
    assert_eq!(
        render(&left, &right, &deltas),
        "DeleteSubtree('root/Element')\nInsertSubtree('replace/Element')\n"
    );
}

#[test]
fn reordered_siblings_are_no_difference() {
    let mut left = parse("<r><a/><b/></r>");
    let mut right = parse("<r><b/><a/></r>");
    assert!(compare(&mut left, &mut right).unwrap().is_empty());
}

#[test]
fn keyed_children_pin_their_parents() {
    let mut left = parse(
        "<root>\
           <element id=\"1\"><subelement>v1</subelement></element>\
           <element id=\"2\"><subelement>v2</subelement></element>\
           <element id=\"3\"><subelement>v3</subelement></element>\
         </root>",
    );
    let mut right = parse(
        "<root>\
           <element id=\"1\" name=\"John\"><subelement>v1</subelement></element>\
           <element><subelement>v2</subelement></element>\
           <element id=\"4\"><subelement>v3</subelement></element>\
         </root>",
    );
    let deltas = compare(&mut left, &mut right).unwrap();
    assert_eq!(
        render(&left, &right, &deltas),
        "Insert('root/element/name/Attribute')\n\
         Delete('root/element/id/Attribute')\n\
         Update('root/element/id/Attribute'->'root/element/id/Attribute')\n"
    );
}

#[test]
fn directory_trees_compare_file_by_file() {
    let parser = Parser::new();
    let mut left = parser.parse_dir(testdata("left")).unwrap();
    let mut right = parser.parse_dir(testdata("right")).unwrap();
    let deltas = compare(&mut left, &mut right).unwrap();

    // b.xml and notes.txt agree on both sides; only the value inside a.xml
    // changed.
    assert_eq!(
        render(&left, &right, &deltas),
        "Update('data/a.xml/doc/v/Data'->'data/a.xml/doc/v/Data')\n"
    );
}

#[test]
fn directory_against_itself_is_empty() {
    let parser = Parser::new();
    let mut left = parser.parse_dir(testdata("left")).unwrap();
    let mut right = parser.parse_dir(testdata("left")).unwrap();
    assert!(compare(&mut left, &mut right).unwrap().is_empty());
}
