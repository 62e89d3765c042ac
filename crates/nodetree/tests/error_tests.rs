//! Error kinds, context layers and messages

use std::error::Error as _;

use nodetree::*;
use pretty_assertions::assert_eq;

#[test]
fn test_kinds_by_operation() {
    let mut tree = Tree::new();
    assert_eq!(tree.set_value("", "x").unwrap_err().kind(), ErrorKind::Assertion);
    assert_eq!(tree.copy_value("a", "b").unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(tree.read_string("}\n", false).unwrap_err().kind(), ErrorKind::Parse);
    assert_eq!(tree.read_file("/no/such/file.hdf").unwrap_err().kind(), ErrorKind::Io);
    assert_eq!(tree.search_path("/no/such/file.hdf").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_parse_error_display() {
    let mut tree = Tree::new();
    let err = tree.read_string("A = 1\n}\n", false).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parse error: [<string>:2] Unmatched } with no open block"
    );
}

#[test]
fn test_context_layers_chain_through_source() {
    let mut tree = Tree::new();
    let err = tree.read_string("A {\n  B : Missing\n}\n", false).unwrap_err();

    assert_eq!(err.to_string(), "In file <string>:2");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let inner = err.source().unwrap();
    assert_eq!(inner.to_string(), "Not found: Unable to find Missing");
    assert!(matches!(err.root_cause(), TreeError::NotFound(_)));
}

#[test]
fn test_io_error_keeps_system_error() {
    let mut tree = Tree::new();
    let err = tree.read_file("/no/such/file.hdf").unwrap_err();
    match &err {
        TreeError::Io { source, .. } => {
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(err.source().is_some());
}

#[test]
fn test_link_loop_on_write_is_assertion() {
    let mut tree = Tree::new();
    tree.set_symlink("a", "b").unwrap();
    tree.set_symlink("b", "a").unwrap();
    assert_eq!(tree.set_value("a.x", "1").unwrap_err().kind(), ErrorKind::Assertion);
}

#[test]
fn test_manual_construction() {
    let err = TreeError::parse("bad", "f.hdf", 3).in_file("main.hdf", 9);
    assert_eq!(err.trail(), vec![("main.hdf", 9)]);
    assert!(err.is_parse());
    match err.root_cause() {
        TreeError::Parse { location, message } => {
            assert_eq!(location, &SourceLocation::new("f.hdf", 3));
            assert_eq!(message, "bad");
        }
        other => panic!("unexpected {:?}", other),
    }
}
