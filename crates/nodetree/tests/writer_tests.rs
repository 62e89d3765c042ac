//! Serialization: dump order, text round trips and file output

use std::fs;

use nodetree::*;
use pretty_assertions::assert_eq;

fn values(tree: &Tree) -> Vec<(String, String)> {
    tree.root_node()
        .walk("")
        .filter_map(|(path, node)| node.value().map(|v| (path, v.to_string())))
        .collect()
}

fn reread(text: &str) -> Tree {
    let mut tree = Tree::new();
    tree.read_string(text, false).unwrap();
    tree
}

#[test]
fn test_dump_order_children_before_siblings() {
    let tree = reread("A = 1\nA {\n  B = 2\n  C {\n    D = 3\n  }\n}\nE = 4\n");
    assert_eq!(
        tree.dump_string(""),
        "A = 1\nA.B = 2\nA.C.D = 3\nE = 4\n"
    );
}

#[test]
fn test_dump_with_prefix() {
    let tree = reread("A.B = 1\n");
    assert_eq!(tree.dump_string("Root"), "Root.A.B = 1\n");
}

#[test]
fn test_dump_of_inner_node_includes_its_name() {
    let tree = reread("A.B = 1\nA.C = 2\nZ = 3\n");
    let a = tree.get_obj("A").unwrap();
    assert_eq!(a.dump_string(""), "A.B = 1\nA.C = 2\n");
}

#[test]
fn test_round_trip_assignments() {
    let mut tree = Tree::new();
    tree.set_value("zeta", "last-first").unwrap();
    tree.set_value("a.b.c", "x").unwrap();
    tree.set_value("a", "on a container").unwrap();
    tree.set_value("a.b.d", "with = equals").unwrap();
    tree.set_value("m", "").unwrap();

    let text = tree.write_string();
    let back = reread(&text);
    assert_eq!(values(&back), values(&tree));
    assert_eq!(back.write_string(), text);
}

#[test]
fn test_round_trip_heredoc_links_and_attrs() {
    let mut tree = Tree::new();
    tree.set_value("Body", "line1\nEOM\nline3").unwrap();
    tree.set_value("Real.x", "1").unwrap();
    tree.set_symlink("Alias", "Real").unwrap();
    tree.set_attr("Alias", "kind", Some("ref")).unwrap();
    tree.set_attr("Meta", "note", Some("say \"hi\"\\now\nnext")).unwrap();
    tree.set_value("Tagged", "v").unwrap();
    tree.set_attr("Tagged", "lang", Some("en")).unwrap();

    let text = tree.write_string();
    let back = reread(&text);

    assert_eq!(back.get_value("Body", "?"), "line1\nEOM\nline3\n");
    assert_eq!(back.get_value("Alias.x", "?"), "1");
    let alias = back.root_node().children().find(|c| c.name() == "Alias").unwrap();
    assert_eq!(alias.link(), Some("Real"));
    assert_eq!(alias.attr("kind"), Some("ref"));
    assert_eq!(
        back.get_obj("Meta").unwrap().attr("note"),
        Some("say \"hi\"\\now\nnext")
    );
    assert_eq!(back.get_obj("Tagged").unwrap().attr("lang"), Some("en"));
    assert_eq!(back.write_string(), text);
}

#[test]
fn test_heredoc_terminator_chosen_around_body() {
    let mut tree = Tree::new();
    tree.set_value("X", "EOM\nbody\n").unwrap();
    assert_eq!(tree.write_string(), "X << EOM1\nEOM\nbody\nEOM1\n");
}

#[test]
fn test_write_string_of_inner_node_is_relative() {
    let tree = reread("Page {\n  Title = T\n  Meta.Lang = en\n}\n");
    let page = tree.get_obj("Page").unwrap();
    assert_eq!(page.write_string(), "Title = T\nMeta.Lang = en\n");
}

#[test]
fn test_write_file_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.hdf");
    let tree = reread("A.B = 1\nC = 2\n");

    tree.write_file(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "A.B = 1\nC = 2\n");

    let mut back = Tree::new();
    back.read_file(&path).unwrap();
    assert_eq!(values(&back), values(&tree));
}

#[test]
fn test_write_file_atomic_replaces_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf.hdf");
    fs::write(&path, "Old = 1\n").unwrap();

    let tree = reread("New = 2\n");
    tree.write_file_atomic(&path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "New = 2\n");
    let entries: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["conf.hdf".to_string()]);
}

#[test]
fn test_write_file_atomic_into_missing_dir_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("conf.hdf");
    let tree = reread("A = 1\n");

    let err = tree.write_file_atomic(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!path.exists());
}

#[test]
fn test_link_over_existing_children_round_trips() {
    let mut tree = Tree::new();
    tree.set_value("real.y", "2").unwrap();
    tree.set_value("alias.x", "1").unwrap();
    tree.set_symlink("alias", "real").unwrap();

    assert_eq!(tree.get_value("alias.x", "gone"), "gone");
    let text = tree.write_string();
    assert_eq!(text, "real.y = 2\nalias := real\n");
    assert_eq!(reread(&text).write_string(), text);
}

#[test]
fn test_unwritable_name_is_rejected_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf.hdf");
    let mut tree = Tree::new();
    tree.set_value("ok", "1").unwrap();
    tree.set_value("my key", "v").unwrap();

    assert_eq!(tree.write_file(&path).unwrap_err().kind(), ErrorKind::Assertion);
    assert_eq!(tree.write_file_atomic(&path).unwrap_err().kind(), ErrorKind::Assertion);
    assert!(!path.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
