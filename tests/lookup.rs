//! The same lookups against the same tree, served by every backend.

mod common;

use std::io::Read;
use std::sync::Arc;

use common::{FILES, Fixture, content, display};
use resfind::{PathItem, PathItemExt, Recursion, Registry, ResourceAccessError};

fn items(fixture: &Fixture) -> (Registry, Vec<(&'static str, Arc<dyn PathItem>)>) {
    let registry = Registry::default();
    let items = fixture
        .roots()
        .into_iter()
        .map(|(label, root)| (label, registry.resolve(&root).unwrap()))
        .collect();
    (registry, items)
}

#[test]
fn every_file_round_trips() {
    let fixture = Fixture::new();
    let (_registry, items) = items(&fixture);

    for (label, item) in &items {
        for (name, _) in FILES {
            let resource = item
                .find_resource(name, Recursion::NonRecursive)
                .unwrap()
                .unwrap_or_else(|| panic!("{}: {} not found", label, name));
            assert_eq!(resource.name(), *name, "{}", label);
            assert_eq!(resource.read_to_vec().unwrap(), content(name), "{}: {}", label, name);
        }
    }
}

#[test]
fn recursive_counts() {
    let fixture = Fixture::new();
    let (_registry, items) = items(&fixture);

    for (label, item) in &items {
        let by_ext = item
            .find_resources_for_extension(".file", Recursion::Recursive)
            .unwrap();
        assert_eq!(by_ext.len(), 7, "{}", label);

        let mut names: Vec<_> = item
            .find_resources("a/test1.file", Recursion::Recursive)
            .unwrap()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a/a/test1.file", "a/test1.file"], "{}", label);

        assert_eq!(
            item.find_resources("test2.file", Recursion::Recursive).unwrap().len(),
            3,
            "{}",
            label
        );
    }
}

#[test]
fn non_recursive_stays_in_the_named_directory() {
    let fixture = Fixture::new();
    let (_registry, items) = items(&fixture);

    for (label, item) in &items {
        let found = item
            .find_resources_for_extension(".file", Recursion::NonRecursive)
            .unwrap();
        assert_eq!(found.len(), 1, "{}", label);
        assert_eq!(found[0].name(), "test1.file", "{}", label);

        let found = item.find_resources("a/test1.file", Recursion::NonRecursive).unwrap();
        assert_eq!(found.len(), 1, "{}", label);
    }
}

#[test]
fn missing_resources_are_not_errors() {
    let fixture = Fixture::new();
    let (_registry, items) = items(&fixture);

    for (label, item) in &items {
        for recursion in [Recursion::NonRecursive, Recursion::Recursive] {
            assert!(item.find_resource("does-not-exist", recursion).unwrap().is_none(), "{}", label);
            assert!(item.find_resource("d/test1.file", recursion).unwrap().is_none(), "{}", label);
            assert!(item.find_resources("foo", recursion).unwrap().is_empty(), "{}", label);
        }
        assert!(item.input_stream("does-not-exist").is_err(), "{}", label);
    }
}

#[test]
fn extension_dot_is_optional() {
    let fixture = Fixture::new();
    let (_registry, items) = items(&fixture);

    for (label, item) in &items {
        for recursion in [Recursion::NonRecursive, Recursion::Recursive] {
            assert_eq!(
                item.find_resources_for_extension("file", recursion).unwrap(),
                item.find_resources_for_extension(".file", recursion).unwrap(),
                "{}",
                label
            );
        }
    }
}

#[test]
fn backslashes_are_separators() {
    let fixture = Fixture::new();
    let (_registry, items) = items(&fixture);

    for (label, item) in &items {
        let forward = item.find_resource("a/test1.file", Recursion::NonRecursive).unwrap();
        let backward = item.find_resource("a\\test1.file", Recursion::NonRecursive).unwrap();
        assert!(forward.is_some(), "{}", label);
        assert_eq!(forward, backward, "{}", label);
    }
}

#[test]
fn empty_names_are_rejected() {
    let fixture = Fixture::new();
    let (_registry, items) = items(&fixture);

    for (_, item) in &items {
        assert!(matches!(
            item.find_resource("", Recursion::Recursive),
            Err(ResourceAccessError::EmptyName)
        ));
        assert!(matches!(
            item.find_resources_for_extension("", Recursion::Recursive),
            Err(ResourceAccessError::EmptyName)
        ));
        assert!(matches!(item.input_stream(""), Err(ResourceAccessError::EmptyName)));
    }
}

#[test]
fn input_stream_bypasses_search() {
    let fixture = Fixture::new();
    let (_registry, items) = items(&fixture);

    for (label, item) in &items {
        let mut data = Vec::new();
        item.input_stream("a\\a\\test2.file")
            .unwrap()
            .read_to_end(&mut data)
            .unwrap();
        assert_eq!(data, content("a/a/test2.file"), "{}", label);
    }
}

#[test]
fn resource_uris_extend_the_root_uri() {
    let fixture = Fixture::new();
    let (_registry, items) = items(&fixture);

    for (label, item) in &items {
        let root = item.uri().unwrap().to_string();
        let resource = item
            .find_resource("a/a/test1.file", Recursion::NonRecursive)
            .unwrap()
            .unwrap();
        let uri = resource.uri().unwrap().to_string();
        assert!(uri.starts_with(&root), "{}: {} vs {}", label, uri, root);
        assert!(uri.ends_with("a/a/test1.file"), "{}: {}", label, uri);
    }

    let roots: Vec<_> = items
        .iter()
        .map(|(_, item)| item.uri().unwrap().scheme().to_string())
        .collect();
    assert_eq!(roots, vec!["file", "jar", "jar", "tar", "tar"]);
}

#[test]
fn names_never_reach_above_the_root() {
    let fixture = Fixture::new();
    let registry = Registry::default();
    let nested = registry.resolve(&display(&fixture.tree.join("a"))).unwrap();

    for recursion in [Recursion::NonRecursive, Recursion::Recursive] {
        assert!(nested.find_resource("../b/test2.file", recursion).unwrap().is_none());
        assert!(nested.find_resources("../test1.file", recursion).unwrap().is_empty());
    }
    assert!(nested.find_resource("a/test2.file", Recursion::NonRecursive).unwrap().is_some());
}

#[cfg(unix)]
#[test]
fn reserved_characters_stay_in_the_resource_uri() {
    let fixture = Fixture::new();
    std::fs::write(fixture.tree.join("d").join("x #1?.file"), b"odd").unwrap();
    let registry = Registry::default();
    let item = registry.resolve(&display(&fixture.tree)).unwrap();

    let resource = item
        .find_resource("d/x #1?.file", Recursion::NonRecursive)
        .unwrap()
        .unwrap();
    let uri = resource.uri().unwrap();
    assert!(uri.as_str().ends_with("/d/x%20%231%3F.file"), "{}", uri);
    assert_eq!(uri.fragment(), None);
    assert_eq!(uri.query(), None);
    assert_eq!(uri.to_file_path().unwrap(), fixture.tree.canonicalize().unwrap().join("d").join("x #1?.file"));
    assert_eq!(resource.read_to_vec().unwrap(), b"odd");
}
