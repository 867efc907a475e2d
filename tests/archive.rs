mod common;

use std::sync::Arc;
use std::thread;

use common::{Fixture, content, display};
use resfind::archive::{Archive, ArchiveCache, ArchiveSource};
use resfind::tarball::{TarArchive, TarCompression};
use resfind::zip::ZipArchive;
use resfind::{PathItemExt, Recursion, Registry, ResourceAccessError};

fn caches(fixture: &Fixture) -> Vec<(&'static str, ArchiveCache)> {
    vec![
        (
            "zip",
            ArchiveCache::new(Box::new(ZipArchive::new(ArchiveSource::Local(fixture.zip.clone())))),
        ),
        (
            "tar",
            ArchiveCache::new(Box::new(TarArchive::new(ArchiveSource::Local(fixture.tar.clone())))),
        ),
        (
            "tar.gz",
            ArchiveCache::new(Box::new(TarArchive::new(ArchiveSource::Local(fixture.tgz.clone())))),
        ),
    ]
}

#[test]
fn listing_is_scanned_once() {
    let fixture = Fixture::new();

    for (label, cache) in caches(&fixture) {
        let first = cache.index().unwrap();
        let second = cache.index().unwrap();
        let names = |index: &resfind::archive::EntryIndex| {
            index.entries().iter().map(|e| e.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&first), names(&second), "{}", label);
        assert_eq!(first.len(), 13, "{}", label);
        assert_eq!(cache.scans(), 1, "{}", label);
    }
}

#[test]
fn concurrent_lookups_share_one_scan() {
    let fixture = Fixture::new();

    for (label, cache) in caches(&fixture) {
        let cache = Arc::new(cache);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    let mut data = Vec::new();
                    std::io::Read::read_to_end(
                        &mut cache.open_entry("b/test2.file").unwrap(),
                        &mut data,
                    )
                    .unwrap();
                    data
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), content("b/test2.file"), "{}", label);
        }
        assert_eq!(cache.scans(), 1, "{}", label);
    }
}

#[test]
fn evicted_index_is_rebuilt() {
    let fixture = Fixture::new();

    for (label, cache) in caches(&fixture) {
        assert!(cache.entry("c/test2.file").unwrap().is_some(), "{}", label);
        cache.evict();
        assert!(cache.entry("c/test2.file").unwrap().is_some(), "{}", label);
        assert_eq!(cache.scans(), 2, "{}", label);
    }
}

#[test]
fn compression_is_detected_from_content() {
    let fixture = Fixture::new();
    let renamed = fixture.temp.path().join("no-suffix");
    std::fs::copy(&fixture.tgz, &renamed).unwrap();

    let archive = TarArchive::new(ArchiveSource::Local(renamed));
    archive.open().unwrap();
    assert_eq!(archive.compression(), Some(TarCompression::Gzip));
}

#[test]
fn items_for_the_same_archive_share_a_cache() {
    let fixture = Fixture::new();
    let registry = Registry::default();

    let plain = registry.resolve(&display(&fixture.zip)).unwrap();
    let url = url::Url::from_file_path(&fixture.zip).unwrap();
    let prefixed = registry.resolve(&format!("jar:{}!/", url)).unwrap();
    assert_eq!(plain.root(), prefixed.root());
    assert_eq!(registry.pool().len(), 1);

    plain
        .find_resources_for_extension("file", Recursion::Recursive)
        .unwrap();
    prefixed
        .find_resources_for_extension("file", Recursion::Recursive)
        .unwrap();

    drop(plain);
    drop(prefixed);
    // The warm set keeps the cache open for the next item.
    assert_eq!(registry.pool().len(), 1);
    registry.pool().clear();
    assert!(registry.pool().is_empty());
}

#[test]
fn corrupt_archives_fail_at_resolution() {
    let fixture = Fixture::new();
    let bogus = fixture.temp.path().join("bogus.zip");
    std::fs::write(&bogus, b"this is not a zip file").unwrap();

    let registry = Registry::default();
    assert!(matches!(
        registry.resolve(&display(&bogus)),
        Err(ResourceAccessError::MalformedArchive { .. })
    ));

    for name in ["bogus.tar", "bogus.tar.gz"] {
        let path = fixture.temp.path().join(name);
        std::fs::write(&path, vec![b'x'; 2048]).unwrap();
        assert!(
            matches!(
                registry.resolve(&display(&path)),
                Err(ResourceAccessError::MalformedArchive { .. })
            ),
            "{}",
            name
        );
    }

    let missing = fixture.temp.path().join("missing.jar");
    assert!(matches!(
        registry.resolve(&display(&missing)),
        Err(ResourceAccessError::Io { .. })
    ));
}

#[test]
fn closed_archive_fails_every_lookup() {
    let fixture = Fixture::new();
    let (_, cache) = caches(&fixture).remove(0);
    cache.index().unwrap();
    cache.close();
    assert!(matches!(cache.index(), Err(ResourceAccessError::Closed(_))));
    assert!(!cache.archive().is_open());
}
