use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use super::{Archive, ArchiveEntry};
use crate::error::{ResourceAccessError, Result};
use crate::item::{Node, ResourceStream, Tree};
use crate::paths;

/// Name-keyed view of one archive listing.
///
/// Directories that the archive never stored explicitly are synthesized from
/// the entry names, so `a/a/test1.file` alone yields the directories `a` and
/// `a/a`.
#[derive(Debug, Default)]
pub struct EntryIndex {
    entries: Vec<ArchiveEntry>,
    by_name: HashMap<String, usize>,
    children: HashMap<String, Vec<Node>>,
}

impl EntryIndex {
    pub fn build(entries: Vec<ArchiveEntry>) -> Self {
        let mut index = EntryIndex::default();
        let mut dirs: HashSet<String> = HashSet::new();
        dirs.insert(String::new());

        for mut entry in entries {
            entry.name = paths::normalize(&entry.name);
            if entry.name.is_empty() || index.by_name.contains_key(&entry.name) {
                continue;
            }

            index.add_ancestors(&entry.name, &mut dirs);

            if entry.is_dir {
                if dirs.insert(entry.name.clone()) {
                    index
                        .children
                        .entry(paths::parent(&entry.name).to_string())
                        .or_default()
                        .push(Node::dir(entry.name.clone()));
                }
            } else {
                index
                    .children
                    .entry(paths::parent(&entry.name).to_string())
                    .or_default()
                    .push(Node::file(entry.name.clone()));
            }

            index.by_name.insert(entry.name.clone(), index.entries.len());
            index.entries.push(entry);
        }

        index
    }

    fn add_ancestors(&mut self, name: &str, dirs: &mut HashSet<String>) {
        let mut missing = Vec::new();
        let mut dir = paths::parent(name);
        while !dir.is_empty() && !dirs.contains(dir) {
            missing.push(dir.to_string());
            dir = paths::parent(dir);
        }

        for dir in missing.into_iter().rev() {
            self.children
                .entry(paths::parent(&dir).to_string())
                .or_default()
                .push(Node::dir(dir.clone()));
            dirs.insert(dir);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ArchiveEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn children(&self, dir: &str) -> &[Node] {
        self.children.get(dir).map(Vec::as_slice).unwrap_or_default()
    }
}

impl Tree for &EntryIndex {
    fn children(&mut self, dir: &str) -> Result<Vec<Node>> {
        Ok(EntryIndex::children(*self, dir).to_vec())
    }
}

/// Lazily populated entry index over one archive.
///
/// Population runs once under a lock; afterwards lookups load the published
/// index without locking. [`ArchiveCache::evict`] drops the index under memory
/// pressure and the next lookup rebuilds it. Once closed, every lookup fails.
#[derive(Debug)]
pub struct ArchiveCache {
    archive: Box<dyn Archive>,
    index: ArcSwapOption<EntryIndex>,
    populate: Mutex<()>,
    closed: AtomicBool,
    scans: AtomicUsize,
}

impl ArchiveCache {
    pub fn new(archive: Box<dyn Archive>) -> Self {
        Self {
            archive,
            index: ArcSwapOption::empty(),
            populate: Mutex::new(()),
            closed: AtomicBool::new(false),
            scans: AtomicUsize::new(0),
        }
    }

    pub fn archive(&self) -> &dyn Archive {
        self.archive.as_ref()
    }

    pub fn index(&self) -> Result<Arc<EntryIndex>> {
        self.ensure_open()?;
        if let Some(index) = self.index.load_full() {
            return Ok(index);
        }

        let _guard = self.populate.lock();
        self.ensure_open()?;
        if let Some(index) = self.index.load_full() {
            return Ok(index);
        }

        self.archive.open()?;
        let index = Arc::new(EntryIndex::build(self.archive.entries()?));
        self.scans.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            archive = self.archive.path(),
            entries = index.len(),
            "populated archive index"
        );
        self.index.store(Some(Arc::clone(&index)));
        Ok(index)
    }

    pub fn entry(&self, name: &str) -> Result<Option<ArchiveEntry>> {
        Ok(self.index()?.get(name).cloned())
    }

    pub fn open_entry(&self, name: &str) -> Result<ResourceStream> {
        let index = self.index()?;
        match index.get(name) {
            Some(entry) if !entry.is_dir => self.archive.open_entry(entry),
            _ => Err(ResourceAccessError::EntryNotFound {
                root: self.archive.path().to_string(),
                name: name.to_string(),
            }),
        }
    }

    pub fn is_populated(&self) -> bool {
        self.index.load().is_some()
    }

    /// How many times the archive listing has been read.
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    /// Drop the index; the archive stays open and the next lookup rescans it.
    pub fn evict(&self) {
        if self.index.swap(None).is_some() {
            tracing::trace!(archive = self.archive.path(), "evicted archive index");
        }
    }

    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _guard = self.populate.lock();
        self.index.store(None);
        self.archive.close();
        tracing::debug!(archive = self.archive.path(), "closed archive");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ResourceAccessError::Closed(self.archive.path().to_string()));
        }
        Ok(())
    }
}

impl Drop for ArchiveCache {
    fn drop(&mut self) {
        self.close();
    }
}
