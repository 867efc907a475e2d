//! Extension descriptors and the catalog of factories they can name.
//!
//! A descriptor is a small properties file whose name ends in
//! [`DESCRIPTOR_SUFFIX`]:
//!
//! ```text
//! # TAR support
//! FactoryName = resfind::tarball::TarPathItemFactory
//! Name = resfind-tar
//! DisplayName = TAR Resource Extension
//! Description = Loads resources from TAR archives.
//! ```
//!
//! `FactoryName` is looked up in an [`ExtensionCatalog`]; the other keys are
//! informational.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::PathItemFactory;
use crate::archive::ArchiveCachePool;
use crate::config::ResourceConfig;
use crate::tarball::TarPathItemFactory;

pub const DESCRIPTOR_SUFFIX: &str = ".extension";

pub const FACTORY_NAME: &str = "FactoryName";
pub const NAME: &str = "Name";
pub const DISPLAY_NAME: &str = "DisplayName";
pub const DESCRIPTION: &str = "Description";

pub const TAR_FACTORY: &str = "resfind::tarball::TarPathItemFactory";
pub const SFTP_FACTORY: &str = "resfind::remote::SftpPathItemFactory";

const TAR_DESCRIPTOR: &str = "\
FactoryName = resfind::tarball::TarPathItemFactory
Name = resfind-tar
DisplayName = TAR Resource Extension
Description = Loads resources from TAR archives, plain or gzip-compressed.
";

#[cfg(feature = "sftp")]
const SFTP_DESCRIPTOR: &str = "\
FactoryName = resfind::remote::SftpPathItemFactory
Name = resfind-sftp
DisplayName = SFTP Resource Extension
Description = Loads resources using the Secure File Transfer Protocol (SFTP).
";

/// One parsed descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDescriptor {
    pub factory_name: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

impl ExtensionDescriptor {
    /// Parse `key = value` / `key: value` lines; `#` and `!` start comments.
    /// Returns `None` when no `FactoryName` is given.
    pub fn parse(text: &str) -> Option<Self> {
        let mut properties: HashMap<&str, &str> = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = match line.find(['=', ':']) {
                Some(idx) => (&line[..idx], &line[idx + 1..]),
                None => (line, ""),
            };
            properties.insert(key.trim(), value.trim());
        }

        let get = |key: &str| {
            properties
                .get(key)
                .filter(|value| !value.is_empty())
                .map(|value| value.to_string())
        };

        Some(Self {
            factory_name: get(FACTORY_NAME)?,
            name: get(NAME),
            display_name: get(DISPLAY_NAME),
            description: get(DESCRIPTION),
        })
    }

    /// Descriptors compiled into the crate.
    pub fn bundled() -> Vec<Self> {
        #[allow(unused_mut)]
        let mut texts = vec![TAR_DESCRIPTOR];
        #[cfg(feature = "sftp")]
        texts.push(SFTP_DESCRIPTOR);
        texts.into_iter().filter_map(Self::parse).collect()
    }
}

/// What an extension factory is built from.
pub struct ExtensionContext<'a> {
    pub config: &'a ResourceConfig,
    pub pool: &'a Arc<ArchiveCachePool>,
}

pub type FactoryConstructor = fn(&ExtensionContext<'_>) -> Arc<dyn PathItemFactory>;

/// Factory names a descriptor may refer to.
#[derive(Clone)]
pub struct ExtensionCatalog {
    constructors: HashMap<String, FactoryConstructor>,
}

impl ExtensionCatalog {
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    pub fn insert(&mut self, factory_name: impl Into<String>, constructor: FactoryConstructor) {
        self.constructors.insert(factory_name.into(), constructor);
    }

    pub fn get(&self, factory_name: &str) -> Option<FactoryConstructor> {
        self.constructors.get(factory_name).copied()
    }

    pub fn contains(&self, factory_name: &str) -> bool {
        self.constructors.contains_key(factory_name)
    }
}

impl Default for ExtensionCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        catalog.insert(TAR_FACTORY, tar_factory);
        #[cfg(feature = "sftp")]
        catalog.insert(SFTP_FACTORY, sftp_factory);
        catalog
    }
}

impl fmt::Debug for ExtensionCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("ExtensionCatalog").field("factories", &names).finish()
    }
}

fn tar_factory(context: &ExtensionContext<'_>) -> Arc<dyn PathItemFactory> {
    Arc::new(TarPathItemFactory::new(
        Arc::clone(context.pool),
        context.config.http.clone(),
    ))
}

#[cfg(feature = "sftp")]
fn sftp_factory(context: &ExtensionContext<'_>) -> Arc<dyn PathItemFactory> {
    use crate::remote::{SftpPathItemFactory, Ssh2Connector};

    Arc::new(SftpPathItemFactory::new(
        Arc::new(Ssh2Connector),
        context.config.sftp.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_properties_syntax() {
        let descriptor = ExtensionDescriptor::parse(
            "# comment\n! also a comment\n\nFactoryName=my::Factory\nName : demo\nDisplayName = Demo Extension\n",
        )
        .unwrap();
        assert_eq!(descriptor.factory_name, "my::Factory");
        assert_eq!(descriptor.name.as_deref(), Some("demo"));
        assert_eq!(descriptor.display_name.as_deref(), Some("Demo Extension"));
        assert_eq!(descriptor.description, None);
    }

    #[test]
    fn factory_name_is_required() {
        assert!(ExtensionDescriptor::parse("Name = x\n").is_none());
        assert!(ExtensionDescriptor::parse("FactoryName =\n").is_none());
    }

    #[test]
    fn bundled_descriptors_name_catalog_entries() {
        let catalog = ExtensionCatalog::default();
        let bundled = ExtensionDescriptor::bundled();
        assert!(!bundled.is_empty());
        for descriptor in bundled {
            assert!(catalog.contains(&descriptor.factory_name), "{:?}", descriptor);
        }
    }
}
