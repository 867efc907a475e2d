#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Files of the fixture tree with their contents.
pub const FILES: &[(&str, &str)] = &[
    ("test1.file", "test1 at the root"),
    ("a/test1.file", "test1 in a"),
    ("aa/test1.file", "test1 in aa"),
    ("a/a/test1.file", "test1 in a/a"),
    ("a/a/test2.file", "test2 in a/a"),
    ("b/test2.file", "test2 in b"),
    ("c/test2.file", "test2 in c"),
];

/// Directories of the fixture tree; `d` stays empty.
pub const DIRS: &[&str] = &["a", "a/a", "aa", "b", "c", "d"];

/// The fixture tree on disk and packed into every archive format.
pub struct Fixture {
    pub temp: TempDir,
    pub tree: PathBuf,
    pub zip: PathBuf,
    pub jar: PathBuf,
    pub tar: PathBuf,
    pub tgz: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let tree = temp.path().join("tree");
        write_tree(&tree);

        let zip = temp.path().join("fixture.zip");
        write_zip(&zip);
        let jar = temp.path().join("fixture.jar");
        fs::copy(&zip, &jar).unwrap();

        let tar = temp.path().join("fixture.tar");
        write_tar(File::create(&tar).unwrap(), &tree);

        let tgz = temp.path().join("fixture.tar.gz");
        let encoder = GzEncoder::new(File::create(&tgz).unwrap(), Compression::default());
        write_tar(encoder, &tree).finish().unwrap();

        Self {
            temp,
            tree,
            zip,
            jar,
            tar,
            tgz,
        }
    }

    /// Every root as a path string, labelled for assertion messages.
    pub fn roots(&self) -> Vec<(&'static str, String)> {
        vec![
            ("directory", display(&self.tree)),
            ("zip", display(&self.zip)),
            ("jar", display(&self.jar)),
            ("tar", display(&self.tar)),
            ("tar.gz", display(&self.tgz)),
        ]
    }
}

pub fn display(path: &Path) -> String {
    path.display().to_string()
}

pub fn content(name: &str) -> &'static [u8] {
    FILES
        .iter()
        .find(|(file, _)| *file == name)
        .map(|(_, data)| data.as_bytes())
        .unwrap()
}

fn write_tree(root: &Path) {
    for dir in DIRS {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    for (name, data) in FILES {
        fs::write(root.join(name), data).unwrap();
    }
}

/// Alternates STORED and DEFLATE entries so both read paths are exercised.
fn write_zip(path: &Path) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for dir in DIRS {
        writer.add_directory(format!("{}/", dir), stored).unwrap();
    }
    for (i, (name, data)) in FILES.iter().enumerate() {
        let options = if i % 2 == 0 { stored } else { deflated };
        writer.start_file(*name, options).unwrap();
        writer.write_all(data.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

fn write_tar<W: Write>(out: W, tree: &Path) -> W {
    let mut builder = tar::Builder::new(out);
    for dir in DIRS {
        builder.append_dir(dir, tree.join(dir)).unwrap();
    }
    for (name, _) in FILES {
        builder.append_path_with_name(tree.join(name), name).unwrap();
    }
    builder.into_inner().unwrap()
}
