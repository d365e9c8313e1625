//! Unified test utilities for dirmirror tests

use dirmirror_config::ConfigBuilder;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Contents of a tree keyed by relative path; `None` marks a directory
pub type Snapshot = BTreeMap<PathBuf, Option<Vec<u8>>>;

/// A temporary workspace with `source/`, `destination/` and `logs/`
///
/// Only `source/` and `logs/` exist initially; the destination is left for
/// the code under test to create unless [`TreeFixture::with_destination`] is used.
pub struct TreeFixture {
    root: TempDir,
    /// Source root
    pub source: PathBuf,
    /// Destination root
    pub destination: PathBuf,
    /// Audit log path
    pub log_file: PathBuf,
}

impl TreeFixture {
    /// Create an empty source folder with no destination yet
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        let source = root.path().join("source");
        let destination = root.path().join("destination");
        let log_file = root.path().join("logs").join("sync.log");
        fs::create_dir_all(&source).expect("Failed to create source dir");
        Self {
            root,
            source,
            destination,
            log_file,
        }
    }

    /// Create the fixture with an empty destination folder as well
    pub fn with_destination() -> Self {
        let fixture = Self::new();
        fs::create_dir_all(&fixture.destination).expect("Failed to create destination dir");
        fixture
    }

    /// Temporary root holding everything
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Write `content` to `relative` under the source root
    pub fn source_file(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        write_file(&self.source, relative, content)
    }

    /// Write `content` to `relative` under the destination root
    pub fn destination_file(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        write_file(&self.destination, relative, content)
    }

    /// Config builder pointing at this fixture with a short interval
    pub fn builder(&self) -> ConfigBuilder {
        ConfigBuilder::new()
            .source(&self.source)
            .destination(&self.destination)
            .log_file(&self.log_file)
            .interval(Duration::from_millis(20))
    }

    /// Audit log messages with their timestamps stripped
    pub fn log_messages(&self) -> Vec<String> {
        fs::read_to_string(&self.log_file)
            .unwrap_or_default()
            .lines()
            .map(strip_timestamp)
            .collect()
    }
}

impl Default for TreeFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a file, creating its parent folders
pub fn write_file(root: &Path, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Read every entry under `root` into a [`Snapshot`]
pub fn snapshot(root: &Path) -> Snapshot {
    let mut entries = Snapshot::new();
    collect(root, root, &mut entries);
    entries
}

fn collect(root: &Path, dir: &Path, entries: &mut Snapshot) {
    for entry in fs::read_dir(dir).expect("Failed to read dir") {
        let path = entry.expect("Failed to read dir entry").path();
        let relative = path
            .strip_prefix(root)
            .expect("Entry outside root")
            .to_path_buf();
        if path.is_dir() {
            entries.insert(relative, None);
            collect(root, &path, entries);
        } else {
            let content = fs::read(&path).expect("Failed to read file");
            entries.insert(relative, Some(content));
        }
    }
}

/// Assert both trees hold the same paths with the same file contents
pub fn assert_mirrored(source: &Path, destination: &Path) {
    let expected = snapshot(source);
    let actual = snapshot(destination);
    assert_eq!(
        expected.keys().collect::<Vec<_>>(),
        actual.keys().collect::<Vec<_>>(),
        "destination paths differ from source"
    );
    assert_eq!(expected, actual, "destination contents differ from source");
}

/// Drop the `YYYY-MM-DD HH:MM:SS.ffffff: ` prefix of an audit line
pub fn strip_timestamp(line: &str) -> String {
    line.split_once(": ")
        .map(|(_, message)| message.to_string())
        .unwrap_or_else(|| line.to_string())
}
