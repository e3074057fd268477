#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::{Compression, write::GzEncoder};
use tempfile::{TempDir, tempdir};

/// Gzip-compresses `text` in memory.
pub fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(text.as_bytes())
        .expect("write gzip payload");
    encoder.finish().expect("finish gzip stream")
}

/// Scratch bucket directory that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all objects owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes raw bytes under the workspace, creating parent folders.
    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent folders");
        }
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(bytes).expect("write temp file contents");
        path
    }

    /// Writes `contents` as a gzip object under the workspace.
    pub fn write_gzip(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, &gzip(contents))
    }

    /// Writes a plain text file under the workspace.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }
}

/// CSV body with the given header and rows produced by `row`.
pub fn csv_body(header: &str, rows: usize, row: impl Fn(usize) -> String) -> String {
    let mut body = String::from(header);
    body.push('\n');
    for i in 0..rows {
        body.push_str(&row(i));
        body.push('\n');
    }
    body
}
