//! Blob storage seam used by the sampler.
//!
//! The sampler only needs to list object names under a prefix and open one
//! object as a byte stream. [`LocalBlobStore`] serves a directory tree (for
//! example a mounted or staged bucket); [`MemoryBlobStore`] keeps objects in
//! memory for tests and embedding.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufReader, Cursor, Read},
    path::{Path, PathBuf},
};

use log::debug;

/// Byte-stream access to objects addressed by `/`-separated names.
pub trait BlobStore {
    /// Object names starting with `prefix`, in listing order.
    fn list(&self, prefix: &str) -> io::Result<Vec<String>>;

    /// Opens the raw (still compressed) bytes of `name` for streaming.
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>>;
}

impl<T: BlobStore + ?Sized> BlobStore for &T {
    fn list(&self, prefix: &str) -> io::Result<Vec<String>> {
        (**self).list(prefix)
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        (**self).open(name)
    }
}

/// Directory-backed store; object names are paths relative to `root`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        name.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Deepest directory fully named by `prefix`; only it can hold matches.
    fn walk_start(&self, prefix: &str) -> PathBuf {
        match prefix.rsplit_once('/') {
            Some((dir, _)) => self.resolve(dir),
            None => self.root.clone(),
        }
    }

    fn collect(&self, dir: &Path, names: &mut Vec<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                self.collect(&path, names)?;
            } else if let Ok(relative) = path.strip_prefix(&self.root) {
                let name = relative
                    .components()
                    .map(|part| part.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                names.push(name);
            }
        }
        Ok(())
    }
}

impl BlobStore for LocalBlobStore {
    fn list(&self, prefix: &str) -> io::Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("storage root {:?} is not a directory", self.root),
            ));
        }
        let start = self.walk_start(prefix);
        let mut names = Vec::new();
        if start.is_dir() {
            self.collect(&start, &mut names)?;
        }
        names.retain(|name| name.starts_with(prefix));
        names.sort();
        debug!(
            "Listed {} object(s) under '{prefix}' in {:?}",
            names.len(),
            self.root
        );
        Ok(names)
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        let file = File::open(self.resolve(name))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// In-memory store listing objects in name order.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    objects: BTreeMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.objects.insert(name.into(), bytes.into());
    }

    pub fn with_object(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl BlobStore for MemoryBlobStore {
    fn list(&self, prefix: &str) -> io::Result<Vec<String>> {
        Ok(self
            .objects
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        let bytes = self.objects.get(name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("object {name} not found"))
        })?;
        Ok(Box::new(Cursor::new(bytes.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn local_store_lists_relative_names_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("claims/report_date=2023-06-30")).unwrap();
        fs::write(dir.path().join("claims/report_date=2023-06-30/b.csv.gz"), b"x").unwrap();
        fs::write(dir.path().join("claims/a.csv.gz"), b"y").unwrap();
        fs::write(dir.path().join("other.csv.gz"), b"z").unwrap();

        let store = LocalBlobStore::new(dir.path());
        let names = store.list("claims").unwrap();
        assert_eq!(
            names,
            vec!["claims/a.csv.gz", "claims/report_date=2023-06-30/b.csv.gz"]
        );

        let mut contents = String::new();
        store
            .open("claims/a.csv.gz")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "y");
    }

    #[test]
    fn local_store_walks_only_the_directory_named_by_the_prefix() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("caravan/claim_raw_v1-1/report_date=2023-06-30"))
            .unwrap();
        fs::create_dir_all(dir.path().join("caravan/asset_raw")).unwrap();
        fs::create_dir_all(dir.path().join("youtube")).unwrap();
        fs::write(
            dir.path().join("caravan/claim_raw_v1-1/report_date=2023-06-30/a.csv.gz"),
            b"x",
        )
        .unwrap();
        fs::write(dir.path().join("caravan/claim_raw_v1-2.csv.gz"), b"y").unwrap();
        fs::write(dir.path().join("caravan/asset_raw/b.csv.gz"), b"z").unwrap();
        fs::write(dir.path().join("youtube/c.csv.gz"), b"w").unwrap();

        let store = LocalBlobStore::new(dir.path());
        let start = store.walk_start("caravan/claim_raw_v1");
        assert_eq!(start, dir.path().join("caravan"));
        assert_eq!(
            store.list("caravan/claim_raw_v1").unwrap(),
            vec![
                "caravan/claim_raw_v1-1/report_date=2023-06-30/a.csv.gz",
                "caravan/claim_raw_v1-2.csv.gz",
            ]
        );
        assert_eq!(
            store.walk_start("caravan/claim_raw_v1-1/"),
            dir.path().join("caravan/claim_raw_v1-1")
        );
        assert_eq!(store.walk_start("caravan"), dir.path());
        assert!(store.list("missing/folder").unwrap().is_empty());
    }

    #[test]
    fn local_store_requires_existing_root() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("missing"));
        assert!(store.list("").is_err());
    }

    #[test]
    fn memory_store_filters_by_prefix() {
        let store = MemoryBlobStore::new()
            .with_object("b/one.csv.gz", b"1".to_vec())
            .with_object("a/two.csv.gz", b"2".to_vec());
        assert_eq!(store.list("a/").unwrap(), vec!["a/two.csv.gz"]);
        assert!(store.open("c/missing").is_err());
    }
}
