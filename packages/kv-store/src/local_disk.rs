use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::{KvError, KvStore};

/// A persistent store keeping one file per key under a root directory.
///
/// The file name is the key and the file contents are the value, verbatim.
/// Keys therefore have to be valid single file names: non-empty, not `.` or
/// `..`, and free of path separators and NUL bytes.
#[derive(Debug)]
pub struct LocalDiskKvStore {
    root: PathBuf,
}

impl LocalDiskKvStore {
    /// Open a store rooted at an existing, writable directory.
    pub fn new(root: PathBuf) -> Result<LocalDiskKvStore, KvError> {
        let attr = fs::metadata(&root).map_err(|source| KvError::RootPathInvalid {
            path: root.clone(),
            source,
        })?;

        if !attr.is_dir() {
            return Err(KvError::RootPathInvalid {
                path: root,
                source: io::Error::other("Root path must be a directory."),
            });
        }

        if attr.permissions().readonly() {
            return Err(KvError::RootPathInvalid {
                path: root,
                source: io::Error::other("Root directory must be writable"),
            });
        }

        match root.canonicalize() {
            Ok(root) => Ok(LocalDiskKvStore { root }),
            Err(source) => Err(KvError::RootPathInvalid { path: root, source }),
        }
    }

    /// Create the root directory (and parents) if needed, then open it.
    pub fn open_or_create(root: impl AsRef<Path>) -> Result<LocalDiskKvStore, KvError> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|source| KvError::RootPathInvalid {
            path: root.to_path_buf(),
            source,
        })?;
        Self::new(root.to_path_buf())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_to_file_path(&self, key: &str) -> Result<PathBuf, KvError> {
        if key.is_empty() {
            return Err(KvError::invalid_key(key, "empty key"));
        }
        if key == "." || key == ".." {
            return Err(KvError::invalid_key(key, "reserved file name"));
        }
        if key.contains(['/', '\\', '\0']) {
            return Err(KvError::invalid_key(
                key,
                "contains a path separator or NUL byte",
            ));
        }
        Ok(self.root.join(key))
    }
}

impl KvStore for LocalDiskKvStore {
    fn list_keys(&self) -> Result<Vec<String>, KvError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(key) => keys.push(key),
                Err(name) => log::warn!("Skipping non UTF-8 file name {:?}", name),
            }
        }
        // read_dir order is platform dependent.
        keys.sort();
        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let file_path = self.key_to_file_path(key)?;
        log::debug!("Reading {}...", file_path.display());
        match fs::read_to_string(&file_path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        let file_path = self.key_to_file_path(key)?;
        log::debug!("Writing {}...", file_path.display());
        let mut f = fs::File::create(&file_path)?;
        f.write_all(value.as_bytes())?;
        f.flush()?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), KvError> {
        let file_path = self.key_to_file_path(key)?;
        log::debug!("Removing {}...", file_path.display());
        match fs::remove_file(&file_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
