use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::sanitize::redact_path;
use crate::storage::{ByteStore, StoredRef};

/// Stores uploads as flat files in one directory.
pub struct LocalByteStore {
    upload_directory: PathBuf,
}

impl LocalByteStore {
    pub fn new<P: AsRef<Path>>(upload_directory: P) -> Self {
        Self {
            upload_directory: upload_directory.as_ref().to_path_buf(),
        }
    }

    pub fn upload_directory(&self) -> &Path {
        &self.upload_directory
    }

    fn ensure_directory(&self) -> Result<(), StorageError> {
        if !self.upload_directory.exists() {
            std::fs::create_dir_all(&self.upload_directory).map_err(|e| {
                StorageError::CreateDirectory {
                    path: self.upload_directory.clone(),
                    source: e,
                }
            })?;
        }
        Ok(())
    }

    /// Maps a reference back to a path, refusing anything that is not a
    /// single plain file name inside the upload directory.
    fn resolve(&self, stored: &StoredRef) -> Result<PathBuf, StorageError> {
        let key = stored.as_str();
        let is_plain = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\'])
            && !key.contains('\0');

        if !is_plain {
            return Err(StorageError::InvalidRef(key.to_string()));
        }

        Ok(self.upload_directory.join(key))
    }
}

impl ByteStore for LocalByteStore {
    fn save(&self, bytes: &[u8], name: &str) -> Result<StoredRef, StorageError> {
        let stored = StoredRef::new(name);
        let path = self.resolve(&stored)?;
        self.ensure_directory()?;

        // create_new fails if the name is taken, so an existing upload is never overwritten.
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => write_or_remove(file, bytes, &path)?,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::FileExists(path));
            }
            Err(e) => {
                return Err(StorageError::WriteFile { path, source: e });
            }
        }

        tracing::debug!(file = %redact_path(&path), bytes = bytes.len(), "Stored upload");
        Ok(stored)
    }

    fn read(&self, stored: &StoredRef) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(stored)?;
        std::fs::read(&path).map_err(|e| StorageError::ReadFile { path, source: e })
    }
}

/// Writes `bytes` into a freshly created file, removing it again if the
/// write fails so no partial upload is left behind.
fn write_or_remove<W: Write>(mut file: W, bytes: &[u8], path: &Path) -> Result<(), StorageError> {
    let written = file.write_all(bytes).and_then(|_| file.flush());
    drop(file);

    if let Err(e) = written {
        if let Err(cleanup) = std::fs::remove_file(path) {
            tracing::warn!(
                file = %redact_path(path),
                error = %cleanup,
                "Failed to remove partial upload"
            );
        }
        return Err(StorageError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}
