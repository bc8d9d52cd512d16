use std::io::ErrorKind;
use std::path::PathBuf;
use tact_sys::{Storage, StorageError};

/// Keeps each record in its own file, named after its key, inside one directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, key: &[u8]) -> PathBuf {
        self.dir.join(&*String::from_utf8_lossy(key))
    }
}

fn storage_error(e: std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound,
        ErrorKind::StorageFull => StorageError::Full,
        _ => StorageError::Io,
    }
}

impl Storage for FileStorage {
    fn get(&mut self, key: &[u8], buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = std::fs::read(self.path(key)).map_err(storage_error)?;
        let dest = buf.get_mut(..data.len()).ok_or(StorageError::BufferTooSmall(data.len()))?;
        dest.copy_from_slice(&data);
        Ok(data.len())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(storage_error)?;
        std::fs::write(self.path(key), value).map_err(storage_error)
    }

    fn invalidate(&mut self, key: &[u8]) -> Result<(), StorageError> {
        std::fs::remove_file(self.path(key)).map_err(storage_error)
    }
}
