// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Filesystem persistence for entity records and raw artifacts.
//!
//! Records are JSON documents keyed by the entity's persistence key
//! (`{host_id}`, `partner-{id}`, `user-{id}`). Writes go to a temp file
//! first and are moved into place with a rename, so readers never observe a
//! half-written record.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use super::ClientPaths;
use crate::error::{Error, Result};

/// Record store over the client root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    paths: ClientPaths,
}

impl FileStore {
    pub fn new(paths: ClientPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ClientPaths {
        &self.paths
    }

    // ========== Entity Records ==========

    /// Reads and decodes a record. A missing file is [`Error::NotFound`];
    /// an undecodable one is a protocol fault.
    pub fn read_record<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let path = self.paths.record(key);
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::not_found(format!("no persisted record for '{key}'"))
            } else {
                Error::Io(e)
            }
        })?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Encodes and writes a record atomically.
    pub fn write_record<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.write_json(self.paths.record(key), value)
    }

    /// Whether a record exists.
    pub fn record_exists(&self, key: &str) -> bool {
        self.paths.record(key).is_file()
    }

    // ========== Generic JSON Operations ==========

    fn write_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    // ========== Raw File Operations (sealed keys, letters) ==========

    /// Writes raw bytes, creating parent directories as needed.
    pub fn write_raw(&self, path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    /// Reads raw bytes. A missing file is [`Error::NotFound`].
    pub fn read_raw(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::not_found(format!("no file at {}", path.display()))
            } else {
                Error::Io(e)
            }
        })?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Creates a directory including parents.
    pub fn create_dir(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::create_dir_all(path.as_ref())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    fn test_store() -> (TempDir, FileStore) {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(ClientPaths::new(temp.path()));
        (temp, store)
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestRecord {
        id: String,
        value: i32,
    }

    #[test]
    fn write_and_read_record() {
        let (_temp, store) = test_store();
        let record = TestRecord {
            id: "partner-P1".to_string(),
            value: 42,
        };

        store.write_record("partner-P1", &record).unwrap();
        let read: TestRecord = store.read_record("partner-P1").unwrap();
        assert_eq!(read, record);
        assert!(store.record_exists("partner-P1"));
    }

    #[test]
    fn missing_record_is_not_found() {
        let (_temp, store) = test_store();
        let result = store.read_record::<TestRecord>("user-nobody");
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(!store.record_exists("user-nobody"));
    }

    #[test]
    fn corrupt_record_is_a_protocol_fault() {
        let (_temp, store) = test_store();
        store
            .write_raw(store.paths().record("HOST1"), b"{ not json")
            .unwrap();
        let result = store.read_record::<TestRecord>("HOST1");
        assert!(matches!(result, Err(Error::Protocol { .. })));
    }

    #[test]
    fn record_writes_leave_no_temp_file() {
        let (_temp, store) = test_store();
        store
            .write_record("HOST1", &TestRecord { id: "h".into(), value: 1 })
            .unwrap();
        assert!(!store.paths().record("HOST1").with_extension("tmp").exists());
    }

    #[test]
    fn write_and_read_raw() {
        let (_temp, store) = test_store();
        let data = b"sealed key bytes \x00\x01\x02";
        let path = store.paths().keystore_file("USER1");

        store.write_raw(&path, data).unwrap();
        assert_eq!(store.read_raw(&path).unwrap(), data);
    }

    #[test]
    fn missing_raw_file_is_not_found() {
        let (_temp, store) = test_store();
        let result = store.read_raw(store.paths().keystore_file("USER1"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
