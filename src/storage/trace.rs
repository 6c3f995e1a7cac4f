// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request/response trace artifacts.
//!
//! Every orchestrated operation points the trace manager at the acting
//! user's trace directory before the exchange starts, so a failed exchange
//! can be reconstructed afterwards from the raw artifacts. Traces are a
//! diagnostic cache; [`TraceManager::clear`] discards them without touching
//! entity records.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;

use crate::error::{Error, Result};

/// Writes raw protocol artifacts into the currently selected directory.
#[derive(Debug, Default)]
pub struct TraceManager {
    directory: RefCell<Option<PathBuf>>,
}

impl TraceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects (and creates) the directory subsequent artifacts go to.
    pub fn set_directory(&self, dir: impl Into<PathBuf>) -> Result<()> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        *self.directory.borrow_mut() = Some(dir);
        Ok(())
    }

    /// Currently selected directory, if any.
    pub fn directory(&self) -> Option<PathBuf> {
        self.directory.borrow().clone()
    }

    /// Writes one artifact under a timestamped unique name and returns its
    /// path. Fails if no directory has been selected yet.
    pub fn record(&self, label: &str, payload: &[u8]) -> Result<PathBuf> {
        let dir = self
            .directory
            .borrow()
            .clone()
            .ok_or_else(|| Error::configuration("no trace directory selected"))?;

        let name = format!(
            "{}_{}_{}.bin",
            Utc::now().format("%Y%m%dT%H%M%S%3f"),
            label,
            &uuid::Uuid::new_v4().simple().to_string()[..8],
        );
        let path = dir.join(name);
        fs::write(&path, payload)?;
        Ok(path)
    }

    /// Discards every artifact in the selected directory. A no-op when no
    /// directory is selected.
    pub fn clear(&self) -> Result<()> {
        let Some(dir) = self.directory.borrow().clone() else {
            return Ok(());
        };
        if !dir.exists() {
            return Ok(());
        }
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.path().is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}
