// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path layout for the client root directory.

use std::path::{Path, PathBuf};

/// Path utilities for the client storage layout.
#[derive(Debug, Clone)]
pub struct ClientPaths {
    root: PathBuf,
}

impl ClientPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all client state.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Entity Records ==========

    /// Directory containing all persisted entity records.
    pub fn records_dir(&self) -> PathBuf {
        self.root.join("records")
    }

    /// Path to a record file by its persistence key.
    pub fn record(&self, key: &str) -> PathBuf {
        self.records_dir().join(format!("{key}.json"))
    }

    // ========== Per-User Directories ==========

    /// Directory containing all user trees.
    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    /// Root directory of one user's tree.
    pub fn user_dir(&self, user_id: &str) -> PathBuf {
        self.users_dir().join(user_id)
    }

    /// Directory for a user's request/response trace artifacts.
    pub fn traces_dir(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("traces")
    }

    /// Directory for a user's sealed key material.
    pub fn keystore_dir(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("keystore")
    }

    /// Path to a user's sealed key blob.
    pub fn keystore_file(&self, user_id: &str) -> PathBuf {
        self.keystore_dir(user_id).join(format!("{user_id}.keys"))
    }

    /// Directory for a user's rendered enrollment letters.
    pub fn letters_dir(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("letters")
    }

    /// All directories that must exist before a user can enroll.
    pub fn user_bootstrap_dirs(&self, user_id: &str) -> [PathBuf; 4] {
        [
            self.user_dir(user_id),
            self.traces_dir(user_id),
            self.keystore_dir(user_id),
            self.letters_dir(user_id),
        ]
    }
}
