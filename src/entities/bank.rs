// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The bank host an EBICS subscriber talks to.

use serde::{Deserialize, Serialize};
use url::Url;

/// The bank's public keys, as retrieved with an HPB order. Absent until the
/// first successful retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BankKeys {
    pub signature: Vec<u8>,
    pub encryption: Vec<u8>,
    pub authentication: Vec<u8>,
}

/// A bank host, identified by its EBICS host id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bank {
    host_id: String,
    url: Url,
    name: String,
    use_certificate: bool,
    keys: Option<BankKeys>,
    #[serde(skip)]
    dirty: bool,
}

impl Bank {
    /// Creates a bank record. New records start dirty so they are persisted
    /// by the next save cycle even if nothing else changes.
    pub fn new(url: Url, name: impl Into<String>, host_id: impl Into<String>, use_certificate: bool) -> Self {
        Self {
            host_id: host_id.into(),
            url,
            name: name.into(),
            use_certificate,
            keys: None,
            dirty: true,
        }
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the bank requires certificate-based trust instead of plain
    /// public keys.
    pub fn use_certificate(&self) -> bool {
        self.use_certificate
    }

    pub fn keys(&self) -> Option<&BankKeys> {
        self.keys.as_ref()
    }

    /// Stores freshly retrieved bank keys, replacing any previous set.
    pub fn set_keys(&mut self, keys: BankKeys) {
        self.keys = Some(keys);
        self.dirty = true;
    }

    /// Persistence key: banks are stored under their plain host id.
    pub fn record_key(&self) -> &str {
        &self.host_id
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}
