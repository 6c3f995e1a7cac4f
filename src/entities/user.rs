// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Subscriber (user) records.
//!
//! A user's key material is never part of the persisted record; it lives in
//! the sealed keystore file and is attached in memory after a successful
//! unseal (see [`crate::keystore`]).

use serde::{Deserialize, Serialize};

use crate::keystore::UserKeys;

/// An enrolled (or enrolling) EBICS subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    user_id: String,
    partner_id: String,
    name: String,
    email: String,
    country: String,
    organization: String,
    /// Signature key accepted by the bank (INI done).
    initialized: bool,
    /// Encryption and authentication keys accepted by the bank (HIA done).
    initialized_hia: bool,
    #[serde(skip)]
    keys: Option<UserKeys>,
    #[serde(skip)]
    dirty: bool,
}

impl User {
    pub fn new(
        partner_id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        country: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            partner_id: partner_id.into(),
            name: name.into(),
            email: email.into(),
            country: country.into(),
            organization: organization.into(),
            initialized: false,
            initialized_hia: false,
            keys: None,
            dirty: true,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Partner id of the partner this user belongs to.
    pub fn partner_id(&self) -> &str {
        &self.partner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Whether the bank has accepted the signature key.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the bank has accepted the encryption and authentication keys.
    pub fn is_initialized_hia(&self) -> bool {
        self.initialized_hia
    }

    /// Records bank acceptance of the signature key. Monotonic: once set the
    /// flag never reverts, and setting it again is a no-op.
    pub fn set_initialized(&mut self) {
        if !self.initialized {
            self.initialized = true;
            self.dirty = true;
        }
    }

    /// Records bank acceptance of the encryption/authentication keys.
    /// Monotonic like [`User::set_initialized`].
    pub fn set_initialized_hia(&mut self) {
        if !self.initialized_hia {
            self.initialized_hia = true;
            self.dirty = true;
        }
    }

    /// Decrypted key material, present after enrollment or a successful load.
    pub fn keys(&self) -> Option<&UserKeys> {
        self.keys.as_ref()
    }

    pub(crate) fn attach_keys(&mut self, keys: UserKeys) {
        self.keys = Some(keys);
    }

    /// Persistence key convention for user records.
    pub fn record_key(&self) -> String {
        format!("user-{}", self.user_id)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("PARTNER1", "USER1", "Jane Doe", "jane@corp.example", "DE", "Corp")
    }

    #[test]
    fn new_user_has_both_flags_unset() {
        let user = user();
        assert!(!user.is_initialized());
        assert!(!user.is_initialized_hia());
        assert!(user.keys().is_none());
    }

    #[test]
    fn initialization_flags_are_monotonic() {
        let mut user = user();
        user.clear_dirty();

        user.set_initialized();
        assert!(user.is_initialized());
        assert!(user.is_dirty());

        user.clear_dirty();
        user.set_initialized();
        // Second call is a no-op, nothing new to save.
        assert!(!user.is_dirty());
        assert!(user.is_initialized());
    }

    #[test]
    fn hia_flag_is_independent() {
        let mut user = user();
        user.set_initialized_hia();
        assert!(user.is_initialized_hia());
        assert!(!user.is_initialized());
    }

    #[test]
    fn record_round_trip_preserves_flags_and_linkage() {
        let mut user = user();
        user.set_initialized();

        let json = serde_json::to_string(&user).unwrap();
        let restored: User = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.user_id(), "USER1");
        assert_eq!(restored.partner_id(), "PARTNER1");
        assert!(restored.is_initialized());
        assert!(!restored.is_initialized_hia());
        // Key material never travels with the record.
        assert!(restored.keys().is_none());
    }

    #[test]
    fn record_key_uses_user_prefix() {
        assert_eq!(user().record_key(), "user-USER1");
    }
}
