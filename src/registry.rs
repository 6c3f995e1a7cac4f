// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Registry
//!
//! Process-lifetime store of the bank/partner/user tree. The registry owns
//! three maps keyed by natural identifier and every load/create/save
//! decision:
//!
//! - creating a user persists the whole chain and registers it only after
//!   every step succeeded, so a failed enrollment never leaves a partial
//!   identity behind;
//! - loading walks bank, then partner, then user, unseals the key material
//!   with the caller-supplied password, and registers the chain atomically;
//! - `save_dirty` persists changed entities best-effort, users before
//!   partners before banks, so an advanced order counter survives even when
//!   a later save fails.
//!
//! Registration is last-write-wins per key. The registry has no interior
//! locking; see the crate-level notes on the single-threaded model.

use std::collections::HashMap;

use tracing::{error, info};
use url::Url;

use crate::config::Config;
use crate::entities::{Bank, Partner, User};
use crate::error::{Error, Result};
use crate::keystore;
use crate::protocol::{LetterRenderer, PasswordSource};
use crate::storage::FileStore;

/// Parameters for enrolling a new subscriber.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub url: Url,
    pub bank_name: String,
    pub host_id: String,
    pub partner_id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub country: String,
    pub organization: String,
    pub use_certificate: bool,
}

impl NewUser {
    /// Enrollment parameters as configured in the settings file.
    pub fn from_config(config: &Config) -> Self {
        Self {
            url: config.bank_url().clone(),
            bank_name: config.bank_name().to_string(),
            host_id: config.host_id().to_string(),
            partner_id: config.partner_id().to_string(),
            user_id: config.user_id().to_string(),
            name: config.user_name().to_string(),
            email: config.user_email().to_string(),
            country: config.user_country().to_string(),
            organization: config.user_organization().to_string(),
            use_certificate: config.bank_uses_certificate(),
        }
    }
}

/// In-memory registry of banks, partners, and users.
pub struct IdentityRegistry {
    banks: HashMap<String, Bank>,
    partners: HashMap<String, Partner>,
    users: HashMap<String, User>,
    store: FileStore,
    letters: Box<dyn LetterRenderer>,
}

impl IdentityRegistry {
    pub fn new(store: FileStore, letters: Box<dyn LetterRenderer>) -> Self {
        Self {
            banks: HashMap::new(),
            partners: HashMap::new(),
            users: HashMap::new(),
            store,
            letters,
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    // ========== Lookups ==========

    pub fn bank(&self, host_id: &str) -> Result<&Bank> {
        self.banks
            .get(host_id)
            .ok_or_else(|| Error::not_found(format!("bank '{host_id}' is not registered")))
    }

    pub fn partner(&self, partner_id: &str) -> Result<&Partner> {
        self.partners
            .get(partner_id)
            .ok_or_else(|| Error::not_found(format!("partner '{partner_id}' is not registered")))
    }

    pub fn user(&self, user_id: &str) -> Result<&User> {
        self.users
            .get(user_id)
            .ok_or_else(|| Error::not_found(format!("user '{user_id}' is not registered")))
    }

    pub fn user_mut(&mut self, user_id: &str) -> Result<&mut User> {
        self.users
            .get_mut(user_id)
            .ok_or_else(|| Error::not_found(format!("user '{user_id}' is not registered")))
    }

    /// Resolves the full ownership chain of a user.
    pub fn chain(&self, user_id: &str) -> Result<(&User, &Partner, &Bank)> {
        let user = self.user(user_id)?;
        let partner = self.partner(user.partner_id())?;
        let bank = self.bank(partner.host_id())?;
        Ok((user, partner, bank))
    }

    /// Mutable access to the partner owning a user.
    pub fn partner_of_user_mut(&mut self, user_id: &str) -> Result<&mut Partner> {
        let partner_id = self.user(user_id)?.partner_id().to_string();
        self.partners
            .get_mut(&partner_id)
            .ok_or_else(|| Error::not_found(format!("partner '{partner_id}' is not registered")))
    }

    /// Mutable access to the bank owning a user's partner.
    pub fn bank_of_user_mut(&mut self, user_id: &str) -> Result<&mut Bank> {
        let host_id = {
            let user = self.user(user_id)?;
            self.partner(user.partner_id())?.host_id().to_string()
        };
        self.banks
            .get_mut(&host_id)
            .ok_or_else(|| Error::not_found(format!("bank '{host_id}' is not registered")))
    }

    // ========== Creation ==========

    /// Constructs and registers a bank. Re-creating a registered host with
    /// identical parameters returns the existing record; differing
    /// parameters are a configuration error.
    pub fn create_bank(
        &mut self,
        url: Url,
        name: &str,
        host_id: &str,
        use_certificate: bool,
    ) -> Result<&Bank> {
        if let Some(existing) = self.banks.get(host_id) {
            if existing.url() != &url || existing.name() != name {
                return Err(Error::configuration(format!(
                    "bank '{host_id}' is already registered with different parameters"
                )));
            }
            return self.bank(host_id);
        }
        self.banks
            .insert(host_id.to_string(), Bank::new(url, name, host_id, use_certificate));
        self.bank(host_id)
    }

    /// Constructs and registers a partner under an already registered bank.
    pub fn create_partner(&mut self, host_id: &str, partner_id: &str) -> Result<&Partner> {
        let bank = self.bank(host_id)?;
        let partner = Partner::new(bank.host_id(), partner_id);
        self.partners.insert(partner_id.to_string(), partner);
        self.partner(partner_id)
    }

    /// Enrolls a new subscriber: bootstraps the user's directory tree,
    /// generates and seals key material, persists bank, partner, and user,
    /// writes the enrollment letters, and registers the chain. On any
    /// failure nothing is registered.
    pub fn create_user(&mut self, new: NewUser, password: &dyn PasswordSource) -> Result<&User> {
        let user_id = new.user_id.clone();
        info!(user_id = %user_id, "creating user");

        match self.try_create_user(new, password) {
            Ok(()) => {
                info!(user_id = %user_id, "user created");
                self.user(&user_id)
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "user creation failed");
                Err(e)
            }
        }
    }

    fn try_create_user(&mut self, new: NewUser, password: &dyn PasswordSource) -> Result<()> {
        // Reuse an already registered bank/partner when the ids match,
        // otherwise build fresh records. Nothing is registered until the
        // whole chain below has succeeded.
        let bank = match self.banks.get(&new.host_id) {
            Some(existing) => {
                if existing.url() != &new.url || existing.name() != new.bank_name {
                    return Err(Error::configuration(format!(
                        "bank '{}' is already registered with different parameters",
                        new.host_id
                    )));
                }
                existing.clone()
            }
            None => Bank::new(
                new.url.clone(),
                new.bank_name.as_str(),
                new.host_id.as_str(),
                new.use_certificate,
            ),
        };
        let partner = match self.partners.get(&new.partner_id) {
            Some(existing) => existing.clone(),
            None => Partner::new(bank.host_id(), new.partner_id.as_str()),
        };
        let mut user = User::new(
            new.partner_id.as_str(),
            new.user_id.as_str(),
            new.name.as_str(),
            new.email.as_str(),
            new.country.as_str(),
            new.organization.as_str(),
        );

        info!(user_id = %new.user_id, "creating user directories");
        for dir in self.store.paths().user_bootstrap_dirs(&new.user_id) {
            self.store.create_dir(dir)?;
        }

        let keys = keystore::generate()?;
        let sealed = keystore::seal(&keys, password.password().as_str())?;
        self.store
            .write_raw(self.store.paths().keystore_file(&new.user_id), &sealed)?;
        user.attach_keys(keys);

        self.write_letters_for(&user)?;

        self.store.write_record(bank.record_key(), &bank)?;
        self.store.write_record(&partner.record_key(), &partner)?;
        self.store.write_record(&user.record_key(), &user)?;

        self.register(bank, partner, user);
        Ok(())
    }

    /// Loads a persisted subscriber chain, decrypting the key material with
    /// the supplied password. Registers bank, partner, and user only after
    /// every step succeeded.
    pub fn load_user(
        &mut self,
        host_id: &str,
        partner_id: &str,
        user_id: &str,
        password: &dyn PasswordSource,
    ) -> Result<&User> {
        info!(user_id = %user_id, "loading user");

        match self.try_load_user(host_id, partner_id, user_id, password) {
            Ok(()) => {
                info!(user_id = %user_id, "user loaded");
                self.user(user_id)
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "loading user failed");
                Err(e)
            }
        }
    }

    fn try_load_user(
        &mut self,
        host_id: &str,
        partner_id: &str,
        user_id: &str,
        password: &dyn PasswordSource,
    ) -> Result<()> {
        let bank: Bank = self.store.read_record(host_id)?;
        let partner: Partner = self.store.read_record(&format!("partner-{partner_id}"))?;
        let mut user: User = self.store.read_record(&format!("user-{user_id}"))?;

        let sealed = self.store.read_raw(self.store.paths().keystore_file(user_id))?;
        let keys = keystore::open(&sealed, password.password().as_str())?;
        user.attach_keys(keys);

        self.register(bank, partner, user);
        Ok(())
    }

    fn register(&mut self, mut bank: Bank, mut partner: Partner, mut user: User) {
        bank.clear_dirty();
        partner.clear_dirty();
        user.clear_dirty();
        self.banks.insert(bank.host_id().to_string(), bank);
        self.partners.insert(partner.partner_id().to_string(), partner);
        self.users.insert(user.user_id().to_string(), user);
    }

    // ========== Letters ==========

    /// Renders and writes the three enrollment letters of a registered
    /// user.
    pub fn write_letters(&self, user_id: &str) -> Result<()> {
        let user = self.user(user_id)?;
        self.write_letters_for(user)
    }

    fn write_letters_for(&self, user: &User) -> Result<()> {
        let dir = self.store.paths().letters_dir(user.user_id());
        let letters = [
            self.letters.signature_letter(user)?,
            self.letters.encryption_letter(user)?,
            self.letters.authentication_letter(user)?,
        ];
        for letter in letters {
            self.store.write_raw(dir.join(&letter.file_name), &letter.content)?;
        }
        Ok(())
    }

    // ========== Persistence ==========

    /// Persists every dirty entity and clears its flag, users first, then
    /// partners, then banks. A failed save is logged and skipped; the
    /// remaining entities are still attempted.
    pub fn save_dirty(&mut self) {
        for user in self.users.values_mut() {
            if user.is_dirty() {
                info!(user_id = %user.user_id(), "saving user");
                match self.store.write_record(&user.record_key(), user) {
                    Ok(()) => user.clear_dirty(),
                    Err(e) => error!(user_id = %user.user_id(), error = %e, "saving user failed"),
                }
            }
        }
        for partner in self.partners.values_mut() {
            if partner.is_dirty() {
                info!(partner_id = %partner.partner_id(), "saving partner");
                match self.store.write_record(&partner.record_key(), partner) {
                    Ok(()) => partner.clear_dirty(),
                    Err(e) => {
                        error!(partner_id = %partner.partner_id(), error = %e, "saving partner failed")
                    }
                }
            }
        }
        for bank in self.banks.values_mut() {
            if bank.is_dirty() {
                info!(host_id = %bank.host_id(), "saving bank");
                match self.store.write_record(bank.record_key(), bank) {
                    Ok(()) => bank.clear_dirty(),
                    Err(e) => error!(host_id = %bank.host_id(), error = %e, "saving bank failed"),
                }
            }
        }
    }
}
