// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The client facade.
//!
//! [`EbicsClient`] ties the identity registry, the trace manager, and the
//! protocol collaborators together. The enrollment operations live in
//! [`crate::enrollment`], the file transfer operations in
//! [`crate::transfer`]; both are `impl` blocks on this type.

use std::rc::Rc;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::letters::TextLetterRenderer;
use crate::models::Product;
use crate::protocol::{KeyExchange, PasswordSource, TransferChannel};
use crate::registry::{IdentityRegistry, NewUser};
use crate::session::SessionContext;
use crate::storage::{ClientPaths, FileStore, TraceManager};

/// Synchronous EBICS client: one instance per process, one operation at a
/// time.
pub struct EbicsClient {
    config: Config,
    product: Product,
    registry: IdentityRegistry,
    pub(crate) key_exchange: Box<dyn KeyExchange>,
    pub(crate) transfer: Box<dyn TransferChannel>,
    traces: Rc<TraceManager>,
}

impl EbicsClient {
    /// Builds a client rooted at the configured directory, with the default
    /// letter renderer.
    pub fn new(
        config: Config,
        key_exchange: Box<dyn KeyExchange>,
        transfer: Box<dyn TransferChannel>,
        traces: Rc<TraceManager>,
    ) -> Self {
        let store = FileStore::new(ClientPaths::new(config.root()));
        let registry = IdentityRegistry::new(store, Box::new(TextLetterRenderer::new()));
        let product = config.product();
        Self {
            config,
            product,
            registry,
            key_exchange,
            transfer,
            traces,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut IdentityRegistry {
        &mut self.registry
    }

    // ========== Identity Lifecycle ==========

    /// Enrolls a new subscriber.
    pub fn create_user(&mut self, new: NewUser, password: &dyn PasswordSource) -> Result<()> {
        self.registry.create_user(new, password)?;
        Ok(())
    }

    /// Enrolls the subscriber described in the settings file.
    pub fn create_configured_user(&mut self, password: &dyn PasswordSource) -> Result<()> {
        let new = NewUser::from_config(&self.config);
        self.create_user(new, password)
    }

    /// Loads a persisted subscriber.
    pub fn load_user(
        &mut self,
        host_id: &str,
        partner_id: &str,
        user_id: &str,
        password: &dyn PasswordSource,
    ) -> Result<()> {
        self.registry.load_user(host_id, partner_id, user_id, password)?;
        Ok(())
    }

    /// Loads the subscriber described in the settings file.
    pub fn load_configured_user(&mut self, password: &dyn PasswordSource) -> Result<()> {
        let host_id = self.config.host_id().to_string();
        let partner_id = self.config.partner_id().to_string();
        let user_id = self.config.user_id().to_string();
        self.load_user(&host_id, &partner_id, &user_id, password)
    }

    /// Re-renders a registered user's enrollment letters.
    pub fn write_letters(&self, user_id: &str) -> Result<()> {
        self.registry.write_letters(user_id)
    }

    /// Advances a user's partner order counter without a protocol exchange.
    pub fn skip_order_ids(&mut self, user_id: &str, n: u32) -> Result<()> {
        self.registry.partner_of_user_mut(user_id)?.skip_order_ids(n);
        Ok(())
    }

    // ========== Session & Trace Plumbing ==========

    /// Builds the ephemeral context for one exchange on behalf of a user.
    pub(crate) fn session(&self, user_id: &str) -> Result<SessionContext<'_>> {
        let (user, _partner, bank) = self.registry.chain(user_id)?;
        Ok(SessionContext::new(user, bank, &self.product, &self.config))
    }

    /// Points the trace manager at the acting user's trace directory.
    pub(crate) fn begin_trace(&self, user_id: &str) -> Result<()> {
        self.traces
            .set_directory(self.registry.store().paths().traces_dir(user_id))
    }

    // ========== Shutdown ==========

    /// Persists dirty entities (best-effort).
    pub fn save_dirty(&mut self) {
        self.registry.save_dirty();
    }

    /// Discards cached trace artifacts.
    pub fn clear_traces(&self) {
        info!("clearing trace cache");
        if let Err(e) = self.traces.clear() {
            tracing::error!(error = %e, "clearing trace cache failed");
        }
    }

    /// Shutdown path: saves whatever changed, then drops the trace cache.
    pub fn quit(&mut self) {
        self.save_dirty();
        self.clear_traces();
    }
}
