// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-operation session context.
//!
//! A [`SessionContext`] bundles everything a single protocol exchange needs:
//! the subscriber, the bank host, the product descriptor, and a bag of
//! string parameters. It is built fresh for every orchestrated operation,
//! borrowed by the collaborators for the duration of the exchange, and
//! dropped afterwards. It is never persisted and never shared across
//! operations.

use std::collections::HashMap;

use crate::config::Config;
use crate::entities::{Bank, User};
use crate::models::Product;

/// Ephemeral bundle of user, product, and protocol parameters for one
/// exchange.
pub struct SessionContext<'a> {
    user: &'a User,
    bank: &'a Bank,
    product: &'a Product,
    config: &'a Config,
    params: HashMap<String, String>,
}

impl<'a> SessionContext<'a> {
    pub fn new(user: &'a User, bank: &'a Bank, product: &'a Product, config: &'a Config) -> Self {
        Self {
            user,
            bank,
            product,
            config,
            params: HashMap::new(),
        }
    }

    pub fn user(&self) -> &User {
        self.user
    }

    pub fn bank(&self) -> &Bank {
        self.bank
    }

    pub fn product(&self) -> &Product {
        self.product
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    /// Adds a session parameter, replacing any previous value under the
    /// same name.
    pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }
}
