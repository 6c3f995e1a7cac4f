// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EBICS Client - Corporate Electronic Banking Client
//!
//! This crate implements the client side of the EBICS bank-to-corporate
//! protocol: subscriber key enrollment (INI/HIA/HPB/SPR), order file upload
//! and download, and the persistent bank/partner/user identity store backing
//! both. The XML wire codec and the bank-grade cryptography sit behind the
//! collaborator traits in [`protocol`]; a JSON-gateway HTTP adapter is
//! bundled in [`wire`].
//!
//! Execution is synchronous and single-threaded: one operation at a time
//! per client instance. The registry and the per-partner order counter have
//! no interior locking, so concurrent use against the same identities needs
//! separate client instances over separate roots.
//!
//! ## Modules
//!
//! - `client` - the client facade tying everything together
//! - `registry` - persistent bank/partner/user identity store
//! - `enrollment` - subscriber key enrollment operations
//! - `transfer` - order file upload/download operations
//! - `protocol` - collaborator contracts (key exchange, transfer, letters)
//! - `keystore` - password-sealed subscriber key material
//! - `storage` - records, per-user trees, trace artifacts
//! - `wire` - blocking HTTP adapter for a JSON EBICS gateway

pub mod client;
pub mod config;
pub mod entities;
pub mod enrollment;
pub mod error;
pub mod keystore;
pub mod letters;
pub mod models;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod storage;
pub mod transfer;
pub mod wire;

pub use client::EbicsClient;
pub use config::Config;
pub use error::{Error, Result};
pub use models::{DateRange, OrderAttribute, OrderType, Product};
pub use protocol::DownloadOutcome;
pub use registry::NewUser;
