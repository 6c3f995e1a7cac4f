// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contracts consumed by the orchestration core.
//!
//! The wire codec and bank-grade cryptography live behind these traits. The
//! crate ships one implementation ([`crate::wire::GatewayTransport`]); tests
//! substitute recording fakes.

use zeroize::Zeroizing;

use crate::entities::BankKeys;
use crate::error::Result;
use crate::models::{DateRange, OrderAttribute, OrderType};
use crate::session::SessionContext;

/// Key-management exchanges with the bank.
pub trait KeyExchange {
    /// Submits the subscriber's public signature key (INI).
    fn submit_signature_key(&self, session: &SessionContext<'_>) -> Result<()>;

    /// Submits the subscriber's public encryption and authentication keys
    /// (HIA).
    fn submit_encryption_keys(&self, session: &SessionContext<'_>) -> Result<()>;

    /// Retrieves the bank's current public keys (HPB).
    fn retrieve_bank_keys(&self, session: &SessionContext<'_>) -> Result<BankKeys>;

    /// Asks the bank to lock the subscriber (SPR).
    fn lock_subscriber(&self, session: &SessionContext<'_>) -> Result<()>;
}

/// Outcome of a download exchange. An empty window is a regular, benign
/// answer to a date-range query, so callers are forced to handle it
/// separately from failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The bank returned file data.
    Data(Vec<u8>),
    /// The bank reported that the requested window contains nothing.
    NoData,
}

/// Order file transfer with the bank.
pub trait TransferChannel {
    /// Uploads an order file under the given order id.
    fn upload(
        &self,
        session: &SessionContext<'_>,
        payload: &[u8],
        order_type: OrderType,
        attribute: OrderAttribute,
        order_id: u32,
    ) -> Result<()>;

    /// Downloads an order file, optionally restricted to an inclusive date
    /// range.
    fn download(
        &self,
        session: &SessionContext<'_>,
        order_type: OrderType,
        range: Option<&DateRange>,
    ) -> Result<DownloadOutcome>;
}

/// A rendered enrollment letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Letter {
    /// File name the letter should be written under.
    pub file_name: String,
    /// Rendered document bytes.
    pub content: Vec<u8>,
}

/// Renders the three enrollment letters the subscriber mails to the bank.
pub trait LetterRenderer {
    /// Letter for the signature key (A005).
    fn signature_letter(&self, user: &crate::entities::User) -> Result<Letter>;

    /// Letter for the encryption key (E002).
    fn encryption_letter(&self, user: &crate::entities::User) -> Result<Letter>;

    /// Letter for the authentication key (X002).
    fn authentication_letter(&self, user: &crate::entities::User) -> Result<Letter>;
}

/// Capability supplying the keystore password on demand. The secret is
/// produced for the single seal/unseal call that needs it and is wiped when
/// the returned guard drops.
pub trait PasswordSource {
    fn password(&self) -> Zeroizing<String>;
}

impl<F> PasswordSource for F
where
    F: Fn() -> String,
{
    fn password(&self) -> Zeroizing<String> {
        Zeroizing::new(self())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_password_sources() {
        let source = || "hunter2".to_string();
        assert_eq!(source.password().as_str(), "hunter2");
    }

    #[test]
    fn download_outcomes_compare() {
        assert_eq!(DownloadOutcome::NoData, DownloadOutcome::NoData);
        assert_ne!(DownloadOutcome::Data(vec![1]), DownloadOutcome::NoData);
    }
}
