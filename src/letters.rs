// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Plain-text enrollment letters.
//!
//! After key generation the subscriber mails the bank one letter per key
//! pair, each carrying the key's fingerprint for manual verification. This
//! renderer produces the three letters as plain text; banks with stricter
//! form requirements can plug their own [`LetterRenderer`].

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::entities::User;
use crate::error::{Error, Result};
use crate::keystore::KeyPair;
use crate::protocol::{Letter, LetterRenderer};

/// EBICS process version a letter attests.
const SIGNATURE_VERSION: &str = "A005";
const ENCRYPTION_VERSION: &str = "E002";
const AUTHENTICATION_VERSION: &str = "X002";

/// Renders enrollment letters as plain text documents.
#[derive(Debug, Default)]
pub struct TextLetterRenderer;

impl TextLetterRenderer {
    pub fn new() -> Self {
        Self
    }

    fn render(&self, user: &User, version: &str, title: &str, pair: &KeyPair) -> Letter {
        let fingerprint = fingerprint(&pair.public);
        let date = Utc::now().format("%Y-%m-%d");

        let content = format!(
            "{title} ({version})\n\
             =============================================\n\
             Date:         {date}\n\
             User ID:      {user_id}\n\
             User name:    {name}\n\
             Partner ID:   {partner_id}\n\
             Organization: {organization}\n\
             \n\
             Public key hash (SHA-256):\n\
             {fingerprint}\n\
             \n\
             I hereby confirm the above public key for my\n\
             electronic signature.\n\
             \n\
             Place/date: ____________________\n\
             Signature:  ____________________\n",
            user_id = user.user_id(),
            name = user.name(),
            partner_id = user.partner_id(),
            organization = user.organization(),
        );

        Letter {
            file_name: format!("{}_{}.txt", user.user_id(), version),
            content: content.into_bytes(),
        }
    }

    fn keys_of<'a>(&self, user: &'a User) -> Result<&'a crate::keystore::UserKeys> {
        user.keys()
            .ok_or_else(|| Error::security("user key material is not loaded"))
    }
}

impl LetterRenderer for TextLetterRenderer {
    fn signature_letter(&self, user: &User) -> Result<Letter> {
        let keys = self.keys_of(user)?;
        Ok(self.render(user, SIGNATURE_VERSION, "Signature key letter", &keys.signature))
    }

    fn encryption_letter(&self, user: &User) -> Result<Letter> {
        let keys = self.keys_of(user)?;
        Ok(self.render(user, ENCRYPTION_VERSION, "Encryption key letter", &keys.encryption))
    }

    fn authentication_letter(&self, user: &User) -> Result<Letter> {
        let keys = self.keys_of(user)?;
        Ok(self.render(
            user,
            AUTHENTICATION_VERSION,
            "Authentication key letter",
            &keys.authentication,
        ))
    }
}

/// Uppercase hex SHA-256 digest, grouped in pairs for manual comparison.
fn fingerprint(public_key: &[u8]) -> String {
    let digest = Sha256::digest(public_key);
    hex::encode_upper(digest)
        .as_bytes()
        .chunks(2)
        .map(|pair| std::str::from_utf8(pair).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ")
}
