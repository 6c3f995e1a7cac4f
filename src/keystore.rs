// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Subscriber key material and its password-sealed at-rest form.
//!
//! Each subscriber owns three key pairs (signature, encryption,
//! authentication). On disk they are stored as a single sealed blob:
//!
//! ```text
//! salt (16 bytes) || nonce (12 bytes) || ChaCha20-Poly1305 ciphertext
//! ```
//!
//! The sealing key is derived from the operator password with an iterated
//! HMAC-SHA-256 stretch over a random salt. A wrong password surfaces as
//! [`Error::Security`]; the AEAD tag makes tampering indistinguishable from
//! a bad password, which is the right failure mode for a keystore.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{Error, Result};

const SALT_SIZE: usize = 16;
const NONCE_SIZE: usize = 12;
const KDF_ROUNDS: u32 = 100_000;

/// One key pair. The private half only ever exists in memory or inside the
/// sealed blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    pub public: Vec<u8>,
    pub private: Vec<u8>,
}

/// The three key pairs a subscriber enrolls with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct UserKeys {
    pub signature: KeyPair,
    pub encryption: KeyPair,
    pub authentication: KeyPair,
}

/// Generates a fresh set of subscriber key pairs.
pub fn generate() -> Result<UserKeys> {
    Ok(UserKeys {
        signature: generate_pair(),
        encryption: generate_pair(),
        authentication: generate_pair(),
    })
}

fn generate_pair() -> KeyPair {
    let signing = ed25519_dalek::SigningKey::generate(&mut OsRng);
    KeyPair {
        public: signing.verifying_key().to_bytes().to_vec(),
        private: signing.to_bytes().to_vec(),
    }
}

/// Seals key material under a password.
pub fn seal(keys: &UserKeys, password: &str) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(password.as_bytes(), &salt)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_slice()));

    let plaintext = Zeroizing::new(serde_json::to_vec(keys)?);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|_| Error::security("failed to seal key material"))?;

    let mut blob = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Opens a sealed blob. Fails with [`Error::Security`] when the password is
/// wrong or the blob was tampered with.
pub fn open(blob: &[u8], password: &str) -> Result<UserKeys> {
    if blob.len() < SALT_SIZE + NONCE_SIZE {
        return Err(Error::security("sealed key material is truncated"));
    }
    let (salt, rest) = blob.split_at(SALT_SIZE);
    let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

    let key = derive_key(password.as_bytes(), salt)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_slice()));

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::security("wrong password or corrupted key material"))?,
    );

    serde_json::from_slice(&plaintext)
        .map_err(|_| Error::security("sealed key material has an unreadable layout"))
}

fn derive_key(password: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    let mut block = Zeroizing::new([0u8; 32]);
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(salt)
        .map_err(|_| Error::security("unusable keystore salt"))?;
    mac.update(password);
    block.copy_from_slice(&mac.finalize().into_bytes());

    for _ in 1..KDF_ROUNDS {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(salt)
            .map_err(|_| Error::security("unusable keystore salt"))?;
        mac.update(&*block);
        block.copy_from_slice(&mac.finalize().into_bytes());
    }
    Ok(block)
}
