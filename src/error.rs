// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy shared by the whole client.
//!
//! Four failure families matter to callers: transport/filesystem trouble
//! ([`Error::Io`]), key material and password trouble ([`Error::Security`]),
//! business-level rejections from the bank ([`Error::Protocol`]), and bad
//! caller input ([`Error::Configuration`]). A missing persisted identity is
//! its own case ([`Error::NotFound`]) so that "never enrolled" is
//! distinguishable from "enrollment is broken".
//!
//! An empty download window is deliberately *not* an error here; see
//! [`crate::protocol::DownloadOutcome`].

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

fn code_suffix(code: &Option<String>) -> String {
    match code {
        Some(c) => format!(" (code {c})"),
        None => String::new(),
    }
}

/// Client error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem or network transport failure.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Key generation, sealing/unsealing, or password failure.
    #[error("security failure: {0}")]
    Security(String),

    /// The bank rejected the request or returned a business fault code.
    #[error("bank rejected request{}: {message}", code_suffix(code))]
    Protocol {
        /// Bank return code, when the fault carried one.
        code: Option<String>,
        message: String,
    },

    /// A requested persisted identity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller supplied invalid or missing parameters.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl Error {
    pub fn security(message: impl Into<String>) -> Self {
        Error::Security(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Error::Protocol {
            code: None,
            message: message.into(),
        }
    }

    pub fn protocol_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Protocol {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }
}

// A record that exists but cannot be decoded is a schema fault, not a
// missing identity.
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::protocol(format!("unreadable persisted record: {e}"))
    }
}
