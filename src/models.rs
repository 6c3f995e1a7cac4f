// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Protocol value objects: the product descriptor attached to every request,
//! the order-type catalog with its fixed transfer directions, and download
//! date ranges.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifies the client software towards the bank so traffic can be
/// attributed. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// Product name as registered with the bank.
    pub name: String,
    /// ISO 639-1 language code used for bank-side report texts.
    pub language: String,
    /// Optional installation identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl Product {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
            instance_id: None,
        }
    }
}

/// Direction of an order type's file movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferDirection {
    /// Client submits a file to the bank.
    Upload,
    /// Client fetches a file from the bank.
    Download,
}

/// What an order type is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    /// Subscriber key management (enrollment and revocation).
    KeyManagement,
    /// File transfer in a fixed direction.
    Transfer(TransferDirection),
}

macro_rules! order_types {
    (
        key_management: [$($km:ident),* $(,)?],
        download: [$($dl:ident),* $(,)?],
        upload: [$($ul:ident),* $(,)?] $(,)?
    ) => {
        /// Catalog of order types understood by this client. The protocol
        /// code of each entry is its name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[allow(clippy::upper_case_acronyms)]
        pub enum OrderType {
            $($km,)*
            $($dl,)*
            $($ul,)*
        }

        impl OrderType {
            /// Wire code of this order type.
            pub fn code(&self) -> &'static str {
                match self {
                    $(OrderType::$km => stringify!($km),)*
                    $(OrderType::$dl => stringify!($dl),)*
                    $(OrderType::$ul => stringify!($ul),)*
                }
            }

            /// Fixed role of this order type.
            pub fn kind(&self) -> OrderKind {
                match self {
                    $(OrderType::$km => OrderKind::KeyManagement,)*
                    $(OrderType::$dl => OrderKind::Transfer(TransferDirection::Download),)*
                    $(OrderType::$ul => OrderKind::Transfer(TransferDirection::Upload),)*
                }
            }
        }
    };
}

order_types! {
    key_management: [INI, HIA, HPB, SPR],
    download: [STA, VMK, C52, C53, C54, C5N, ZDF, ZB6, PTK, HAC, Z01, CIZ, CRC, CRJ, CRZ, HAA, HTD],
    upload: [XKD, FUL, XCT, XE2, CCT, CIP],
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Order attribute profile for uploads. All submissions use the same
/// profile: order data accompanied by signature data (OZHNN).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderAttribute {
    Ozhnn,
}

impl OrderAttribute {
    pub fn code(&self) -> &'static str {
        match self {
            OrderAttribute::Ozhnn => "OZHNN",
        }
    }
}

/// Inclusive date window for a download request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Resolves optional caller-supplied bounds into a concrete range.
    ///
    /// No bounds means no range. A start without an end runs up to today.
    /// An end without a start is rejected before anything touches the
    /// network.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Option<DateRange>> {
        match (start, end) {
            (None, None) => Ok(None),
            (Some(start), end) => Ok(Some(DateRange {
                start,
                end: end.unwrap_or_else(|| Utc::now().date_naive()),
            })),
            (None, Some(_)) => Err(Error::configuration(
                "start date required when an end date is given",
            )),
        }
    }
}
