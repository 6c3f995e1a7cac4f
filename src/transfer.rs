// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Order file transfer.
//!
//! Uploads carry a per-partner order id: either an explicit one supplied by
//! the caller (used for this call only) or the partner's next counter
//! value, which is committed only once the bank confirmed acceptance. A
//! failed upload therefore never burns an id.
//!
//! Downloads take an optional inclusive date window. An empty window is a
//! benign outcome ([`DownloadOutcome::NoData`]) and deliberately bypasses
//! error logging on its way to the caller.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{error, info};

use crate::client::EbicsClient;
use crate::error::{Error, Result};
use crate::models::{DateRange, OrderAttribute, OrderKind, OrderType, TransferDirection};
use crate::protocol::DownloadOutcome;

/// Fixed file-format parameter sent with every download request.
const DOWNLOAD_FORMAT: &str = "pain.xxx.cfonb160.dct";

impl EbicsClient {
    /// Uploads an order file. Returns the order id the submission carried.
    ///
    /// Without an explicit id the partner's sequencer assigns one, and
    /// advances only on confirmed acceptance. An explicit id overrides the
    /// sequencer for this call and leaves it untouched.
    pub fn upload(
        &mut self,
        user_id: &str,
        payload: &[u8],
        order_type: OrderType,
        order_id: Option<u32>,
    ) -> Result<u32> {
        if order_type.kind() != OrderKind::Transfer(TransferDirection::Upload) {
            return Err(Error::configuration(format!(
                "order type {order_type} cannot be uploaded"
            )));
        }

        info!(user_id = %user_id, order_type = %order_type, "uploading order file");

        let assigned = match order_id {
            Some(explicit) => explicit,
            None => {
                let (_user, partner, _bank) = self.registry().chain(user_id)?;
                partner.current_order_id()
            }
        };

        let outcome = {
            let session = self.session(user_id)?;
            self.begin_trace(user_id)?;
            self.transfer
                .upload(&session, payload, order_type, OrderAttribute::Ozhnn, assigned)
        };

        match outcome {
            Ok(()) => {
                if order_id.is_none() {
                    self.registry_mut().partner_of_user_mut(user_id)?.next_order_id();
                }
                info!(user_id = %user_id, order_type = %order_type, order_id = assigned, "order file uploaded");
                Ok(assigned)
            }
            Err(e) => {
                error!(user_id = %user_id, order_type = %order_type, error = %e, "upload failed");
                Err(e)
            }
        }
    }

    /// Downloads an order file, optionally restricted to a date window.
    ///
    /// A missing end date defaults to today; an end date without a start is
    /// rejected before any network interaction. The `test` flag asks the
    /// bank for test data.
    pub fn download(
        &mut self,
        user_id: &str,
        order_type: OrderType,
        test: bool,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<DownloadOutcome> {
        if order_type.kind() != OrderKind::Transfer(TransferDirection::Download) {
            return Err(Error::configuration(format!(
                "order type {order_type} cannot be downloaded"
            )));
        }
        let range = DateRange::resolve(start, end)?;

        info!(user_id = %user_id, order_type = %order_type, "downloading order file");

        let outcome = {
            let mut session = self.session(user_id)?;
            session.add_param("FORMAT", DOWNLOAD_FORMAT);
            if test {
                session.add_param("TEST", "true");
            }
            self.begin_trace(user_id)?;
            self.transfer.download(&session, order_type, range.as_ref())
        };

        match outcome {
            Ok(DownloadOutcome::Data(data)) => {
                info!(
                    user_id = %user_id,
                    order_type = %order_type,
                    bytes = data.len(),
                    "order file downloaded"
                );
                Ok(DownloadOutcome::Data(data))
            }
            // An empty window is an expected answer; hand it to the caller
            // without an error log.
            Ok(DownloadOutcome::NoData) => Ok(DownloadOutcome::NoData),
            Err(e) => {
                error!(user_id = %user_id, order_type = %order_type, error = %e, "download failed");
                Err(e)
            }
        }
    }

    /// Downloads into a named output file. The output must not exist yet;
    /// on any non-data outcome no file is left behind.
    pub fn download_to_file(
        &mut self,
        user_id: &str,
        order_type: OrderType,
        test: bool,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        output: &Path,
    ) -> Result<DownloadOutcome> {
        if output.exists() {
            return Err(Error::configuration(format!(
                "output file already exists: {}",
                output.display()
            )));
        }

        match self.download(user_id, order_type, test, start, end)? {
            DownloadOutcome::Data(data) => {
                if let Err(e) = fs::write(output, &data) {
                    // Never leave a truncated file behind.
                    let _ = fs::remove_file(output);
                    error!(output = %output.display(), error = %e, "writing download output failed");
                    return Err(e.into());
                }
                Ok(DownloadOutcome::Data(data))
            }
            DownloadOutcome::NoData => Ok(DownloadOutcome::NoData),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{
        enrolled_client, DownloadBehavior, MockKeyExchange, MockTransferChannel,
    };
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn upload_advances_the_sequencer_only_on_success() {
        let channel = MockTransferChannel::default();
        let uploads = channel.uploads.clone();
        let (_temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);

        let id = client
            .upload("USER1", &[0u8; 10], OrderType::FUL, None)
            .unwrap();
        assert_eq!(id, 0);
        assert_eq!(
            client.registry().partner("PARTNER1").unwrap().current_order_id(),
            1
        );

        let recorded = uploads.borrow();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].order_id, 0);
        assert_eq!(recorded[0].payload_len, 10);
        assert_eq!(recorded[0].attribute, OrderAttribute::Ozhnn);
    }

    #[test]
    fn failed_upload_burns_no_order_id() {
        let channel = MockTransferChannel {
            fail_uploads: true,
            ..MockTransferChannel::default()
        };
        let (_temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);

        let err = client
            .upload("USER1", b"payload", OrderType::FUL, None)
            .unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
        assert_eq!(
            client.registry().partner("PARTNER1").unwrap().current_order_id(),
            0
        );
    }

    #[test]
    fn explicit_order_id_overrides_without_advancing() {
        let channel = MockTransferChannel::default();
        let uploads = channel.uploads.clone();
        let (_temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);

        let id = client
            .upload("USER1", b"payload", OrderType::XCT, Some(99))
            .unwrap();
        assert_eq!(id, 99);
        assert_eq!(uploads.borrow()[0].order_id, 99);
        assert_eq!(
            client.registry().partner("PARTNER1").unwrap().current_order_id(),
            0
        );
    }

    #[test]
    fn uploading_a_download_type_is_rejected_before_any_exchange() {
        let channel = MockTransferChannel::default();
        let uploads = channel.uploads.clone();
        let (_temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);

        let err = client
            .upload("USER1", b"x", OrderType::STA, None)
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(uploads.borrow().is_empty());
    }

    #[test]
    fn download_end_without_start_fails_before_any_exchange() {
        let channel = MockTransferChannel::default();
        let downloads = channel.downloads.clone();
        let (_temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);

        let err = client
            .download("USER1", OrderType::STA, false, None, Some(date(2024, 6, 30)))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(downloads.borrow().is_empty());
    }

    #[test]
    fn download_start_without_end_runs_up_to_today() {
        let channel = MockTransferChannel::default();
        let downloads = channel.downloads.clone();
        let (_temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);

        client
            .download("USER1", OrderType::STA, false, Some(date(2024, 1, 1)), None)
            .unwrap();

        let recorded = downloads.borrow();
        let range = recorded[0].range.unwrap();
        assert_eq!(range.start, date(2024, 1, 1));
        assert_eq!(range.end, Utc::now().date_naive());
    }

    #[test]
    fn download_sets_format_and_test_parameters() {
        let channel = MockTransferChannel::default();
        let downloads = channel.downloads.clone();
        let (_temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);

        client
            .download("USER1", OrderType::C53, true, None, None)
            .unwrap();

        let recorded = downloads.borrow();
        assert_eq!(recorded[0].format.as_deref(), Some("pain.xxx.cfonb160.dct"));
        assert_eq!(recorded[0].test.as_deref(), Some("true"));
        assert_eq!(recorded[0].range, None);
    }

    #[test]
    fn download_without_test_flag_omits_the_parameter() {
        let channel = MockTransferChannel::default();
        let downloads = channel.downloads.clone();
        let (_temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);

        client
            .download("USER1", OrderType::STA, false, None, None)
            .unwrap();
        assert_eq!(downloads.borrow()[0].test, None);
    }

    #[test]
    fn empty_window_reaches_the_caller_as_no_data() {
        let channel = MockTransferChannel {
            download_behavior: DownloadBehavior::NoData,
            ..MockTransferChannel::default()
        };
        let (_temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);

        let outcome = client
            .download("USER1", OrderType::STA, false, Some(date(2024, 1, 1)), None)
            .unwrap();
        assert_eq!(outcome, DownloadOutcome::NoData);
    }

    #[test]
    fn downloading_an_upload_type_is_rejected() {
        let channel = MockTransferChannel::default();
        let (_temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);

        let err = client
            .download("USER1", OrderType::FUL, false, None, None)
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn download_to_file_writes_the_payload() {
        let channel = MockTransferChannel::default();
        let (temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);
        let output = temp.path().join("statements.mt940");

        let outcome = client
            .download_to_file("USER1", OrderType::STA, false, None, None, &output)
            .unwrap();
        assert!(matches!(outcome, DownloadOutcome::Data(_)));
        assert_eq!(fs::read(&output).unwrap(), b"statement data");
    }

    #[test]
    fn download_to_file_leaves_nothing_behind_on_no_data() {
        let channel = MockTransferChannel {
            download_behavior: DownloadBehavior::NoData,
            ..MockTransferChannel::default()
        };
        let (temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);
        let output = temp.path().join("statements.mt940");

        let outcome = client
            .download_to_file("USER1", OrderType::STA, false, None, None, &output)
            .unwrap();
        assert_eq!(outcome, DownloadOutcome::NoData);
        assert!(!output.exists());
    }

    #[test]
    fn download_to_file_leaves_nothing_behind_on_failure() {
        let channel = MockTransferChannel {
            download_behavior: DownloadBehavior::Fail,
            ..MockTransferChannel::default()
        };
        let (temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);
        let output = temp.path().join("statements.mt940");

        let err = client
            .download_to_file("USER1", OrderType::STA, false, None, None, &output)
            .unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn download_to_file_refuses_an_existing_output() {
        let channel = MockTransferChannel::default();
        let downloads = channel.downloads.clone();
        let (temp, mut client) = enrolled_client(MockKeyExchange::default(), channel);
        let output = temp.path().join("statements.mt940");
        fs::write(&output, b"precious").unwrap();

        let err = client
            .download_to_file("USER1", OrderType::STA, false, None, None, &output)
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(downloads.borrow().is_empty());
        assert_eq!(fs::read(&output).unwrap(), b"precious");
    }
}
