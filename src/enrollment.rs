// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Subscriber key enrollment.
//!
//! Enrollment is a three-phase handshake: the subscriber submits the
//! signature key (INI), then the encryption and authentication keys (HIA),
//! and finally retrieves the bank's own keys (HPB). The two submission
//! phases are idempotent: once the corresponding flag is set, repeating the
//! call performs no exchange. Bank-key retrieval always executes so it can
//! refresh keys at any time; a premature call is rejected by the bank
//! itself, not locally.
//!
//! Each operation selects the user's trace directory before the exchange so
//! a failed handshake leaves its raw artifacts behind for diagnosis.

use tracing::{error, info};

use crate::client::EbicsClient;
use crate::error::Result;

impl EbicsClient {
    /// Submits the subscriber's public signature key (INI). A no-op when
    /// the bank has already accepted it.
    pub fn send_ini(&mut self, user_id: &str) -> Result<()> {
        info!(user_id = %user_id, "sending INI request");
        if self.registry().user(user_id)?.is_initialized() {
            info!(user_id = %user_id, "user already initialized, INI skipped");
            return Ok(());
        }

        let outcome = {
            let session = self.session(user_id)?;
            self.begin_trace(user_id)?;
            self.key_exchange.submit_signature_key(&session)
        };

        match outcome {
            Ok(()) => {
                self.registry_mut().user_mut(user_id)?.set_initialized();
                info!(user_id = %user_id, "INI request sent");
                Ok(())
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "INI request failed");
                Err(e)
            }
        }
    }

    /// Submits the subscriber's public encryption and authentication keys
    /// (HIA). A no-op when the bank has already accepted them.
    pub fn send_hia(&mut self, user_id: &str) -> Result<()> {
        info!(user_id = %user_id, "sending HIA request");
        if self.registry().user(user_id)?.is_initialized_hia() {
            info!(user_id = %user_id, "user already HIA-initialized, HIA skipped");
            return Ok(());
        }

        let outcome = {
            let session = self.session(user_id)?;
            self.begin_trace(user_id)?;
            self.key_exchange.submit_encryption_keys(&session)
        };

        match outcome {
            Ok(()) => {
                self.registry_mut().user_mut(user_id)?.set_initialized_hia();
                info!(user_id = %user_id, "HIA request sent");
                Ok(())
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "HIA request failed");
                Err(e)
            }
        }
    }

    /// Retrieves the bank's public keys (HPB) and stores them in the bank
    /// record. Always executes, also to refresh previously fetched keys.
    pub fn send_hpb(&mut self, user_id: &str) -> Result<()> {
        info!(user_id = %user_id, "sending HPB request");

        let outcome = {
            let session = self.session(user_id)?;
            self.begin_trace(user_id)?;
            self.key_exchange.retrieve_bank_keys(&session)
        };

        match outcome {
            Ok(keys) => {
                self.registry_mut().bank_of_user_mut(user_id)?.set_keys(keys);
                info!(user_id = %user_id, "bank keys retrieved");
                Ok(())
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "HPB request failed");
                Err(e)
            }
        }
    }

    /// Sends the subscriber lock order (SPR). The bank revokes the
    /// subscriber server-side; no local flag changes, since the revocation
    /// is authoritative there.
    pub fn revoke_subscriber(&mut self, user_id: &str) -> Result<()> {
        info!(user_id = %user_id, "sending SPR request");

        let outcome = {
            let session = self.session(user_id)?;
            self.begin_trace(user_id)?;
            self.key_exchange.lock_subscriber(&session)
        };

        match outcome {
            Ok(()) => {
                info!(user_id = %user_id, "subscriber lock sent");
                Ok(())
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "SPR request failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::client::testing::{enrolled_client, MockKeyExchange, MockTransferChannel};
    use crate::error::Error;

    #[test]
    fn enrollment_walks_through_all_three_phases() {
        let kx = MockKeyExchange::default();
        let calls = kx.calls.clone();
        let (_temp, mut client) = enrolled_client(kx, MockTransferChannel::default());

        {
            let user = client.registry().user("USER1").unwrap();
            assert!(!user.is_initialized());
            assert!(!user.is_initialized_hia());
        }

        client.send_ini("USER1").unwrap();
        assert!(client.registry().user("USER1").unwrap().is_initialized());

        client.send_hia("USER1").unwrap();
        assert!(client.registry().user("USER1").unwrap().is_initialized_hia());

        client.send_hpb("USER1").unwrap();
        let bank = client.registry().bank("HOST1").unwrap();
        assert!(bank.keys().is_some());
        assert!(bank.is_dirty());

        assert_eq!(*calls.borrow(), vec!["INI", "HIA", "HPB"]);
    }

    #[test]
    fn repeated_ini_performs_exactly_one_exchange() {
        let kx = MockKeyExchange::default();
        let calls = kx.calls.clone();
        let (_temp, mut client) = enrolled_client(kx, MockTransferChannel::default());

        client.send_ini("USER1").unwrap();
        client.send_ini("USER1").unwrap();

        assert_eq!(calls.borrow().iter().filter(|c| **c == "INI").count(), 1);
        assert!(client.registry().user("USER1").unwrap().is_initialized());
    }

    #[test]
    fn repeated_hia_performs_exactly_one_exchange() {
        let kx = MockKeyExchange::default();
        let calls = kx.calls.clone();
        let (_temp, mut client) = enrolled_client(kx, MockTransferChannel::default());

        client.send_hia("USER1").unwrap();
        client.send_hia("USER1").unwrap();

        assert_eq!(calls.borrow().iter().filter(|c| **c == "HIA").count(), 1);
    }

    #[test]
    fn failed_ini_leaves_the_flag_unset() {
        let kx = MockKeyExchange {
            fail: true,
            ..MockKeyExchange::default()
        };
        let (_temp, mut client) = enrolled_client(kx, MockTransferChannel::default());

        let err = client.send_ini("USER1").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
        assert!(!client.registry().user("USER1").unwrap().is_initialized());
    }

    #[test]
    fn hpb_is_repeatable() {
        let kx = MockKeyExchange::default();
        let calls = kx.calls.clone();
        let (_temp, mut client) = enrolled_client(kx, MockTransferChannel::default());

        client.send_hpb("USER1").unwrap();
        client.send_hpb("USER1").unwrap();
        assert_eq!(calls.borrow().iter().filter(|c| **c == "HPB").count(), 2);
    }

    #[test]
    fn failed_hpb_does_not_touch_the_bank_record() {
        let kx = MockKeyExchange {
            fail: true,
            ..MockKeyExchange::default()
        };
        let (_temp, mut client) = enrolled_client(kx, MockTransferChannel::default());

        // Persist the freshly enrolled state so the only dirt would come
        // from a (wrongly) stored key set.
        client.save_dirty();
        assert!(client.send_hpb("USER1").is_err());
        let bank = client.registry().bank("HOST1").unwrap();
        assert!(bank.keys().is_none());
        assert!(!bank.is_dirty());
    }

    #[test]
    fn revocation_changes_no_local_flags() {
        let kx = MockKeyExchange::default();
        let calls = kx.calls.clone();
        let (_temp, mut client) = enrolled_client(kx, MockTransferChannel::default());

        client.send_ini("USER1").unwrap();
        client.revoke_subscriber("USER1").unwrap();

        let user = client.registry().user("USER1").unwrap();
        assert!(user.is_initialized());
        assert!(!user.is_initialized_hia());
        assert!(calls.borrow().contains(&"SPR"));
    }

    #[test]
    fn operations_on_unknown_users_fail_without_an_exchange() {
        let kx = MockKeyExchange::default();
        let calls = kx.calls.clone();
        let (_temp, mut client) = enrolled_client(kx, MockTransferChannel::default());

        assert!(matches!(client.send_ini("GHOST"), Err(Error::NotFound(_))));
        assert!(calls.borrow().is_empty());
    }
}
