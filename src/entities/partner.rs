// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Partner (customer) records and the per-partner order sequencer.

use serde::{Deserialize, Serialize};

/// A partner under a bank. Owns the monotonic order-id counter used to tag
/// uploads for bank-side deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    partner_id: String,
    host_id: String,
    order_counter: u32,
    #[serde(skip)]
    dirty: bool,
}

impl Partner {
    pub fn new(host_id: impl Into<String>, partner_id: impl Into<String>) -> Self {
        Self {
            partner_id: partner_id.into(),
            host_id: host_id.into(),
            order_counter: 0,
            dirty: true,
        }
    }

    pub fn partner_id(&self) -> &str {
        &self.partner_id
    }

    /// Host id of the bank this partner belongs to.
    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// The order id the next upload will carry, without advancing.
    pub fn current_order_id(&self) -> u32 {
        self.order_counter
    }

    /// Returns the current order id and advances the counter. The counter
    /// never decreases and is never reused for the lifetime of the record.
    pub fn next_order_id(&mut self) -> u32 {
        let id = self.order_counter;
        self.order_counter += 1;
        self.dirty = true;
        id
    }

    /// Advances the counter by `n` without a protocol exchange, to
    /// resynchronize with a bank-side counter that moved through another
    /// channel.
    pub fn skip_order_ids(&mut self, n: u32) {
        if n == 0 {
            return;
        }
        self.order_counter += n;
        self.dirty = true;
    }

    /// Persistence key convention for partner records.
    pub fn record_key(&self) -> String {
        format!("partner-{}", self.partner_id)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_yields_strictly_increasing_ids_without_gaps() {
        let mut partner = Partner::new("HOST1", "PARTNER1");
        let ids: Vec<u32> = (0..5).map(|_| partner.next_order_id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(partner.current_order_id(), 5);
    }

    #[test]
    fn skip_advances_without_issuing() {
        let mut partner = Partner::new("HOST1", "PARTNER1");
        partner.next_order_id();
        partner.next_order_id();
        let prior = partner.current_order_id();

        partner.skip_order_ids(7);
        assert_eq!(partner.next_order_id(), prior + 7);
    }

    #[test]
    fn skip_zero_does_not_dirty() {
        let mut partner = Partner::new("HOST1", "PARTNER1");
        partner.clear_dirty();
        partner.skip_order_ids(0);
        assert!(!partner.is_dirty());
    }

    #[test]
    fn counter_survives_a_round_trip() {
        let mut partner = Partner::new("HOST1", "PARTNER1");
        partner.skip_order_ids(41);
        partner.next_order_id();

        let json = serde_json::to_string(&partner).unwrap();
        let restored: Partner = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.current_order_id(), 42);
        assert!(!restored.is_dirty());
    }

    #[test]
    fn record_key_uses_partner_prefix() {
        let partner = Partner::new("HOST1", "PARTNER1");
        assert_eq!(partner.record_key(), "partner-PARTNER1");
    }
}
