// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP transport against an EBICS JSON gateway.
//!
//! [`GatewayTransport`] implements both collaborator contracts over a
//! middleware gateway that fronts the bank host: every exchange is a single
//! blocking POST to the configured endpoint carrying the session actors,
//! the order metadata, and (for uploads) the base64 payload. The gateway
//! answers with an EBICS return code, `000000` meaning accepted and
//! `090005` flagging an empty download window.
//!
//! Raw request and response bodies are recorded through the trace manager
//! so failed exchanges can be reconstructed. Transport-level trouble maps
//! to [`Error::Io`]; any non-zero return code becomes [`Error::Protocol`]
//! carrying the bank's code and report text.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::entities::BankKeys;
use crate::error::{Error, Result};
use crate::models::{DateRange, OrderAttribute, OrderType, Product};
use crate::protocol::{DownloadOutcome, KeyExchange, TransferChannel};
use crate::session::SessionContext;
use crate::storage::TraceManager;

const EBICS_OK: &str = "000000";
const EBICS_NO_DOWNLOAD_DATA: &str = "090005";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct SubmittedKeys {
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encryption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authentication: Option<String>,
}

#[derive(Debug, Serialize)]
struct GatewayRequest<'a> {
    host_id: &'a str,
    partner_id: &'a str,
    user_id: &'a str,
    product: &'a Product,
    order_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_attribute: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_id: Option<u32>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keys: Option<SubmittedKeys>,
}

#[derive(Debug, Deserialize)]
struct ReturnedBankKeys {
    signature: String,
    encryption: String,
    authentication: String,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    return_code: String,
    #[serde(default)]
    report_text: String,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    bank_keys: Option<ReturnedBankKeys>,
}

/// Blocking HTTP adapter for a JSON EBICS gateway.
pub struct GatewayTransport {
    endpoint: Url,
    http: reqwest::blocking::Client,
    traces: Rc<TraceManager>,
}

impl GatewayTransport {
    pub fn new(endpoint: Url, traces: Rc<TraceManager>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| Error::configuration(format!("cannot build http client: {e}")))?;
        Ok(Self {
            endpoint,
            http,
            traces,
        })
    }

    fn request<'a>(&self, session: &'a SessionContext<'_>, order_type: OrderType) -> GatewayRequest<'a> {
        GatewayRequest {
            host_id: session.bank().host_id(),
            partner_id: session.user().partner_id(),
            user_id: session.user().user_id(),
            product: session.product(),
            order_type: order_type.code(),
            order_attribute: None,
            order_id: None,
            params: session.params().clone(),
            start: None,
            end: None,
            payload: None,
            keys: None,
        }
    }

    fn exchange(&self, request: &GatewayRequest<'_>) -> Result<GatewayResponse> {
        let body = serde_json::to_vec(request)?;
        self.trace(&format!("{}.request", request.order_type), &body);

        let response = self
            .http
            .post(self.endpoint.clone())
            .header("content-type", "application/json")
            .body(body)
            .send()
            .map_err(http_error)?;
        let status = response.status();
        let bytes = response.bytes().map_err(http_error)?;
        self.trace(&format!("{}.response", request.order_type), &bytes);

        if !status.is_success() {
            return Err(Error::protocol(format!("gateway answered HTTP {status}")));
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::protocol(format!("malformed gateway response: {e}")))
    }

    fn trace(&self, label: &str, payload: &[u8]) {
        if let Err(e) = self.traces.record(label, payload) {
            warn!(label = %label, error = %e, "failed to record trace artifact");
        }
    }

    fn user_keys<'a>(session: &'a SessionContext<'_>) -> Result<&'a crate::keystore::UserKeys> {
        session
            .user()
            .keys()
            .ok_or_else(|| Error::security("user key material is not loaded"))
    }
}

fn http_error(e: reqwest::Error) -> Error {
    Error::Io(std::io::Error::other(e))
}

fn accepted(response: GatewayResponse) -> Result<GatewayResponse> {
    if response.return_code == EBICS_OK {
        Ok(response)
    } else {
        Err(Error::protocol_code(response.return_code, response.report_text))
    }
}

fn decode_field(value: &str, what: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|_| Error::protocol(format!("gateway returned undecodable {what}")))
}

fn classify_download(response: GatewayResponse) -> Result<DownloadOutcome> {
    match response.return_code.as_str() {
        EBICS_OK => {
            let data = response
                .data
                .ok_or_else(|| Error::protocol("gateway response carries no order data"))?;
            Ok(DownloadOutcome::Data(decode_field(&data, "order data")?))
        }
        EBICS_NO_DOWNLOAD_DATA => Ok(DownloadOutcome::NoData),
        code => Err(Error::protocol_code(code, response.report_text)),
    }
}

impl KeyExchange for GatewayTransport {
    fn submit_signature_key(&self, session: &SessionContext<'_>) -> Result<()> {
        let keys = Self::user_keys(session)?;
        let mut request = self.request(session, OrderType::INI);
        request.keys = Some(SubmittedKeys {
            signature: Some(BASE64.encode(&keys.signature.public)),
            encryption: None,
            authentication: None,
        });
        accepted(self.exchange(&request)?).map(|_| ())
    }

    fn submit_encryption_keys(&self, session: &SessionContext<'_>) -> Result<()> {
        let keys = Self::user_keys(session)?;
        let mut request = self.request(session, OrderType::HIA);
        request.keys = Some(SubmittedKeys {
            signature: None,
            encryption: Some(BASE64.encode(&keys.encryption.public)),
            authentication: Some(BASE64.encode(&keys.authentication.public)),
        });
        accepted(self.exchange(&request)?).map(|_| ())
    }

    fn retrieve_bank_keys(&self, session: &SessionContext<'_>) -> Result<BankKeys> {
        let request = self.request(session, OrderType::HPB);
        let response = accepted(self.exchange(&request)?)?;
        let returned = response
            .bank_keys
            .ok_or_else(|| Error::protocol("gateway response carries no bank keys"))?;
        Ok(BankKeys {
            signature: decode_field(&returned.signature, "bank signature key")?,
            encryption: decode_field(&returned.encryption, "bank encryption key")?,
            authentication: decode_field(&returned.authentication, "bank authentication key")?,
        })
    }

    fn lock_subscriber(&self, session: &SessionContext<'_>) -> Result<()> {
        let request = self.request(session, OrderType::SPR);
        accepted(self.exchange(&request)?).map(|_| ())
    }
}

impl TransferChannel for GatewayTransport {
    fn upload(
        &self,
        session: &SessionContext<'_>,
        payload: &[u8],
        order_type: OrderType,
        attribute: OrderAttribute,
        order_id: u32,
    ) -> Result<()> {
        let mut request = self.request(session, order_type);
        request.order_attribute = Some(attribute.code());
        request.order_id = Some(order_id);
        request.payload = Some(BASE64.encode(payload));
        accepted(self.exchange(&request)?).map(|_| ())
    }

    fn download(
        &self,
        session: &SessionContext<'_>,
        order_type: OrderType,
        range: Option<&DateRange>,
    ) -> Result<DownloadOutcome> {
        let mut request = self.request(session, order_type);
        if let Some(range) = range {
            request.start = Some(range.start.to_string());
            request.end = Some(range.end.to_string());
        }
        classify_download(self.exchange(&request)?)
    }
}
