//! Typed HTTP client for the external payment gateway.
//!
//! Two calls exist: **initiate** (signed POST that returns the hosted payment
//! page URL) and **check status** (signed GET that reports the outcome of an
//! attempt). The client never retries on its own; retry policy belongs to the
//! reconciliation coordinator, which keeps retries safe through idempotent
//! persistence and fresh merchant transaction ids.

pub mod checksum;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// API path for payment initiation.
pub const PAY_PATH: &str = "/pg/v1/pay";

/// Gateway response code that counts as a completed payment. Every other
/// code — including explicit "pending" codes — is *not yet successful*.
pub const SUCCESS_CODE: &str = "PAYMENT_SUCCESS";

/// Explicit gateway credentials and endpoint, constructed once at startup.
///
/// Passing this in (instead of reading ambient process state) is what makes
/// the client testable and allows several merchant configurations to coexist.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host_url: Url,
    pub merchant_id: String,
    pub salt_key: String,
    pub salt_index: u32,
    /// Bound on each gateway round-trip; elapsing it is a transport failure.
    pub timeout: Duration,
}

/// Errors from a single gateway call.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request never completed: connection failure, timeout, or an
    /// undecodable response body.
    #[error("gateway transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// The gateway answered and said no.
    #[error("gateway rejected the request (status {status}): {body}")]
    Rejected { status: u16, body: String },
    /// The gateway answered with a body missing a required field.
    #[error("gateway response missing {0}")]
    Malformed(&'static str),
    #[error("failed to encode gateway payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Parameters for one initiation attempt.
///
/// The merchant transaction id must be fresh per attempt; reusing one across
/// retries risks colliding with an attempt that already landed.
#[derive(Debug, Clone)]
pub struct InitiateRequest {
    pub merchant_transaction_id: String,
    pub merchant_user_id: String,
    pub amount_minor_units: i64,
    /// Where the gateway sends the user's browser after the payment page.
    pub redirect_target: Url,
    pub mobile_number: Option<String>,
}

/// Successful initiation: the hosted payment page to send the user to.
#[derive(Debug, Clone)]
pub struct InitiatedPayment {
    pub redirect_url: String,
}

/// Confirmed payment details from a successful status check.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub gateway_transaction_id: String,
    pub amount_minor_units: i64,
    pub instrument_details: serde_json::Value,
}

/// Outcome of a status check that reached the gateway.
#[derive(Debug, Clone)]
pub enum StatusOutcome {
    /// The gateway reported [`SUCCESS_CODE`].
    Success(PaymentConfirmation),
    /// Any other code. The payment may still complete; callers should treat
    /// this as "check again later", not as a final failure.
    NotYetSuccessful { code: String },
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitiatePayload<'a> {
    merchant_id: &'a str,
    merchant_transaction_id: &'a str,
    merchant_user_id: &'a str,
    amount: i64,
    redirect_url: &'a str,
    redirect_mode: &'a str,
    mobile_number: Option<&'a str>,
    payment_instrument: InstrumentSelector<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InstrumentSelector<'a> {
    r#type: &'a str,
}

#[derive(Debug, Serialize)]
struct PayEnvelope {
    request: String,
}

#[derive(Debug, Deserialize)]
struct PayResponse {
    success: bool,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    data: Option<PayResponseData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayResponseData {
    instrument_response: Option<InstrumentResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstrumentResponse {
    redirect_info: Option<RedirectInfo>,
}

#[derive(Debug, Deserialize)]
struct RedirectInfo {
    url: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    data: Option<StatusData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusData {
    transaction_id: Option<String>,
    amount: Option<i64>,
    #[serde(default)]
    payment_instrument: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the gateway, carrying its [`GatewayConfig`].
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Start a payment: sign and POST the initiation payload, returning the
    /// hosted payment page URL.
    #[tracing::instrument(skip_all, err, fields(merchant_transaction_id = %req.merchant_transaction_id))]
    pub async fn initiate(&self, req: InitiateRequest) -> Result<InitiatedPayment, GatewayError> {
        let payload = InitiatePayload {
            merchant_id: &self.config.merchant_id,
            merchant_transaction_id: &req.merchant_transaction_id,
            merchant_user_id: &req.merchant_user_id,
            amount: req.amount_minor_units,
            redirect_url: req.redirect_target.as_str(),
            redirect_mode: "REDIRECT",
            mobile_number: req.mobile_number.as_deref(),
            payment_instrument: InstrumentSelector { r#type: "PAY_PAGE" },
        };

        // The base64 string below is both the signed data and the wire body.
        let json = serde_json::to_vec(&payload)?;
        let encoded = fast32::base64::RFC4648.encode(&json);
        let header = checksum::sign_payload(
            &encoded,
            PAY_PATH,
            &self.config.salt_key,
            self.config.salt_index,
        );

        let response = self
            .http
            .post(self.endpoint(PAY_PATH))
            .header(checksum::CHECKSUM_HEADER, header)
            .json(&PayEnvelope { request: encoded })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: PayResponse = response.json().await?;
        if !body.success {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body: body.code.unwrap_or_else(|| "unknown gateway code".into()),
            });
        }

        let redirect_url = body
            .data
            .and_then(|d| d.instrument_response)
            .and_then(|i| i.redirect_info)
            .map(|r| r.url)
            .ok_or(GatewayError::Malformed("redirect url"))?;

        Ok(InitiatedPayment { redirect_url })
    }

    /// Ask the gateway for the outcome of a payment attempt.
    ///
    /// Only an explicit [`SUCCESS_CODE`] maps to [`StatusOutcome::Success`].
    #[tracing::instrument(skip_all, err, fields(merchant_transaction_id = %merchant_transaction_id))]
    pub async fn check_status(
        &self,
        merchant_transaction_id: &str,
    ) -> Result<StatusOutcome, GatewayError> {
        let path = format!(
            "/pg/v1/status/{}/{}",
            self.config.merchant_id, merchant_transaction_id
        );
        let header = checksum::sign_path(&path, &self.config.salt_key, self.config.salt_index);

        let response = self
            .http
            .get(self.endpoint(&path))
            .header(checksum::CHECKSUM_HEADER, header)
            .header(checksum::MERCHANT_ID_HEADER, &self.config.merchant_id)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: StatusResponse = response.json().await?;
        let code = body.code.unwrap_or_else(|| "unknown gateway code".into());
        if code != SUCCESS_CODE {
            return Ok(StatusOutcome::NotYetSuccessful { code });
        }

        let data = body.data.ok_or(GatewayError::Malformed("status data"))?;
        Ok(StatusOutcome::Success(PaymentConfirmation {
            gateway_transaction_id: data
                .transaction_id
                .ok_or(GatewayError::Malformed("gateway transaction id"))?,
            amount_minor_units: data.amount.ok_or(GatewayError::Malformed("amount"))?,
            instrument_details: data.payment_instrument,
        }))
    }

    /// Join an API path onto the configured host, tolerating hosts that
    /// carry a path prefix of their own.
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.config.host_url.as_str().trim_end_matches('/'),
            path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig {
            host_url: Url::parse("https://gateway.example.com/apis/hermes").unwrap(),
            merchant_id: "M1".into(),
            salt_key: "salt".into(),
            salt_index: 1,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn endpoint_keeps_host_path_prefix() {
        let client = GatewayClient::new(config()).unwrap();
        assert_eq!(
            client.endpoint(PAY_PATH),
            "https://gateway.example.com/apis/hermes/pg/v1/pay"
        );
    }

    #[test]
    fn initiate_payload_uses_gateway_field_names() {
        let payload = InitiatePayload {
            merchant_id: "M1",
            merchant_transaction_id: "T1",
            merchant_user_id: "U1",
            amount: 49900,
            redirect_url: "https://shop.example.com/payment/validate/T1",
            redirect_mode: "REDIRECT",
            mobile_number: None,
            payment_instrument: InstrumentSelector { r#type: "PAY_PAGE" },
        };
        let json: serde_json::Value =
            serde_json::from_slice(&serde_json::to_vec(&payload).unwrap()).unwrap();
        assert_eq!(json["merchantTransactionId"], "T1");
        assert_eq!(json["amount"], 49900);
        assert_eq!(json["paymentInstrument"]["type"], "PAY_PAGE");
        assert_eq!(json["redirectMode"], "REDIRECT");
    }
}
