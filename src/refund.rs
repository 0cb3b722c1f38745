//! Refund client for the Y-Note partner settlement API.
//!
//! Refunds are merchant-to-customer reversals routed through Y-Note
//! rather than the Orange Money API itself. The partner enqueues the
//! request (the response is queue-shaped) and exposes a status endpoint
//! keyed by the returned message id.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::auth::{fetch_access_token, AccessToken};
use crate::cash_in::CashInResponse;
use crate::error::{Error, Result, Violation};
use crate::logger::{DebugLogger, TracingLogger};
use crate::status::TransactionStatus;
use crate::transport::{HttpTransport, Transport};
use crate::validation::{
    check_amount, check_notification_url, check_required, check_ynote_merchant_number, env_flag,
    require_env, ZeroAmountPolicy,
};

const YNOTE_API_HOST: &str = "https://omapi.ynote.africa";
const YNOTE_TOKEN_HOST: &str = "https://omapi-token.ynote.africa/oauth2";

/// `RefundStep` value while the transfer is being prepared.
pub const REFUND_STEP_INITIALIZING: &str = "1";
/// `RefundStep` value once the transfer has been handed to the operator.
pub const REFUND_STEP_TRANSFER_SENT: &str = "2";

/// Configuration for [`YNoteRefund`].
///
/// All string fields are required and `channel_user_msisdn` must be a
/// merchant number accepted by Y-Note; construction fails with a
/// [`Error::Validation`] listing every offending field.
#[derive(Clone)]
pub struct YNoteRefundConfig {
    /// OAuth2 client id for the Y-Note token host.
    pub client_id: String,
    pub client_secret: String,
    /// Orange Money customer key, forwarded in the refund body.
    pub customer_key: String,
    pub customer_secret: String,
    /// Merchant MSISDN debited by refunds.
    pub channel_user_msisdn: String,
    pub pin: String,
    /// Selects the `prod` path segment; defaults to `dev`.
    pub is_prod: bool,
    pub zero_amount: ZeroAmountPolicy,
    /// Overrides the fixed API host. Intended for tests.
    pub api_host: Option<String>,
    /// Overrides the fixed token host. Intended for tests.
    pub token_host: Option<String>,
    pub logger: Arc<dyn DebugLogger>,
}

impl Default for YNoteRefundConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            customer_key: String::new(),
            customer_secret: String::new(),
            channel_user_msisdn: String::new(),
            pin: String::new(),
            is_prod: false,
            zero_amount: ZeroAmountPolicy::default(),
            api_host: None,
            token_host: None,
            logger: Arc::new(TracingLogger),
        }
    }
}

impl fmt::Debug for YNoteRefundConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YNoteRefundConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("customer_key", &self.customer_key)
            .field("customer_secret", &"<redacted>")
            .field("channel_user_msisdn", &self.channel_user_msisdn)
            .field("pin", &"<redacted>")
            .field("is_prod", &self.is_prod)
            .field("zero_amount", &self.zero_amount)
            .finish()
    }
}

impl YNoteRefundConfig {
    /// Reads the config from process environment variables:
    /// `YNOTE_CLIENT_ID`, `YNOTE_CLIENT_SECRET`, `YNOTE_CUSTOMER_KEY`,
    /// `YNOTE_CUSTOMER_SECRET`, `YNOTE_CHANNEL_USER_MSISDN`, `YNOTE_PIN`,
    /// and optionally `YNOTE_IS_PROD` (`"true"`/`"1"`).
    pub fn from_env() -> Result<Self> {
        let mut violations = Vec::new();
        let config = Self {
            client_id: require_env(&mut violations, "YNOTE_CLIENT_ID"),
            client_secret: require_env(&mut violations, "YNOTE_CLIENT_SECRET"),
            customer_key: require_env(&mut violations, "YNOTE_CUSTOMER_KEY"),
            customer_secret: require_env(&mut violations, "YNOTE_CUSTOMER_SECRET"),
            channel_user_msisdn: require_env(&mut violations, "YNOTE_CHANNEL_USER_MSISDN"),
            pin: require_env(&mut violations, "YNOTE_PIN"),
            is_prod: env_flag("YNOTE_IS_PROD"),
            ..Self::default()
        };
        if !violations.is_empty() {
            return Err(Error::validation(violations));
        }
        Ok(config)
    }

    fn check(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        check_required(&mut violations, "client_id", &self.client_id);
        check_required(&mut violations, "client_secret", &self.client_secret);
        check_required(&mut violations, "customer_key", &self.customer_key);
        check_required(&mut violations, "customer_secret", &self.customer_secret);
        check_required(&mut violations, "pin", &self.pin);
        check_ynote_merchant_number(
            &mut violations,
            "channel_user_msisdn",
            &self.channel_user_msisdn,
        );
        violations
    }
}

/// Parameters of a single refund request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundParams {
    /// Webhook Y-Note notifies as the refund progresses.
    pub notification_url: String,
    /// Amount in XAF.
    pub amount: u32,
    /// Merchant-side identifier for reconciliation.
    pub reference_id: String,
    /// Name of the customer receiving the refund.
    pub customer_name: String,
    /// MSISDN credited by the refund.
    pub customer_phone: String,
}

impl RefundParams {
    fn check(&self, policy: ZeroAmountPolicy) -> Vec<Violation> {
        let mut violations = Vec::new();
        check_notification_url(&mut violations, "notification_url", &self.notification_url);
        check_amount(&mut violations, "amount", self.amount, policy);
        check_required(&mut violations, "reference_id", &self.reference_id);
        check_required(&mut violations, "customer_name", &self.customer_name);
        check_ynote_merchant_number(&mut violations, "customer_phone", &self.customer_phone);
        violations
    }
}

/// Raw body of the refund endpoint. Y-Note fronts a message queue, so the
/// shape is the queue's send-message receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundResponse {
    #[serde(rename = "MD5OfMessageBody", default)]
    pub md5_of_message_body: Option<String>,
    #[serde(rename = "MessageId")]
    pub message_id: String,
    #[serde(rename = "ResponseMetadata", default)]
    pub response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    #[serde(rename = "RequestId", default)]
    pub request_id: Option<String>,
    #[serde(rename = "HTTPStatusCode", default)]
    pub http_status_code: Option<u16>,
    #[serde(rename = "RetryAttempts", default)]
    pub retry_attempts: Option<u32>,
}

/// Raw body of the refund-status endpoint.
///
/// The `parameters` echo the refund request; credential fields the
/// partner sends back are deliberately not modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundStatusResponse {
    pub result: CashInResponse,
    #[serde(rename = "CreateAt", default)]
    pub create_at: Option<String>,
    #[serde(rename = "MessageId", default)]
    pub message_id: Option<String>,
    #[serde(rename = "RefundStep", default)]
    pub refund_step: String,
    #[serde(default)]
    pub parameters: Option<RefundStatusParameters>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundStatusParameters {
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub channel_user_msisdn: Option<String>,
    #[serde(default)]
    pub final_customer_name: Option<String>,
    #[serde(default)]
    pub final_customer_phone: Option<String>,
}

/// Outcome of a refund initiation.
#[derive(Debug, Clone)]
pub struct RefundResult {
    /// Queue message id; keep it to poll the refund status.
    pub message_id: String,
    pub raw: RefundResponse,
}

/// Outcome of a refund status poll.
#[derive(Debug, Clone)]
pub struct RefundStatusResult {
    pub status: TransactionStatus,
    /// Provider-specific progress marker, surfaced verbatim. See
    /// [`REFUND_STEP_INITIALIZING`] and [`REFUND_STEP_TRANSFER_SENT`].
    pub refund_step: String,
    pub raw: RefundStatusResponse,
}

/// Client for the Y-Note refund API.
///
/// Immutable once constructed; safe to share across concurrent callers.
pub struct YNoteRefund {
    config: YNoteRefundConfig,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for YNoteRefund {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YNoteRefund").finish_non_exhaustive()
    }
}

impl YNoteRefund {
    /// Builds a client over the default HTTP transport.
    pub fn new(config: YNoteRefundConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(HttpTransport::default()))
    }

    /// Builds a client over a caller-supplied transport.
    pub fn with_transport(
        config: YNoteRefundConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let violations = config.check();
        if !violations.is_empty() {
            return Err(Error::validation(violations));
        }
        Ok(Self { config, transport })
    }

    /// Path segment selecting the partner environment. Pure lookup, no
    /// I/O.
    pub fn api_env(&self) -> &'static str {
        if self.config.is_prod {
            "prod"
        } else {
            "dev"
        }
    }

    fn api_host(&self) -> &str {
        self.config.api_host.as_deref().unwrap_or(YNOTE_API_HOST)
    }

    fn token_host(&self) -> &str {
        self.config
            .token_host
            .as_deref()
            .unwrap_or(YNOTE_TOKEN_HOST)
    }

    async fn access_token(&self) -> Result<AccessToken> {
        fetch_access_token(
            self.transport.as_ref(),
            &self.config.client_id,
            &self.config.client_secret,
            self.token_host(),
        )
        .await
    }

    /// Enqueues a refund with Y-Note: validates `params`, fetches a fresh
    /// token from the partner token host, then posts the refund.
    ///
    /// On validation failure every violated field is reported and no
    /// network call is made.
    pub async fn request_refund(&self, params: RefundParams) -> Result<RefundResult> {
        let violations = params.check(self.config.zero_amount);
        if !violations.is_empty() {
            return Err(Error::validation(violations));
        }

        let token = self.access_token().await?;

        let endpoint = format!("{}/{}/refund", self.api_host(), self.api_env());
        let body = json!({
            "pin": self.config.pin,
            "customerkey": self.config.customer_key,
            "customersecret": self.config.customer_secret,
            "channelUserMsisdn": self.config.channel_user_msisdn,
            "amount": params.amount.to_string(),
            "webhook": params.notification_url,
            "final_customer_phone": params.customer_phone,
            "final_customer_name": params.customer_name,
            "refund_method": "OrangeMoney",
        });

        info!(
            reference_id = %params.reference_id,
            amount = params.amount,
            "requesting refund"
        );
        self.config.logger.debug(
            "refund.request_refund",
            &json!({ "endpoint": endpoint, "referenceId": params.reference_id }),
        );

        let response = self
            .transport
            .post(
                &endpoint,
                body.to_string().into_bytes(),
                &self.bearer_headers(&token, true),
            )
            .await?;

        if !response.is_success() {
            error!(status = response.status, "refund request rejected");
            return Err(Error::backend(
                "refund request",
                endpoint,
                response.status,
                response.text(),
            ));
        }

        let parsed: RefundResponse = response.json()?;
        Ok(RefundResult {
            message_id: parsed.message_id.clone(),
            raw: parsed,
        })
    }

    /// Polls Y-Note for the state of a previously enqueued refund.
    pub async fn fetch_refund_status(&self, message_id: &str) -> Result<RefundStatusResult> {
        let mut violations = Vec::new();
        check_required(&mut violations, "message_id", message_id);
        if !violations.is_empty() {
            return Err(Error::validation(violations));
        }

        let token = self.access_token().await?;

        let endpoint = format!(
            "{}/{}/refund/status/{}",
            self.api_host(),
            self.api_env(),
            message_id
        );
        self.config
            .logger
            .debug("refund.fetch_refund_status", &json!({ "endpoint": endpoint }));

        let response = self
            .transport
            .get(&endpoint, &self.bearer_headers(&token, false))
            .await?;

        if !response.is_success() {
            error!(status = response.status, "refund status request rejected");
            return Err(Error::backend(
                "refund status request",
                endpoint,
                response.status,
                response.text(),
            ));
        }

        let parsed: RefundStatusResponse = response.json()?;
        let status = TransactionStatus::from_provider_raw(
            parsed.result.data.status.as_deref().unwrap_or(""),
        );
        Ok(RefundStatusResult {
            status,
            refund_step: parsed.refund_step.clone(),
            raw: parsed,
        })
    }

    fn bearer_headers(&self, token: &AccessToken, with_json_body: bool) -> Vec<(String, String)> {
        let mut headers = vec![(
            "Authorization".to_string(),
            format!("Bearer {}", token.access_token),
        )];
        if with_json_body {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> YNoteRefundConfig {
        YNoteRefundConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            customer_key: "customer-key".to_string(),
            customer_secret: "customer-secret".to_string(),
            channel_user_msisdn: "237699123456".to_string(),
            pin: "1234".to_string(),
            ..YNoteRefundConfig::default()
        }
    }

    #[test]
    fn api_env_follows_environment_flag() {
        let dev = YNoteRefund::new(valid_config()).unwrap();
        assert_eq!(dev.api_env(), "dev");

        let prod = YNoteRefund::new(YNoteRefundConfig {
            is_prod: true,
            ..valid_config()
        })
        .unwrap();
        assert_eq!(prod.api_env(), "prod");
    }

    #[test]
    fn fixed_hosts_are_used_without_overrides() {
        let client = YNoteRefund::new(valid_config()).unwrap();
        assert_eq!(client.api_host(), "https://omapi.ynote.africa");
        assert_eq!(client.token_host(), "https://omapi-token.ynote.africa/oauth2");
    }

    #[test]
    fn construction_rejects_bad_merchant_number() {
        let err = YNoteRefund::new(YNoteRefundConfig {
            channel_user_msisdn: "238699123456".to_string(),
            ..valid_config()
        })
        .unwrap_err();

        let violations = err.violations().expect("validation error");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "channel_user_msisdn");
    }

    #[test]
    fn params_check_collects_all_violations() {
        let params = RefundParams {
            notification_url: "nope".to_string(),
            amount: 0,
            reference_id: String::new(),
            customer_name: "Jane Doe".to_string(),
            customer_phone: "12345".to_string(),
        };
        let violations = params.check(ZeroAmountPolicy::Reject);
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            ["notification_url", "amount", "reference_id", "customer_phone"]
        );
    }

    #[test]
    fn customer_phone_accepts_country_prefix() {
        let params = RefundParams {
            notification_url: "https://merchant.example/webhook".to_string(),
            amount: 500,
            reference_id: "ref-9".to_string(),
            customer_name: "Jane Doe".to_string(),
            customer_phone: "237655123456".to_string(),
        };
        assert!(params.check(ZeroAmountPolicy::Reject).is_empty());
    }
}
