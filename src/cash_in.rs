//! Merchant-initiated collection (cash-in) client for the Orange Money
//! API.
//!
//! A cash-in runs in two provider steps: obtain a per-transaction pay
//! token, then initiate the payment against it. The subscriber confirms on
//! their handset, so the initiation response is normally `Pending` and the
//! caller polls [`CashIn::fetch_cash_in_status`] with the pay token until
//! the status settles.

use std::env;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::auth::{fetch_access_token, AccessToken};
use crate::error::{Error, Result, Violation};
use crate::logger::{DebugLogger, TracingLogger};
use crate::status::TransactionStatus;
use crate::transport::{HttpTransport, Transport};
use crate::validation::{
    check_amount, check_notification_url, check_om_number, check_required, env_flag, require_env,
    ZeroAmountPolicy,
};

const API_BASE_PROD: &str = "https://api-s1.orange.cm";
const API_BASE_SANDBOX: &str = "https://mockapi.taurs.dev/karibu-cap/orange_money_apis";

/// Configuration for [`CashIn`].
///
/// All string fields are required; construction fails with a
/// [`Error::Validation`] listing every empty one.
#[derive(Clone)]
pub struct CashInConfig {
    pub customer_key: String,
    pub customer_secret: String,
    /// Static per-merchant token sent as the `X-AUTH-TOKEN` header.
    pub x_auth_token: String,
    /// Merchant (channel user) MSISDN credited by cash-ins.
    pub merchant_number: String,
    pub pin: String,
    /// Selects the production API base; defaults to the sandbox.
    pub is_prod: bool,
    pub zero_amount: ZeroAmountPolicy,
    /// Overrides the environment-selected API base. Intended for tests and
    /// self-hosted mocks.
    pub base_url: Option<String>,
    pub logger: Arc<dyn DebugLogger>,
}

impl Default for CashInConfig {
    fn default() -> Self {
        Self {
            customer_key: String::new(),
            customer_secret: String::new(),
            x_auth_token: String::new(),
            merchant_number: String::new(),
            pin: String::new(),
            is_prod: false,
            zero_amount: ZeroAmountPolicy::default(),
            base_url: None,
            logger: Arc::new(TracingLogger),
        }
    }
}

impl fmt::Debug for CashInConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CashInConfig")
            .field("customer_key", &self.customer_key)
            .field("customer_secret", &"<redacted>")
            .field("x_auth_token", &"<redacted>")
            .field("merchant_number", &self.merchant_number)
            .field("pin", &"<redacted>")
            .field("is_prod", &self.is_prod)
            .field("zero_amount", &self.zero_amount)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CashInConfig {
    /// Reads the config from process environment variables:
    /// `OM_CUSTOMER_KEY`, `OM_CUSTOMER_SECRET`, `OM_X_AUTH_TOKEN`,
    /// `OM_MERCHANT_NUMBER`, `OM_PIN`, and optionally `OM_IS_PROD`
    /// (`"true"`/`"1"`) and `OM_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let mut violations = Vec::new();
        let config = Self {
            customer_key: require_env(&mut violations, "OM_CUSTOMER_KEY"),
            customer_secret: require_env(&mut violations, "OM_CUSTOMER_SECRET"),
            x_auth_token: require_env(&mut violations, "OM_X_AUTH_TOKEN"),
            merchant_number: require_env(&mut violations, "OM_MERCHANT_NUMBER"),
            pin: require_env(&mut violations, "OM_PIN"),
            is_prod: env_flag("OM_IS_PROD"),
            base_url: env::var("OM_BASE_URL").ok(),
            ..Self::default()
        };
        if !violations.is_empty() {
            return Err(Error::validation(violations));
        }
        Ok(config)
    }

    fn check(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        check_required(&mut violations, "customer_key", &self.customer_key);
        check_required(&mut violations, "customer_secret", &self.customer_secret);
        check_required(&mut violations, "x_auth_token", &self.x_auth_token);
        check_required(&mut violations, "merchant_number", &self.merchant_number);
        check_required(&mut violations, "pin", &self.pin);
        violations
    }
}

/// Parameters of a single cash-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashInParams {
    /// Webhook the provider notifies once the transaction settles.
    pub notification_url: String,
    /// Amount in XAF.
    pub amount: u32,
    /// Merchant-side order identifier, echoed back in notifications.
    pub reference_id: String,
    /// Description shown to the subscriber.
    pub comment: String,
    /// Subscriber MSISDN debited by the cash-in.
    pub buyer_phone: String,
}

impl CashInParams {
    fn check(&self, policy: ZeroAmountPolicy) -> Vec<Violation> {
        let mut violations = Vec::new();
        check_notification_url(&mut violations, "notification_url", &self.notification_url);
        check_amount(&mut violations, "amount", self.amount, policy);
        check_required(&mut violations, "reference_id", &self.reference_id);
        check_required(&mut violations, "comment", &self.comment);
        check_om_number(&mut violations, "buyer_phone", &self.buyer_phone);
        violations
    }
}

/// Raw body of the pay-token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PayTokenResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub data: PayTokenData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayTokenData {
    #[serde(rename = "payToken")]
    pub pay_token: String,
}

/// Raw body of the payment and payment-status endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct CashInResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub data: CashInData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashInData {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub pay_token: Option<String>,
    #[serde(default)]
    pub txnid: Option<String>,
    #[serde(default)]
    pub txnmode: Option<String>,
    #[serde(default)]
    pub subscriber_msisdn: Option<String>,
}

/// Outcome of a cash-in initiation or status poll.
#[derive(Debug, Clone)]
pub struct CashInResult {
    pub status: TransactionStatus,
    /// Pay token bound to this attempt. The client does not persist it;
    /// keep it to poll the status later.
    pub pay_token: String,
    pub raw: CashInResponse,
}

/// Client for the Orange Money cash-in API.
///
/// Holds only immutable config, so one instance can be shared freely
/// across concurrent callers. Every operation fetches a fresh access
/// token.
pub struct CashIn {
    config: CashInConfig,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for CashIn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CashIn").finish_non_exhaustive()
    }
}

impl CashIn {
    /// Builds a client over the default HTTP transport.
    pub fn new(config: CashInConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(HttpTransport::default()))
    }

    /// Builds a client over a caller-supplied transport.
    pub fn with_transport(config: CashInConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let violations = config.check();
        if !violations.is_empty() {
            return Err(Error::validation(violations));
        }
        Ok(Self { config, transport })
    }

    /// Base URL of the API for this client's environment. Pure lookup, no
    /// I/O.
    pub fn api_base(&self) -> &str {
        if let Some(base) = &self.config.base_url {
            return base;
        }
        if self.config.is_prod {
            API_BASE_PROD
        } else {
            API_BASE_SANDBOX
        }
    }

    async fn access_token(&self) -> Result<AccessToken> {
        fetch_access_token(
            self.transport.as_ref(),
            &self.config.customer_key,
            &self.config.customer_secret,
            self.api_base(),
        )
        .await
    }

    fn auth_headers(&self, token: &AccessToken) -> Vec<(String, String)> {
        vec![
            ("X-AUTH-TOKEN".to_string(), self.config.x_auth_token.clone()),
            (
                "Authorization".to_string(),
                format!("Bearer {}", token.access_token),
            ),
        ]
    }

    /// Obtains the per-transaction pay token that must precede a payment.
    ///
    /// Scoped to a single cash-in attempt; a new one is needed for every
    /// attempt.
    pub async fn request_pay_token(&self) -> Result<String> {
        let token = self.access_token().await?;

        let endpoint = format!("{}/omcoreapis/1.0.2/mp/init", self.api_base());
        self.config
            .logger
            .debug("cash_in.request_pay_token", &json!({ "endpoint": endpoint }));

        let response = self
            .transport
            .post(&endpoint, Vec::new(), &self.auth_headers(&token))
            .await?;

        if !response.is_success() {
            error!(status = response.status, "pay token request rejected");
            return Err(Error::backend(
                "pay token request",
                endpoint,
                response.status,
                response.text(),
            ));
        }

        let parsed: PayTokenResponse = response.json()?;
        Ok(parsed.data.pay_token)
    }

    /// Initiates a cash-in: validates `params`, acquires a pay token and a
    /// fresh access token, then posts the payment.
    ///
    /// On validation failure every violated field is reported and no
    /// network call is made.
    pub async fn request_cash_in(&self, params: CashInParams) -> Result<CashInResult> {
        let violations = params.check(self.config.zero_amount);
        if !violations.is_empty() {
            return Err(Error::validation(violations));
        }

        let pay_token = self.request_pay_token().await?;
        let token = self.access_token().await?;

        let endpoint = format!("{}/omcoreapis/1.0.2/mp/pay", self.api_base());
        let body = json!({
            "subscriberMsisdn": params.buyer_phone,
            "notifUrl": params.notification_url,
            "orderId": params.reference_id,
            "description": params.comment,
            "amount": params.amount.to_string(),
            "channelUserMsisdn": self.config.merchant_number,
            "payToken": pay_token,
            "pin": self.config.pin,
        });

        let mut headers = self.auth_headers(&token);
        headers.push(("Content-Type".to_string(), "application/json".to_string()));

        info!(
            order_id = %params.reference_id,
            amount = params.amount,
            "initiating cash-in"
        );
        self.config.logger.debug(
            "cash_in.request_cash_in",
            &json!({ "endpoint": endpoint, "orderId": params.reference_id }),
        );

        let response = self
            .transport
            .post(&endpoint, body.to_string().into_bytes(), &headers)
            .await?;

        if !response.is_success() {
            error!(status = response.status, "cash-in request rejected");
            return Err(Error::backend(
                "cash-in request",
                endpoint,
                response.status,
                response.text(),
            ));
        }

        let parsed: CashInResponse = response.json()?;
        Ok(CashInResult {
            status: raw_status(&parsed),
            pay_token,
            raw: parsed,
        })
    }

    /// Polls the provider for the state of a previously initiated
    /// cash-in.
    ///
    /// The provider exposes this as POST with an empty body even though it
    /// only retrieves state; kept as-is for compatibility.
    pub async fn fetch_cash_in_status(&self, pay_token: &str) -> Result<CashInResult> {
        let mut violations = Vec::new();
        check_required(&mut violations, "pay_token", pay_token);
        if !violations.is_empty() {
            return Err(Error::validation(violations));
        }

        let token = self.access_token().await?;

        let endpoint = format!(
            "{}/omcoreapis/1.0.2/mp/paymentstatus/{}",
            self.api_base(),
            pay_token
        );
        self.config
            .logger
            .debug("cash_in.fetch_cash_in_status", &json!({ "endpoint": endpoint }));

        let response = self
            .transport
            .post(&endpoint, Vec::new(), &self.auth_headers(&token))
            .await?;

        if !response.is_success() {
            error!(status = response.status, "cash-in status request rejected");
            return Err(Error::backend(
                "cash-in status request",
                endpoint,
                response.status,
                response.text(),
            ));
        }

        let parsed: CashInResponse = response.json()?;
        Ok(CashInResult {
            status: raw_status(&parsed),
            pay_token: pay_token.to_string(),
            raw: parsed,
        })
    }
}

/// Missing status strings map to the `Unknown` sentinel rather than an
/// error: the provider omits the field on some intermediate states.
fn raw_status(response: &CashInResponse) -> TransactionStatus {
    TransactionStatus::from_provider_raw(response.data.status.as_deref().unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> CashInConfig {
        CashInConfig {
            customer_key: "key".to_string(),
            customer_secret: "secret".to_string(),
            x_auth_token: "auth-token".to_string(),
            merchant_number: "695123456".to_string(),
            pin: "1234".to_string(),
            ..CashInConfig::default()
        }
    }

    fn valid_params() -> CashInParams {
        CashInParams {
            notification_url: "https://merchant.example/webhook".to_string(),
            amount: 1500,
            reference_id: "order-153".to_string(),
            comment: "Order #153".to_string(),
            buyer_phone: "699123456".to_string(),
        }
    }

    #[test]
    fn api_base_follows_environment_flag() {
        let sandbox = CashIn::new(valid_config()).unwrap();
        assert_eq!(
            sandbox.api_base(),
            "https://mockapi.taurs.dev/karibu-cap/orange_money_apis"
        );

        let prod = CashIn::new(CashInConfig {
            is_prod: true,
            ..valid_config()
        })
        .unwrap();
        assert_eq!(prod.api_base(), "https://api-s1.orange.cm");
    }

    #[test]
    fn base_url_override_wins_over_environment_flag() {
        let client = CashIn::new(CashInConfig {
            is_prod: true,
            base_url: Some("http://127.0.0.1:9090".to_string()),
            ..valid_config()
        })
        .unwrap();
        assert_eq!(client.api_base(), "http://127.0.0.1:9090");
    }

    #[test]
    fn construction_reports_every_empty_field() {
        let err = CashIn::new(CashInConfig {
            customer_key: String::new(),
            pin: String::new(),
            ..valid_config()
        })
        .unwrap_err();

        let fields: Vec<_> = err
            .violations()
            .expect("validation error")
            .iter()
            .map(|v| v.field.as_str())
            .collect();
        assert_eq!(fields, ["customer_key", "pin"]);
    }

    #[test]
    fn params_check_collects_all_violations() {
        let params = CashInParams {
            notification_url: "not a url".to_string(),
            amount: 0,
            reference_id: String::new(),
            comment: "ok".to_string(),
            buyer_phone: "641234567".to_string(),
        };
        let violations = params.check(ZeroAmountPolicy::Reject);
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            ["notification_url", "amount", "reference_id", "buyer_phone"]
        );
    }

    #[test]
    fn valid_params_pass() {
        assert!(valid_params().check(ZeroAmountPolicy::Reject).is_empty());
    }

    #[test]
    fn from_env_reports_missing_variables() {
        for name in [
            "OM_CUSTOMER_KEY",
            "OM_CUSTOMER_SECRET",
            "OM_X_AUTH_TOKEN",
            "OM_MERCHANT_NUMBER",
            "OM_PIN",
        ] {
            env::remove_var(name);
        }

        let err = CashInConfig::from_env().unwrap_err();
        assert_eq!(err.violations().expect("validation error").len(), 5);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", valid_config());
        assert!(!rendered.contains("\"secret\""));
        assert!(!rendered.contains("1234"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("695123456"));
    }
}
