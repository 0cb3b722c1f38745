//! Client library for the Orange Money Cameroon API and the Y-Note
//! refund API.
//!
//! Two clients are exposed:
//!
//! - [`CashIn`] drives merchant-initiated collections: pay-token
//!   acquisition, payment initiation and status polling.
//! - [`YNoteRefund`] drives merchant-to-customer reversals through the
//!   Y-Note partner API.
//!
//! Every operation validates its inputs before touching the network,
//! fetches a fresh access token (nothing is cached) and performs its
//! requests strictly in sequence. There are no retries: transient
//! failures surface as [`Error`] values so callers can apply their own
//! retry policy.
//!
//! # Example
//!
//! ```no_run
//! use orange_money_apis::{CashIn, CashInConfig, CashInParams};
//!
//! # #[tokio::main]
//! # async fn main() -> orange_money_apis::Result<()> {
//! let client = CashIn::new(CashInConfig {
//!     customer_key: "key".into(),
//!     customer_secret: "secret".into(),
//!     x_auth_token: "auth-token".into(),
//!     merchant_number: "695123456".into(),
//!     pin: "0000".into(),
//!     ..Default::default()
//! })?;
//!
//! let result = client
//!     .request_cash_in(CashInParams {
//!         notification_url: "https://merchant.example/webhook".into(),
//!         amount: 1500,
//!         reference_id: "order-153".into(),
//!         comment: "Order #153".into(),
//!         buyer_phone: "699123456".into(),
//!     })
//!     .await?;
//!
//! println!("{:?}, pay token {}", result.status, result.pay_token);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cash_in;
pub mod error;
pub mod logger;
pub mod refund;
pub mod status;
pub mod transport;
pub mod validation;

pub use auth::{basic_credentials, fetch_access_token, AccessToken};
pub use cash_in::{CashIn, CashInConfig, CashInParams, CashInResult};
pub use error::{Error, Result, Violation};
pub use logger::{DebugLogger, NoopLogger, TracingLogger};
pub use refund::{RefundParams, RefundResult, RefundStatusResult, YNoteRefund, YNoteRefundConfig};
pub use status::TransactionStatus;
pub use transport::{HttpTransport, HttpTransportConfig, RawResponse, Transport};
pub use validation::{is_om_number, is_ynote_merchant_number, ZeroAmountPolicy};
