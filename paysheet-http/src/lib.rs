#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport and orchestration for paysheet callable procedures.
//!
//! # Modules
//!
//! - [`constants`] - Environment variable names and body preview limits
//! - [`config`] - [`ServiceConfig`] with base URL validation
//! - [`callable`] - [`CallableClient`], one authenticated `POST` per procedure
//! - [`service`] - [`PaymentService`], the payment context builder
//! - [`checkout`] - [`CheckoutRequest`] for preparing a presentable sheet
//! - [`session`] - [`CheckoutSession`], session-scoped customer and saved methods
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing of calls, including truncated request and
//!   response previews at `trace` level

pub mod callable;
pub mod checkout;
pub mod config;
pub mod constants;
pub mod service;
pub mod session;

pub use callable::CallableClient;
pub use checkout::CheckoutRequest;
pub use config::ServiceConfig;
pub use service::PaymentService;
pub use session::{CheckoutSession, SessionError};
