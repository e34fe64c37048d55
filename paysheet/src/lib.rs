#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for payment-sheet orchestration.
//!
//! This crate holds everything that does not depend on an HTTP transport:
//! the error taxonomy, the callable-procedure wire format, the collaborator
//! seams for authentication and payment-sheet presentation, and the bundle a
//! payment sheet consumes. The `paysheet-http` crate drives these types over
//! `reqwest`.
//!
//! # Overview
//!
//! A payment sheet needs four credentials to render: a publishable key, a
//! customer id, a freshly minted ephemeral key secret and a payment intent
//! client secret. They are obtained from a small set of server-side callable
//! procedures, each invoked with the signed-in user's bearer token.
//!
//! # Modules
//!
//! - [`auth`] - Authentication provider seam and bearer tokens
//! - [`error`] - The closed [`ServiceError`] taxonomy
//! - [`proto`] - Procedures, request/response types and envelope decoding
//! - [`sheet`] - Payment-sheet context, init data, outcome and presenter seam
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod auth;
pub mod error;
pub mod proto;
pub mod sheet;

pub use auth::{AuthProvider, AuthToken, SignedInUser, StaticAuthProvider};
pub use error::{AuthError, ServiceError};
