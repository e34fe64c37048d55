//! Wire format for callable procedures.
//!
//! Every procedure is a JSON `POST` carrying `{"data": payload}`. The server
//! answers with one of two envelopes, independent of the HTTP status:
//!
//! - success: `{"result": {...}}`
//! - error: `{"error": {"status": "...", "message": "..."}}`
//!
//! [`decode_callable`] maps a status code and raw body onto a typed result or a
//! [`ServiceError`]. It holds the whole decision table so transports only need
//! to hand over bytes.
//!
//! # Key Types
//!
//! - [`Procedure`] - The fixed set of server procedures
//! - [`CallableRequest`] - The `{"data": ...}` request wrapper
//! - [`CallableEnvelope`] / [`CallableErrorEnvelope`] - Response wrappers
//! - [`Customer`], [`EphemeralKey`], [`StripeConfig`], [`PaymentMethod`],
//!   [`PaymentIntent`] - Decoded results

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ServiceError;

pub mod keys;
mod procedure;
mod types;

pub use keys::normalize_keys;
pub use procedure::Procedure;
pub use types::*;

/// Request wrapper: the payload travels under `data`.
#[derive(Debug, Serialize)]
pub struct CallableRequest<'a, P: ?Sized> {
    /// Procedure-specific payload.
    pub data: &'a P,
}

impl<'a, P: ?Sized> CallableRequest<'a, P> {
    /// Wraps a payload.
    pub const fn new(data: &'a P) -> Self {
        Self { data }
    }
}

/// Successful response wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallableEnvelope<T> {
    /// Procedure-specific result.
    pub result: T,
}

/// Server-reported rejection carried inside [`CallableErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallableErrorBody {
    /// Machine-readable status, e.g. `failed-precondition`.
    pub status: String,
    /// Human-readable message, shown to the user verbatim.
    pub message: String,
}

/// Error response wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallableErrorEnvelope {
    /// The rejection.
    pub error: CallableErrorBody,
}

impl CallableErrorEnvelope {
    /// Extracts an error envelope from an already parsed body, if it has one.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }
}

/// Returns `true` for `2xx` status codes.
#[must_use]
pub const fn is_success_status(status: u16) -> bool {
    status >= 200 && status < 300
}

/// Decodes a callable response body.
///
/// The error envelope is checked first on every status, so a `2xx` response
/// that carries `{"error": ...}` is a [`ServiceError::Callable`] even if it
/// also carries a `result`. On `2xx` without an error envelope the body must
/// be a success envelope; anything else is [`ServiceError::InvalidResponse`].
///
/// # Errors
///
/// - [`ServiceError::Callable`] when an error envelope is present
/// - [`ServiceError::InvalidResponse`] when the body is not JSON, the status is
///   not `2xx` without an error envelope, or `result` does not decode as `T`
pub fn decode_callable<T>(status: u16, body: &[u8]) -> Result<T, ServiceError>
where
    T: DeserializeOwned,
{
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        #[cfg(feature = "telemetry")]
        tracing::debug!(status, bytes = body.len(), "callable response is not JSON");
        return Err(ServiceError::InvalidResponse);
    };
    let value = normalize_keys(value);

    if let Some(envelope) = CallableErrorEnvelope::from_value(&value) {
        #[cfg(feature = "telemetry")]
        tracing::debug!(
            status,
            error.status = %envelope.error.status,
            error.message = %envelope.error.message,
            "callable error envelope"
        );
        return Err(ServiceError::Callable(envelope.error.message));
    }

    if !is_success_status(status) {
        #[cfg(feature = "telemetry")]
        tracing::debug!(status, "non-success status without error envelope");
        return Err(ServiceError::InvalidResponse);
    }

    serde_json::from_value::<CallableEnvelope<T>>(value)
        .map(|envelope| envelope.result)
        .map_err(|_e| {
            #[cfg(feature = "telemetry")]
            tracing::debug!(status, error = %_e, "callable result did not decode");
            ServiceError::InvalidResponse
        })
}
