//! Error types for payment-sheet orchestration.
//!
//! [`ServiceError`] is the closed set of failures every payment operation can
//! surface. Its `Display` output is suitable for showing to an end user.

/// Errors surfaced by the payment service and its remote procedure client.
///
/// The set is closed: transport failures, server rejections and malformed
/// bodies are all folded into one of these kinds before reaching the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// No user is signed in, or the signed-in user could not produce a token.
    #[error("You must be signed in to submit a payment.")]
    NotAuthenticated,

    /// The payment service base URL is absent or not a valid base URL.
    #[error("Stripe payment service base URL is not configured.")]
    MissingBaseUrl,

    /// The response body matched neither the success nor the error envelope,
    /// or carried data the caller cannot use.
    #[error("Unexpected response from payment service.")]
    InvalidResponse,

    /// The server rejected the call. The message is shown to the user verbatim.
    #[error("{0}")]
    Callable(String),

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("Unable to reach the payment service. Check your connection and try again.")]
    NetworkFailure,
}

impl ServiceError {
    /// Returns the server-supplied message for [`ServiceError::Callable`].
    #[must_use]
    pub fn callable_message(&self) -> Option<&str> {
        match self {
            Self::Callable(message) => Some(message),
            _ => None,
        }
    }
}

/// Failure reported by an authentication provider while minting a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("authentication provider error: {message}")]
pub struct AuthError {
    /// Human-readable description from the provider.
    pub message: String,
}

impl AuthError {
    /// Creates a new authentication error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(_: AuthError) -> Self {
        Self::NotAuthenticated
    }
}
