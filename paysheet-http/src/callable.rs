//! Remote procedure client for callable endpoints.
//!
//! [`CallableClient`] issues one authenticated `POST {base_url}/{procedure}`
//! per call with body `{"data": payload}` and maps the outcome onto the closed
//! [`ServiceError`] taxonomy:
//!
//! - transport failures (DNS, connect, TLS, timeout, body read) become
//!   [`ServiceError::NetworkFailure`]; the transport detail is only traced
//! - every response body goes through [`paysheet::proto::decode_callable`]
//!
//! There are no retries and no timeout beyond the transport's own.

use paysheet::proto::{CallableRequest, Procedure, decode_callable};
use paysheet::{AuthToken, ServiceError};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// Client for callable procedures.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Debug, Default)]
pub struct CallableClient {
    /// Shared Reqwest HTTP client
    client: Client,
}

impl CallableClient {
    /// Creates a client with a default reqwest client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client on top of a pre-configured reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Appends the procedure name as a path segment of `base_url`.
    ///
    /// A trailing slash on the base URL is ignored, so both
    /// `https://host/api` and `https://host/api/` give `https://host/api/get-config`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingBaseUrl`] if `base_url` cannot carry path segments.
    pub fn procedure_url(base_url: &Url, procedure: Procedure) -> Result<Url, ServiceError> {
        let mut url = base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ServiceError::MissingBaseUrl)?
            .pop_if_empty()
            .push(procedure.name());
        Ok(url)
    }

    /// Invokes `procedure` with `payload` and decodes its result.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NetworkFailure`] if no response was received
    /// - [`ServiceError::Callable`] if the body carries an error envelope, whatever the status
    /// - [`ServiceError::InvalidResponse`] if the body is neither envelope, or
    ///   the status is not `2xx` and there is no error envelope
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paysheet.callable.invoke", skip_all, fields(procedure = %procedure), err)
    )]
    pub async fn invoke<P, R>(
        &self,
        base_url: &Url,
        procedure: Procedure,
        payload: &P,
        token: &AuthToken,
    ) -> Result<R, ServiceError>
    where
        P: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = Self::procedure_url(base_url, procedure)?;
        let body = CallableRequest::new(payload);

        #[cfg(feature = "telemetry")]
        tracing::trace!(
            url = %url,
            payload = %preview(&serde_json::to_vec(&body).unwrap_or_default()),
            "→ callable request"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await
            .map_err(network_failure)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(network_failure)?;

        #[cfg(feature = "telemetry")]
        tracing::trace!(
            status = status.as_u16(),
            bytes = bytes.len(),
            body = %preview(&bytes),
            "← callable response"
        );

        decode_callable(status.as_u16(), &bytes)
    }
}

#[allow(clippy::needless_pass_by_value)]
fn network_failure(_err: reqwest::Error) -> ServiceError {
    #[cfg(feature = "telemetry")]
    tracing::debug!(error = %_err, "callable transport failure");
    ServiceError::NetworkFailure
}

/// Preview of a body for trace logs.
///
/// JSON bodies have every secret-bearing field replaced before printing.
/// The result is cut at [`BODY_PREVIEW_LIMIT`](crate::constants::BODY_PREVIEW_LIMIT) bytes.
#[cfg(feature = "telemetry")]
fn preview(bytes: &[u8]) -> String {
    use crate::constants::BODY_PREVIEW_LIMIT;

    let text = match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(mut value) => {
            redact_secrets(&mut value);
            value.to_string()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    };
    if text.len() <= BODY_PREVIEW_LIMIT {
        return text;
    }
    let mut end = BODY_PREVIEW_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}… ({} bytes)", &text[..end], bytes.len())
}

/// Replaces secret-bearing values at any depth, whatever the key casing.
#[cfg(feature = "telemetry")]
fn redact_secrets(value: &mut serde_json::Value) {
    use crate::constants::REDACTED_KEYS;
    use paysheet::proto::keys::snake_to_camel;
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if REDACTED_KEYS.contains(&snake_to_camel(key).as_ref()) {
                    *field = Value::String("<redacted>".to_owned());
                } else {
                    redact_secrets(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_secrets),
        _ => {}
    }
}
