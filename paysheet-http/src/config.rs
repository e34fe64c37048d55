//! Configuration for [`PaymentService`](crate::PaymentService).
//!
//! The base URL is kept as given and validated on every call, so a missing or
//! malformed value surfaces as [`ServiceError::MissingBaseUrl`] from the
//! operation that needed it rather than at construction.
//!
//! # Environment Variables
//!
//! - `PAYSHEET_BASE_URL` - Base URL of the callable procedures
//! - `PAYSHEET_STRIPE_API_VERSION` - Overrides the pinned Stripe API version

use paysheet::ServiceError;
use paysheet::proto::DEFAULT_STRIPE_API_VERSION;
use url::Url;

use crate::constants::{API_VERSION_ENV, BASE_URL_ENV};

/// Configuration for [`PaymentService`](crate::PaymentService).
#[derive(Clone)]
pub struct ServiceConfig {
    /// Base URL the procedure name is appended to, e.g.
    /// `https://us-central1-example.cloudfunctions.net`.
    pub base_url: Option<String>,

    /// Stripe API version ephemeral keys are minted for.
    pub api_version: String,

    /// Optional pre-configured reqwest client. If `None`, a default client is
    /// created; no timeout is layered on top of the transport default.
    pub http_client: Option<reqwest::Client>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_version: DEFAULT_STRIPE_API_VERSION.to_owned(),
            http_client: None,
        }
    }
}

impl ServiceConfig {
    /// Creates a config with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Reads `PAYSHEET_BASE_URL` and `PAYSHEET_STRIPE_API_VERSION`.
    ///
    /// Unset variables leave the defaults in place.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from a variable lookup, as [`Self::from_env`] does.
    ///
    /// A blank API version keeps the pinned default.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            base_url: lookup(BASE_URL_ENV),
            ..Self::default()
        };
        if let Some(version) = lookup(API_VERSION_ENV)
            && !version.trim().is_empty()
        {
            config.api_version = version;
        }
        config
    }

    /// Sets the Stripe API version.
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Sets a pre-configured reqwest client.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Parses the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingBaseUrl`] if the URL is unset, blank,
    /// unparsable, or cannot carry path segments (e.g. `mailto:`).
    pub fn resolve_base_url(&self) -> Result<Url, ServiceError> {
        let raw = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ServiceError::MissingBaseUrl)?;
        let url = Url::parse(raw).map_err(|_| ServiceError::MissingBaseUrl)?;
        if url.cannot_be_a_base() {
            return Err(ServiceError::MissingBaseUrl);
        }
        Ok(url)
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("has_http_client", &self.http_client.is_some())
            .finish()
    }
}
